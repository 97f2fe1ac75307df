//! Declarative descriptions of interfaces, messages and their arguments.

use crate::schema::Interface;

/// Type of a single message argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Unsigned 32-bit integer.
    Uint,
    /// Signed 32-bit integer.
    Int,
    /// Signed 24.8 fixed-point number.
    Fixed,
    /// Reference to an existing object.
    Object,
    /// Allocation of an object whose interface is known from the schema.
    NewId(Interface),
    /// Allocation whose interface name and version travel inline.
    GenericNewId,
    /// Length-prefixed, NUL-terminated UTF-8 string.
    String,
    /// Length-prefixed opaque byte blob.
    Array,
    /// File descriptor carried in ancillary data.
    Fd,
}

impl ArgKind {
    /// Whether the argument occupies exactly one word inside a value block.
    #[must_use]
    pub const fn is_fixed_size(self) -> bool {
        matches!(
            self,
            Self::Uint | Self::Int | Self::Fixed | Self::Object | Self::NewId(_)
        )
    }

    /// Whether the argument is a self-describing variable element.
    #[must_use]
    pub const fn is_variable(self) -> bool {
        matches!(self, Self::String | Self::Array | Self::GenericNewId)
    }

    /// Whether the argument travels out of band.
    #[must_use]
    pub const fn is_fd(self) -> bool {
        matches!(self, Self::Fd)
    }
}

/// One declared argument of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    /// Objects and strings may be declared nullable; the wire uses 0 for null.
    pub nullable: bool,
}

impl ArgSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// A request or event: a name plus its ordered argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
    /// Destructor messages retire the object they are addressed to.
    pub destructor: bool,
}

impl MessageSpec {
    #[must_use]
    pub const fn new(name: &'static str, args: &'static [ArgSpec]) -> Self {
        Self {
            name,
            args,
            destructor: false,
        }
    }

    #[must_use]
    pub const fn destructor(name: &'static str, args: &'static [ArgSpec]) -> Self {
        Self {
            name,
            args,
            destructor: true,
        }
    }
}

/// Every request and event of one interface, indexed by opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceSpec {
    pub interface: Interface,
    pub version: u32,
    pub requests: &'static [MessageSpec],
    pub events: &'static [MessageSpec],
}

/// Message class: client to server or server to client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Event,
}
