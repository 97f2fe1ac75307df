//! Errors that end a client connection.

use nix::errno::Errno;
use thiserror::Error;
use vwm_protocol::schema::display;
use vwm_protocol::{Interface, ObjectId, WireError};

/// Object table violations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ObjectError {
    #[error("object {id} does not exist")]
    UnknownObject { id: u32 },

    #[error("object {id} has been destroyed")]
    DeletedObject { id: u32 },

    #[error("id {id} cannot be allocated; the next free id is {next}")]
    IdNotAllocatable { id: u32, next: u32 },
}

/// Everything that tears a connection down.
///
/// There is no recoverable path at this layer: any disagreement between the
/// declared layout and the received bytes ends the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("framing violation: {0}")]
    FramingViolation(#[source] WireError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("{interface:?}.{request} expects a descriptor for argument {index}, none pending")]
    NoPendingDescriptor {
        interface: Interface,
        request: &'static str,
        index: usize,
    },

    #[error("argument {index} of {interface:?}.{request} is not a {expected}")]
    ArgumentMismatch {
        interface: Interface,
        request: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("invalid request on object {object}: {message}")]
    InvalidRequest {
        object: ObjectId,
        code: u32,
        message: String,
    },

    #[error("cannot encode {interface:?} event {opcode}")]
    EventEncoding {
        interface: Interface,
        opcode: u16,
        #[source]
        source: Option<WireError>,
    },

    #[error("{count} descriptors queued without a request to claim them")]
    TooManyDescriptors { count: usize },

    #[error("socket error: {0}")]
    Socket(#[source] Errno),

    #[error("client closed the connection")]
    Closed,

    #[error("server is shutting down")]
    Shutdown,
}

impl From<WireError> for ProtocolError {
    fn from(error: WireError) -> Self {
        Self::FramingViolation(error)
    }
}

impl ProtocolError {
    /// Builds a handler-level violation reported on `object`.
    pub fn invalid(object: ObjectId, code: u32, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            object,
            code,
            message: message.into(),
        }
    }

    /// Every protocol error ends the connection.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        true
    }

    /// Short label recorded when the connection is torn down.
    #[must_use]
    pub const fn teardown_reason(&self) -> &'static str {
        match self {
            Self::FramingViolation(_) => "framing_violation",
            Self::Object(ObjectError::UnknownObject { .. }) => "unknown_object",
            Self::Object(ObjectError::DeletedObject { .. }) => "deleted_object",
            Self::Object(ObjectError::IdNotAllocatable { .. }) => "id_not_allocatable",
            Self::NoPendingDescriptor { .. } => "no_pending_descriptor",
            Self::ArgumentMismatch { .. } => "argument_mismatch",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::EventEncoding { .. } => "event_encoding",
            Self::TooManyDescriptors { .. } => "too_many_descriptors",
            Self::Socket(_) => "socket_error",
            Self::Closed => "closed",
            Self::Shutdown => "shutdown",
        }
    }

    /// The `wl_display.error` to send before tearing down, if the peer
    /// should be told.
    #[must_use]
    pub fn display_error(&self) -> Option<(ObjectId, u32, String)> {
        match self {
            Self::InvalidRequest {
                object,
                code,
                message,
            } => Some((*object, *code, message.clone())),
            Self::Object(error) => Some((
                ObjectId::DISPLAY,
                display::error::INVALID_OBJECT,
                error.to_string(),
            )),
            Self::FramingViolation(_)
            | Self::NoPendingDescriptor { .. }
            | Self::ArgumentMismatch { .. }
            | Self::TooManyDescriptors { .. } => Some((
                ObjectId::DISPLAY,
                display::error::INVALID_METHOD,
                self.to_string(),
            )),
            Self::EventEncoding { .. } => Some((
                ObjectId::DISPLAY,
                display::error::IMPLEMENTATION,
                self.to_string(),
            )),
            Self::Socket(_) | Self::Closed | Self::Shutdown => None,
        }
    }
}
