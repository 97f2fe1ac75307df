//! Wire-protocol engine shared by the vwm display server.
//!
//! The crate is deliberately free of I/O. It describes every interface the
//! server speaks as static data ([`schema`]), compiles each message's argument
//! list into a [`LayoutPlan`] once ([`registry`]), and walks those plans to
//! decode request payloads and encode events ([`codec`]).
//!
//! ## Wire format
//!
//! Every message starts with an eight byte header: a 32-bit object id, a
//! 16-bit opcode and a 16-bit total size, all little-endian. The payload is a
//! sequence of 32-bit words. Fixed-size arguments occupy one word each and are
//! grouped into value blocks; strings, arrays and generic new-ids describe their
//! own length. File descriptors travel out of band and occupy no payload bytes.
//!
//! ```text
//! | object id (u32) | opcode (u16) | size (u16) | block | variable | block | ...
//! ```

mod codec;
mod errors;
mod id;
mod kind;
mod layout;
mod registry;
pub mod schema;
mod wire;

pub use codec::{ArgValue, EncodedMessage, FdSource, decode_request, encode_event};
pub use errors::WireError;
pub use id::ObjectId;
pub use kind::{ArgKind, ArgSpec, Direction, InterfaceSpec, MessageSpec};
pub use layout::{LayoutPlan, Segment, Slot, SlotPart, ValueBlock, VariableElement, VariableKind};
pub use registry::{CompiledMessage, ProtocolRegistry, registry};
pub use schema::Interface;
pub use wire::{
    Fixed, HEADER_SIZE, MessageHeader, PayloadCursor, marshalled_array_size,
    marshalled_string_size,
};
