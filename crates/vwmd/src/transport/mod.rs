//! Display socket listener.
//!
//! The listener binds the configured Unix socket and accepts clients on a
//! background thread, handing each one to a [`ConnectionHandler`] on a thread
//! of its own.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ProtocolConnectionHandler};
pub(crate) use self::listener::{DisplayListener, ListenerHandle};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
