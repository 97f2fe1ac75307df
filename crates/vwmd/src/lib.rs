//! The vwm display server.
//!
//! `vwmd` speaks the Wayland wire protocol to clients over a Unix socket.
//! Each accepted client gets a [`connection::Connection`] driven by its own
//! thread: bytes and descriptors are read from the socket, split into
//! messages, decoded against the compiled tables in [`vwm_protocol`] and
//! handed to the request handlers, which answer with encoded events.
//!
//! Connections share three collaborators and nothing else: the render queue,
//! which receives committed buffers and reports when they may be reused; the
//! seat, which routes keyboard focus and key events; and the keymap source.
//! Cross-thread work reaches a connection only through its mailbox.
//!
//! The launch path in [`run_daemon`] loads configuration through
//! [`vwm_config`], installs structured telemetry, takes the display lock,
//! binds the socket and serves until a termination signal arrives.

mod bootstrap;
pub mod connection;
pub mod globals;
pub mod handlers;
mod health;
pub mod input;
mod process;
pub mod render;
pub mod shm;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
