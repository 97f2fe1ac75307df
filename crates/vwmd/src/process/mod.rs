//! Process supervision: the display lock, shutdown signals and the launch
//! sequence tying bootstrap, listener and render thread together.

mod errors;
mod guard;
pub(crate) mod launch;
pub(crate) mod shutdown;

use std::time::Duration;

pub use errors::LaunchError;
pub use launch::run_daemon;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
