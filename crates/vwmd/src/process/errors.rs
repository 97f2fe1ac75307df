//! Defines the unified error surface for server launch and supervision.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use vwm_config::RuntimePathsError;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("server bootstrap failed: {source}")]
    Bootstrap {
        #[source]
        source: BootstrapError,
    },
    #[error(transparent)]
    RuntimePaths(#[from] RuntimePathsError),
    #[error("failed to open lock file '{path}': {source}")]
    LockCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Another server holds the lock for this display name.
    #[error("display is already served (lock: '{path}')")]
    AlreadyRunning { path: PathBuf },
    #[error("display socket listener failed: {source}")]
    Listener {
        #[source]
        source: ListenerError,
    },
    #[error("failed to start render thread: {source}")]
    RenderThread {
        #[source]
        source: io::Error,
    },
    #[error("render thread panicked")]
    RenderPanic,
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
