//! Runtime artefacts that live next to the display socket.
//!
//! Compositors conventionally guard a display name with `<socket>.lock` in the
//! same directory, so a second server for the same name fails fast instead of
//! unlinking a live socket.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// Canonical paths for runtime artefacts written by the daemon.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    socket_path: PathBuf,
    lock_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths from the configured display socket, creating the
    /// directory when missing.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let socket = config.display_socket().path();
        let Some(parent) = socket.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(RuntimePathsError::MissingSocketParent {
                path: socket.to_string(),
            });
        };
        let runtime_dir = parent.as_std_path().to_path_buf();
        fs::create_dir_all(&runtime_dir).map_err(|source| RuntimePathsError::RuntimeDirectory {
            path: runtime_dir.clone(),
            source,
        })?;
        Ok(Self {
            lock_path: PathBuf::from(format!("{socket}.lock")),
            socket_path: socket.as_std_path().to_path_buf(),
            runtime_dir,
        })
    }

    pub fn runtime_dir(&self) -> &Path {
        self.runtime_dir.as_path()
    }

    pub fn socket_path(&self) -> &Path {
        self.socket_path.as_path()
    }

    /// Lock file guarding the display name.
    pub fn lock_path(&self) -> &Path {
        self.lock_path.as_path()
    }
}

/// Errors raised while deriving runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    #[error("socket path '{path}' has no parent directory")]
    MissingSocketParent { path: String },
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
