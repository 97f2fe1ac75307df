//! Exclusive ownership of a display name.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::{info, warn};

use super::PROCESS_TARGET;
use super::errors::LaunchError;

/// Holds an advisory lock on `<socket>.lock` for as long as it lives.
///
/// The lock is released by the kernel if the process dies, so a leftover
/// lock file never blocks a later server.
#[derive(Debug)]
pub(super) struct DisplayLock {
    path: PathBuf,
    _lock: Flock<File>,
}

impl DisplayLock {
    pub(super) fn acquire(path: &Path) -> Result<Self, LaunchError> {
        let lock_error = |source: io::Error| LaunchError::LockCreate {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .mode(0o600)
            .open(path)
            .map_err(lock_error)?;
        let mut lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, Errno::EWOULDBLOCK)) => {
                info!(
                    target: PROCESS_TARGET,
                    file = %path.display(),
                    "refusing to start: display already locked"
                );
                return Err(LaunchError::AlreadyRunning {
                    path: path.to_path_buf(),
                });
            }
            Err((_, errno)) => return Err(lock_error(io::Error::from(errno))),
        };
        lock.set_len(0).map_err(lock_error)?;
        writeln!(lock, "{}", std::process::id()).map_err(lock_error)?;
        info!(target: PROCESS_TARGET, file = %path.display(), "acquired display lock");
        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }
}

impl Drop for DisplayLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: PROCESS_TARGET,
                file = %self.path.display(),
                error = %error,
                "failed to remove lock file"
            );
        }
    }
}
