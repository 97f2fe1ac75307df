use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::runtime_base_directory;

/// Location of the Unix socket clients connect to.
///
/// Parsed from `unix:///absolute/path`, a bare absolute path, or a display
/// name such as `wayland-1` which resolves inside the runtime directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplaySocket {
    path: Utf8PathBuf,
}

impl DisplaySocket {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// File name clients put in `WAYLAND_DISPLAY`.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Ensures the socket's parent directory exists with mode 0700.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
        else {
            return Err(SocketPreparationError::MissingParent {
                path: self.path.clone(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

impl fmt::Display for DisplaySocket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "unix://{}", self.path)
    }
}

impl FromStr for DisplaySocket {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SocketParseError::Empty);
        }
        if trimmed.starts_with('/') {
            return Ok(Self::new(trimmed));
        }
        if trimmed.contains("://") {
            let url = Url::parse(trimmed)?;
            if url.scheme() != "unix" {
                return Err(SocketParseError::UnsupportedScheme(url.scheme().to_owned()));
            }
            let path = url.path();
            if path.is_empty() || path == "/" {
                return Err(SocketParseError::MissingPath(input.to_owned()));
            }
            return Ok(Self::new(path));
        }
        if trimmed.contains('/') {
            return Err(SocketParseError::RelativePath(input.to_owned()));
        }
        Ok(Self::new(runtime_base_directory().join(trimmed)))
    }
}

impl TryFrom<String> for DisplaySocket {
    type Error = SocketParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplaySocket> for String {
    fn from(socket: DisplaySocket) -> Self {
        socket.to_string()
    }
}

/// Errors encountered while parsing a [`DisplaySocket`].
#[derive(Debug, Error)]
pub enum SocketParseError {
    #[error("display socket must not be empty")]
    Empty,
    #[error("unsupported socket scheme '{0}', only unix:// is accepted")]
    UnsupportedScheme(String),
    #[error("missing Unix socket path in '{0}'")]
    MissingPath(String),
    #[error("relative socket path '{0}' must be absolute or a bare display name")]
    RelativePath(String),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing the socket directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
