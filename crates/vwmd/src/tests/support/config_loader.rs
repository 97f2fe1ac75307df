//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use vwm_config::{Config, DisplaySocket};

use crate::bootstrap::ConfigLoader;

/// Loader that places the display socket in a private temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    keymap_path: Option<Utf8PathBuf>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            dir: Arc::new(dir),
            keymap_path: None,
        }
    }

    /// Points the keymap at a file inside the temporary directory.
    pub fn with_keymap_file(&mut self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        self.keymap_path = Some(Utf8PathBuf::try_from(path.clone()).expect("utf-8 keymap path"));
        path
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dir.path().join("wayland-test")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.path().join("wayland-test.lock")
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let socket = self
            .socket_path()
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned();
        Ok(Config {
            display_socket: DisplaySocket::new(socket),
            log_format: vwm_config::LogFormat::Compact,
            keymap_path: self.keymap_path.clone(),
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an invalid socket URL.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("vwmd"),
            OsString::from("--display-socket"),
            OsString::from("tcp://127.0.0.1:9000"),
        ];
        Config::load_from_iter(args)
    }
}
