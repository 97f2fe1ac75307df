//! Layered configuration for the vwm display server.
//!
//! Values are merged by [`ortho_config`] from, in increasing precedence:
//! built-in defaults, a TOML file (`--config-path` or `VWM_CONFIG_PATH`),
//! `VWM_*` environment variables and command-line flags.

mod defaults;
mod logging;
mod runtime;
mod socket;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_DISPLAY_NAME, DEFAULT_LOG_FILTER, DEFAULT_OUTPUT_HEIGHT, DEFAULT_OUTPUT_REFRESH_MHZ,
    DEFAULT_OUTPUT_WIDTH, default_display_socket, default_log_filter, default_log_filter_string,
    default_log_format, default_output_height, default_output_refresh_mhz, default_output_width,
    runtime_base_directory,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use runtime::{RuntimePaths, RuntimePathsError};
pub use socket::{DisplaySocket, SocketParseError, SocketPreparationError};

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "VWM")]
pub struct Config {
    /// Socket clients connect to.
    #[serde(default = "default_display_socket")]
    pub display_socket: DisplaySocket,
    /// `tracing` filter directive, e.g. `info,vwmd::connection=debug`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    #[serde(default = "default_output_width")]
    pub output_width: u32,
    #[serde(default = "default_output_height")]
    pub output_height: u32,
    #[serde(default = "default_output_refresh_mhz")]
    pub output_refresh_mhz: u32,
    /// XKB keymap handed to clients; a built-in US layout is used when unset.
    #[serde(default)]
    pub keymap_path: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_socket: default_display_socket(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            output_width: default_output_width(),
            output_height: default_output_height(),
            output_refresh_mhz: default_output_refresh_mhz(),
            keymap_path: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn display_socket(&self) -> &DisplaySocket {
        &self.display_socket
    }

    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Output mode as `(width, height, refresh_mhz)`.
    #[must_use]
    pub const fn output_mode(&self) -> (u32, u32, u32) {
        (self.output_width, self.output_height, self.output_refresh_mhz)
    }

    #[must_use]
    pub fn keymap_path(&self) -> Option<&camino::Utf8Path> {
        self.keymap_path.as_deref()
    }
}
