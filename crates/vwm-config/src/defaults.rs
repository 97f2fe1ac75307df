use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::logging::LogFormat;
use crate::socket::DisplaySocket;

/// Socket name used when none is configured, as advertised in `WAYLAND_DISPLAY`.
pub const DEFAULT_DISPLAY_NAME: &str = "wayland-0";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Advertised output mode.
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1920;
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 1080;
/// Refresh rate in millihertz.
pub const DEFAULT_OUTPUT_REFRESH_MHZ: u32 = 60_000;

pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter for serde defaults.
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

pub const fn default_output_width() -> u32 {
    DEFAULT_OUTPUT_WIDTH
}

pub const fn default_output_height() -> u32 {
    DEFAULT_OUTPUT_HEIGHT
}

pub const fn default_output_refresh_mhz() -> u32 {
    DEFAULT_OUTPUT_REFRESH_MHZ
}

/// Socket under the user's runtime directory, or a per-user directory below
/// the system temporary directory when `XDG_RUNTIME_DIR` is unset.
pub fn default_display_socket() -> DisplaySocket {
    DisplaySocket::new(runtime_base_directory().join(DEFAULT_DISPLAY_NAME))
}

/// Directory that relative display names resolve against.
pub fn runtime_base_directory() -> Utf8PathBuf {
    #[cfg(unix)]
    {
        if let Some(dir) = runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
            return dir;
        }
        let mut base = fallback_base_directory();
        base.push("vwm");
        base.push(user_namespace());
        base
    }

    #[cfg(not(unix))]
    {
        let mut base = fallback_base_directory();
        base.push("vwm");
        base
    }
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}
