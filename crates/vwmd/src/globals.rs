//! Globals advertised through `wl_registry`, and the single output.

use vwm_config::Config;
use vwm_protocol::Interface;

/// An advertised global: registry name, interface and highest version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Global {
    pub name: u32,
    pub interface: Interface,
    pub version: u32,
}

impl Global {
    const fn new(name: u32, interface: Interface) -> Self {
        Self {
            name,
            interface,
            version: interface.spec().version,
        }
    }
}

/// Every global, in advertisement order.
pub static GLOBALS: [Global; 6] = [
    Global::new(1, Interface::Compositor),
    Global::new(2, Interface::Shm),
    Global::new(3, Interface::Seat),
    Global::new(4, Interface::Output),
    Global::new(5, Interface::WmBase),
    Global::new(6, Interface::LinuxDmabuf),
];

/// Looks up a global by registry name.
#[must_use]
pub fn global(name: u32) -> Option<&'static Global> {
    GLOBALS.iter().find(|global| global.name == name)
}

/// Mode and identity of the output reported to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub width: i32,
    pub height: i32,
    pub refresh_mhz: i32,
    pub make: String,
    pub model: String,
}

impl Default for OutputInfo {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OutputInfo {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let (width, height, refresh) = config.output_mode();
        Self {
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
            refresh_mhz: i32::try_from(refresh).unwrap_or(i32::MAX),
            make: "vwm".to_owned(),
            model: "virtual".to_owned(),
        }
    }
}
