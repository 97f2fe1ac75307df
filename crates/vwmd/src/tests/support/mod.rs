//! Shared doubles for the behavioural suites.

mod config_loader;
mod reporter;
mod wire;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use wire::{ReceivedEvent, WireClient};
