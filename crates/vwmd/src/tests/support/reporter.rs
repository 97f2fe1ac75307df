//! [`HealthReporter`] double that records lifecycle events for assertions.

use std::sync::{Mutex, PoisonError};

use vwm_config::Config;

use crate::bootstrap::BootstrapError;
use crate::connection::ClientId;
use crate::health::HealthReporter;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ClientConnected(ClientId),
    ClientDisconnected(ClientId, String),
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn client_connected(&self, client: ClientId) {
        self.record(HealthEvent::ClientConnected(client));
    }

    fn client_disconnected(&self, client: ClientId, reason: &str) {
        self.record(HealthEvent::ClientDisconnected(client, reason.to_owned()));
    }
}
