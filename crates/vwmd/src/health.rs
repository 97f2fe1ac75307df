//! Structured health reporting for server lifecycle events.

use std::sync::Arc;

use vwm_config::Config;

use crate::bootstrap::BootstrapError;
use crate::connection::ClientId;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for lifecycle events, shared by the bootstrap path and every
/// connection thread.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    fn bootstrap_succeeded(&self, config: &Config);

    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once an accepted client has its connection state.
    fn client_connected(&self, client: ClientId);

    /// Invoked after a client has been torn down. `reason` is a short label
    /// such as `closed` or `framing_violation`.
    fn client_disconnected(&self, client: ClientId, reason: &str);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn client_connected(&self, client: ClientId) {
        (**self).client_connected(client);
    }

    fn client_disconnected(&self, client: ClientId, reason: &str) {
        (**self).client_disconnected(client, reason);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting display server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.display_socket(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "display server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "display server bootstrap failed"
        );
    }

    fn client_connected(&self, client: ClientId) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_connected",
            %client,
            "client connected"
        );
    }

    fn client_disconnected(&self, client: ClientId, reason: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "client_disconnected",
            %client,
            reason,
            "client disconnected"
        );
    }
}
