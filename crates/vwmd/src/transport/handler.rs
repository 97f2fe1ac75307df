//! Connection handling for accepted display clients.

use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use super::LISTENER_TARGET;
use crate::connection::{ClientId, Collaborators, Connection};
use crate::health::HealthReporter;

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one client until it disconnects. Implementations should avoid
    /// panicking.
    fn handle(&self, stream: UnixStream);
}

/// Runs the wire protocol for each accepted client.
pub(crate) struct ProtocolConnectionHandler {
    collaborators: Collaborators,
    reporter: Arc<dyn HealthReporter>,
    next_client: AtomicU64,
}

impl ProtocolConnectionHandler {
    pub(crate) fn new(collaborators: Collaborators, reporter: Arc<dyn HealthReporter>) -> Self {
        Self {
            collaborators,
            reporter,
            next_client: AtomicU64::new(1),
        }
    }
}

impl ConnectionHandler for ProtocolConnectionHandler {
    fn handle(&self, stream: UnixStream) {
        let client = ClientId::new(self.next_client.fetch_add(1, Ordering::Relaxed));
        let connection = match Connection::new(stream, client, self.collaborators.clone()) {
            Ok(connection) => connection,
            Err(error) => {
                warn!(
                    target: LISTENER_TARGET,
                    %client,
                    error = %error,
                    "failed to set up client connection"
                );
                return;
            }
        };
        self.reporter.client_connected(client);
        let reason = connection.serve();
        self.reporter
            .client_disconnected(client, reason.teardown_reason());
    }
}
