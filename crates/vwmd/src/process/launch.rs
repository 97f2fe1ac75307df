//! Supervises server launch sequencing and runtime orchestration.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use vwm_config::RuntimePaths;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::connection::Collaborators;
use crate::globals::OutputInfo;
use crate::handlers::dispatch_table;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::input::Seat;
use crate::render::{NullRenderConsumer, RenderConsumer, RenderQueue, spawn_render_thread};
use crate::transport::{DisplayListener, ProtocolConnectionHandler};

use super::errors::LaunchError;
use super::guard::DisplayLock;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to launch the server.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) consumer: Box<dyn RenderConsumer>,
}

/// Runs the server with the production collaborators until a termination
/// signal arrives.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
        consumer: Box::new(NullRenderConsumer),
    })
}

/// Runs the server with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
        consumer,
    } = plan;

    let bootstrapped = bootstrap_with(&loader, reporter)?;
    let config = bootstrapped.config();
    let paths = RuntimePaths::from_config(config)?;
    let _lock = DisplayLock::acquire(paths.lock_path())?;
    let listener = DisplayListener::bind(config.display_socket())?;

    let render = RenderQueue::new();
    let seat = Seat::new();
    let render_thread = spawn_render_thread(render.clone(), consumer, Arc::new(seat.clone()))
        .map_err(|source| LaunchError::RenderThread { source })?;
    let collaborators = Collaborators {
        render: render.clone(),
        seat: seat.clone(),
        input: Arc::new(bootstrapped.keymap().clone()),
        output: OutputInfo::from_config(config),
        dispatch: Arc::new(dispatch_table()),
    };
    let handler = Arc::new(ProtocolConnectionHandler::new(
        collaborators,
        bootstrapped.reporter(),
    ));

    let listener_handle = listener.start(handler)?;
    info!(
        target: PROCESS_TARGET,
        display = config.display_socket().name().unwrap_or_default(),
        "serving display"
    );

    let reason = shutdown.wait();
    info!(target: PROCESS_TARGET, ?reason, "shutting down");
    listener_handle.shutdown();
    let joined = listener_handle.join();
    seat.shutdown_all();
    drain_clients(&seat);
    render.shutdown();
    let rendered = render_thread.join().map_err(|_| LaunchError::RenderPanic);

    reason?;
    joined?;
    rendered?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

/// Gives connection threads a bounded window to tear down.
fn drain_clients(seat: &Seat) {
    let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
    while seat.client_count() > 0 {
        if Instant::now() >= deadline {
            warn!(
                target: PROCESS_TARGET,
                remaining = seat.client_count(),
                "clients still connected at shutdown deadline"
            );
            return;
        }
        thread::sleep(std::time::Duration::from_millis(10));
    }
}
