//! Behavioural tests covering the server lifecycle: lock, socket, clients
//! and orderly shutdown.

use std::cell::RefCell;
use std::fs;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::connection::ClientId;
use crate::health::HealthReporter;
use crate::process::LaunchError;
use crate::process::launch::{LaunchPlan, run_daemon_with};
use crate::process::shutdown::{ShutdownError, ShutdownReason, ShutdownSignal};
use crate::render::NullRenderConsumer;

use super::support::{HealthEvent, RecordingHealthReporter, TestConfigLoader, WireClient};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

type StepResult = Result<(), String>;

/// Shutdown signal fired from the test thread.
struct ChannelShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdownSignal {
    fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                receiver: Mutex::new(receiver),
            },
        )
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<ShutdownReason, ShutdownError> {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        // A dropped sender also means stop.
        let _ = receiver.recv();
        Ok(ShutdownReason::Requested)
    }
}

struct ProcessWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    trigger: Option<Sender<()>>,
    server: Option<JoinHandle<Result<(), LaunchError>>>,
    outcome: Option<Result<(), LaunchError>>,
    second: Option<Result<(), LaunchError>>,
    client: Option<WireClient>,
}

impl ProcessWorld {
    fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            trigger: None,
            server: None,
            outcome: None,
            second: None,
            client: None,
        }
    }

    fn start(&mut self) -> StepResult {
        let (trigger, shutdown) = ChannelShutdownSignal::new();
        let plan = LaunchPlan {
            loader: self.loader.clone(),
            reporter: Arc::clone(&self.reporter) as Arc<dyn HealthReporter>,
            shutdown,
            consumer: Box::new(NullRenderConsumer),
        };
        let server = thread::Builder::new()
            .name("vwmd-under-test".to_owned())
            .spawn(move || run_daemon_with(plan))
            .map_err(|error| error.to_string())?;
        self.trigger = Some(trigger);
        self.server = Some(server);
        self.wait_until_listening()
    }

    fn wait_until_listening(&self) -> StepResult {
        let socket = self.loader.socket_path();
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if socket.exists() && WireClient::connect(&socket).is_ok() {
                return Ok(());
            }
            if self.server.as_ref().is_some_and(JoinHandle::is_finished) {
                return Err("server exited before listening".to_owned());
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err(format!("{} never accepted connections", socket.display()))
    }

    fn stop(&mut self) -> StepResult {
        self.trigger = None;
        let Some(server) = self.server.take() else {
            return Err("server was not started".to_owned());
        };
        let outcome = server
            .join()
            .map_err(|_| "server thread panicked".to_owned())?;
        self.outcome = Some(outcome);
        Ok(())
    }

    fn run_second(&mut self) {
        let (trigger, shutdown) = ChannelShutdownSignal::new();
        drop(trigger);
        let plan = LaunchPlan {
            loader: self.loader.clone(),
            reporter: Arc::new(RecordingHealthReporter::default()) as Arc<dyn HealthReporter>,
            shutdown,
            consumer: Box::new(NullRenderConsumer),
        };
        self.second = Some(run_daemon_with(plan));
    }

    fn wait_for_event(&self, predicate: impl Fn(&HealthEvent) -> bool) -> bool {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if self.reporter.events().iter().any(&predicate) {
                return true;
            }
            thread::sleep(POLL_INTERVAL);
        }
        false
    }
}

impl Drop for ProcessWorld {
    fn drop(&mut self) {
        self.client = None;
        self.trigger = None;
        if let Some(server) = self.server.take() {
            let _ = server.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<ProcessWorld> {
    RefCell::new(ProcessWorld::new())
}

#[given("a display server is running")]
fn given_server_running(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().start()
}

#[given("a client stays connected")]
fn given_client_connected(world: &RefCell<ProcessWorld>) -> StepResult {
    let socket = world.borrow().loader.socket_path();
    let mut client = WireClient::connect(&socket).map_err(|error| error.to_string())?;
    client.roundtrip(2).map_err(|error| error.to_string())?;
    world.borrow_mut().client = Some(client);
    Ok(())
}

#[when("a client synchronises with the server")]
fn when_client_synchronises(world: &RefCell<ProcessWorld>) -> StepResult {
    let socket = world.borrow().loader.socket_path();
    let mut client = WireClient::connect(&socket).map_err(|error| error.to_string())?;
    let events = client.roundtrip(2).map_err(|error| error.to_string())?;
    if events.is_empty() {
        return Err("no events received".to_owned());
    }
    Ok(())
}

#[when("shutdown is requested")]
fn when_shutdown_requested(world: &RefCell<ProcessWorld>) -> StepResult {
    world.borrow_mut().stop()
}

#[when("a second server starts on the same display")]
fn when_second_server_starts(world: &RefCell<ProcessWorld>) {
    world.borrow_mut().run_second();
}

#[then("the display lock records this process")]
fn then_lock_records_pid(world: &RefCell<ProcessWorld>) -> StepResult {
    let path = world.borrow().loader.lock_path();
    let content = fs::read_to_string(&path).map_err(|error| error.to_string())?;
    let pid: u32 = content.trim().parse().map_err(|_| format!("bad pid {content:?}"))?;
    if pid == std::process::id() {
        Ok(())
    } else {
        Err(format!("lock names pid {pid}"))
    }
}

#[then("the server stops cleanly")]
fn then_server_stops_cleanly(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.outcome, Some(Ok(()))),
        "server outcome: {:?}",
        world.outcome
    );
}

#[then("the socket and lock files are removed")]
fn then_runtime_files_removed(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    assert!(!world.loader.socket_path().exists(), "socket should be removed");
    assert!(!world.loader.lock_path().exists(), "lock should be removed");
}

#[then("the second server refuses to start")]
fn then_second_refused(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.second, Some(Err(LaunchError::AlreadyRunning { .. }))),
        "second server outcome: {:?}",
        world.second
    );
}

#[then("the client is disconnected")]
fn then_client_disconnected(world: &RefCell<ProcessWorld>) -> StepResult {
    let mut client = world
        .borrow_mut()
        .client
        .take()
        .ok_or_else(|| "no client was connected".to_owned())?;
    client.drain().map_err(|error| error.to_string())?;
    Ok(())
}

#[then("the reporter recorded a shutdown disconnect")]
fn then_shutdown_disconnect(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let found = world.wait_for_event(|event| {
        matches!(event, HealthEvent::ClientDisconnected(_, reason) if reason == "shutdown")
    });
    assert!(found, "events: {:?}", world.reporter.events());
}

#[then("the reporter recorded the first client")]
fn then_first_client(world: &RefCell<ProcessWorld>) {
    let world = world.borrow();
    let found = world.wait_for_event(|event| *event == HealthEvent::ClientConnected(ClientId::new(1)));
    assert!(found, "events: {:?}", world.reporter.events());
}

#[scenario(path = "tests/features/server_process.feature")]
fn server_process(#[from(world)] world: RefCell<ProcessWorld>) {
    drop(world);
}
