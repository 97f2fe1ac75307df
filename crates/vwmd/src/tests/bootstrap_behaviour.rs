//! Behavioural tests for the bootstrap sequence.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::{BootstrapError, ConfigLoader, bootstrap_with};
use crate::health::HealthReporter;

use super::support::{FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestConfigLoader};

type StepResult = Result<(), String>;

struct BootstrapWorld {
    loader: TestConfigLoader,
    failing: bool,
    reporter: Arc<RecordingHealthReporter>,
    outcome: Option<Result<(), BootstrapError>>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            failing: false,
            reporter: Arc::new(RecordingHealthReporter::default()),
            outcome: None,
        }
    }

    fn run(&mut self) {
        let loader: &dyn ConfigLoader = if self.failing {
            &FailingConfigLoader
        } else {
            &self.loader
        };
        let reporter = Arc::clone(&self.reporter) as Arc<dyn HealthReporter>;
        self.outcome = Some(bootstrap_with(loader, reporter).map(drop));
    }

    fn error(&self) -> Option<&BootstrapError> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().failing = false;
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().failing = true;
}

#[given("a keymap file containing only whitespace")]
fn given_blank_keymap(world: &RefCell<BootstrapWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let path = world.loader.with_keymap_file("blank.xkb");
    fs::write(&path, "  \n\t\n").map_err(|error| error.to_string())
}

#[given("a keymap file with a custom layout")]
fn given_custom_keymap(world: &RefCell<BootstrapWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let path = world.loader.with_keymap_file("custom.xkb");
    fs::write(&path, "xkb_keymap { };\n").map_err(|error| error.to_string())
}

#[when("the server bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().run();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.outcome, Some(Ok(()))),
        "bootstrap error: {:?}",
        world.error()
    );
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>) {
    assert!(
        world.borrow().error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the failure names the keymap")]
fn then_failure_names_keymap(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.error(), Some(BootstrapError::Keymap { .. })),
        "expected a keymap failure, got {:?}",
        world.error()
    );
}

#[then("the socket directory exists")]
fn then_socket_directory_exists(world: &RefCell<BootstrapWorld>) {
    let socket = world.borrow().loader.socket_path();
    let parent = socket.parent().expect("socket has a parent");
    assert!(parent.is_dir(), "{} should exist", parent.display());
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<BootstrapWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<BootstrapWorld>) {
    assert_eq!(
        world.borrow().reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
    assert!(
        !events.contains(&HealthEvent::BootstrapSucceeded),
        "failure and success both recorded: {events:?}"
    );
}

#[scenario(path = "tests/features/server_bootstrap.feature")]
fn server_bootstrap(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}
