//! Behavioural tests for the display socket listener.

use std::cell::RefCell;
use std::fs;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, Instant};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use vwm_config::DisplaySocket;

use crate::transport::{CountingHandler, DisplayListener, ListenerHandle};

struct ListenerWorld {
    _dir: TempDir,
    path: PathBuf,
    listener: Option<ListenerHandle>,
    accepted: Arc<AtomicUsize>,
    bind_error: Option<String>,
    occupant: Option<UnixListener>,
}

impl ListenerWorld {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("wayland-7");
        Self {
            _dir: dir,
            path,
            listener: None,
            accepted: Arc::new(AtomicUsize::new(0)),
            bind_error: None,
            occupant: None,
        }
    }

    fn socket(&self) -> DisplaySocket {
        DisplaySocket::new(self.path.to_str().expect("utf-8 socket path"))
    }

    fn start_listener(&mut self) {
        let (count, handler) = CountingHandler::new();
        self.accepted = count;
        let started =
            DisplayListener::bind(&self.socket()).and_then(|listener| listener.start(handler));
        match started {
            Ok(handle) => self.listener = Some(handle),
            Err(error) => self.bind_error = Some(error.to_string()),
        }
    }

    fn stop_listener(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            handle.join().expect("join listener");
        }
    }

    fn wait_for_connections(&self, expected: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if self.accepted.load(Ordering::SeqCst) >= expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl Drop for ListenerWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
        self.occupant = None;
    }
}

#[fixture]
fn world() -> RefCell<ListenerWorld> {
    RefCell::new(ListenerWorld::new())
}

#[given("a display socket listener is running")]
fn given_listener(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().start_listener();
    assert!(
        world.borrow().bind_error.is_none(),
        "listener start failed: {:?}",
        world.borrow().bind_error
    );
}

#[given("another server is listening on the display socket")]
fn given_socket_in_use(world: &RefCell<ListenerWorld>) {
    let path = world.borrow().path.clone();
    world.borrow_mut().occupant = Some(UnixListener::bind(path).expect("bind occupant"));
}

#[given("a stale socket file is left on the display path")]
fn given_stale_socket(world: &RefCell<ListenerWorld>) {
    let path = world.borrow().path.clone();
    drop(UnixListener::bind(&path).expect("bind stale socket"));
    assert!(path.exists(), "stale socket should remain on disk");
}

#[given("a regular file occupies the display path")]
fn given_regular_file(world: &RefCell<ListenerWorld>) {
    fs::write(&world.borrow().path, b"not a socket").expect("write file");
}

#[when("a client connects")]
fn when_client_connects(world: &RefCell<ListenerWorld>) {
    UnixStream::connect(&world.borrow().path).expect("connect client");
}

#[when("two clients connect")]
fn when_two_clients_connect(world: &RefCell<ListenerWorld>) {
    let path = world.borrow().path.clone();
    for _ in 0..2 {
        UnixStream::connect(&path).expect("connect client");
    }
}

#[when("the listener starts on the same socket")]
fn when_listener_starts(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().start_listener();
}

#[when("the listener stops")]
fn when_listener_stops(world: &RefCell<ListenerWorld>) {
    world.borrow_mut().stop_listener();
}

#[then("the listener records {count} connections")]
fn then_listener_records_plural(world: &RefCell<ListenerWorld>, count: usize) {
    assert_listener_records(world, count);
}

#[then("the listener records {count} connection")]
fn then_listener_records_singular(world: &RefCell<ListenerWorld>, count: usize) {
    assert_listener_records(world, count);
}

fn assert_listener_records(world: &RefCell<ListenerWorld>, count: usize) {
    assert!(
        world.borrow().wait_for_connections(count),
        "expected {count} connections, got {}",
        world.borrow().accepted.load(Ordering::SeqCst)
    );
}

#[then("starting the listener fails")]
fn then_listener_fails(world: &RefCell<ListenerWorld>) {
    assert!(
        world.borrow().bind_error.is_some(),
        "expected listener start to fail"
    );
}

#[then("the socket file is removed")]
fn then_socket_removed(world: &RefCell<ListenerWorld>) {
    let path = world.borrow().path.clone();
    assert!(!path.exists(), "{} should be gone", path.display());
}

#[scenario(path = "tests/features/display_socket.feature")]
fn display_socket_listener(#[from(world)] world: RefCell<ListenerWorld>) {
    drop(world);
}
