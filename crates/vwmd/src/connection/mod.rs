//! Per-client connection driver.
//!
//! A [`Connection`] owns everything one client can touch: the socket, the
//! receive buffer and framer, the descriptor queue, the object table and the
//! outgoing queue. It is driven by a single thread that polls the client
//! socket and the connection's mailbox; nothing about a connection is
//! reachable through global state.

pub mod buffer;
pub mod dispatch;
pub mod errors;
mod events;
pub mod fds;
pub mod framing;
pub mod mailbox;
pub mod objects;

use std::fmt;
use std::io;
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Instant;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use tracing::{debug, info, warn};
use vwm_protocol::ObjectId;

use self::buffer::ReceiveBuffer;
use self::dispatch::{DispatchTable, dispatch};
use self::errors::ProtocolError;
use self::fds::{FdQueue, FlushOutcome, OutgoingQueue, RecvOutcome, recv_with_fds};
use self::framing::Framer;
use self::mailbox::{Mailbox, Notice, mailbox};
use self::objects::{ObjectState, ObjectTable};
use crate::globals::OutputInfo;
use crate::input::{InputBackend, Seat};
use crate::render::{Rect, RenderQueue};

pub(crate) const CONNECTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::connection");

/// Server-assigned identity of a connection, used in logs and for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "client-{}", self.0)
    }
}

/// Shared services every connection talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub render: RenderQueue,
    pub seat: Seat,
    pub input: Arc<dyn InputBackend>,
    pub output: OutputInfo,
    pub dispatch: Arc<DispatchTable>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Collaborators")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Protocol state of one client, handed to every request handler.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    pub(crate) objects: ObjectTable,
    pub(crate) fds: FdQueue,
    pub(crate) outgoing: OutgoingQueue,
    serial: u32,
    started: Instant,
    /// Surface the client's keyboards last entered.
    pub(crate) keyboard_focus: Option<ObjectId>,
    pub(crate) collaborators: Collaborators,
}

impl Client {
    #[must_use]
    pub fn new(id: ClientId, collaborators: Collaborators) -> Self {
        Self {
            id,
            objects: ObjectTable::new(),
            fds: FdQueue::new(),
            outgoing: OutgoingQueue::new(),
            serial: 0,
            started: Instant::now(),
            keyboard_focus: None,
            collaborators,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    #[must_use]
    pub const fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    #[must_use]
    pub const fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Next event serial; never zero.
    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1).max(1);
        self.serial
    }

    /// Milliseconds since the connection was accepted, wrapping.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        let millis = self.started.elapsed().as_millis();
        u32::try_from(millis % (u128::from(u32::MAX) + 1)).unwrap_or(0)
    }

    /// Output areas currently covered by this client's surfaces.
    #[must_use]
    pub fn surface_extents(&self) -> Vec<Rect> {
        self.objects
            .iter()
            .filter_map(|(_, object)| match &object.state {
                ObjectState::Surface(surface) => surface.extent,
                _ => None,
            })
            .collect()
    }

    /// Releases everything the client owned and reports its screen area as
    /// damaged.
    pub fn teardown(&mut self) {
        let damage = self.surface_extents();
        self.collaborators.render.damage(damage);
        self.collaborators.seat.unregister(self.id);
        self.objects.clear();
        self.fds.clear();
        self.outgoing.clear();
    }
}

/// A client connection and the thread-local machinery driving it.
#[derive(Debug)]
pub struct Connection {
    stream: UnixStream,
    buffer: ReceiveBuffer,
    framer: Framer,
    mailbox: Mailbox,
    client: Client,
}

impl Connection {
    /// Wraps an accepted stream and registers it with the seat.
    pub fn new(
        stream: UnixStream,
        id: ClientId,
        collaborators: Collaborators,
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        let (sender, receiver) = mailbox()?;
        collaborators.seat.register(id, sender);
        Ok(Self {
            stream,
            buffer: ReceiveBuffer::new(),
            framer: Framer::new(),
            mailbox: receiver,
            client: Client::new(id, collaborators),
        })
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Reads everything available and dispatches each complete message.
    ///
    /// Returns [`ProtocolError::Closed`] once the peer hangs up; requests
    /// that arrived before the hang-up are dispatched first.
    pub fn on_readable(&mut self) -> Result<usize, ProtocolError> {
        let mut dispatched = 0;
        loop {
            self.framer.prepare_read(&mut self.buffer);
            let spare = self.buffer.spare_mut();
            match recv_with_fds(&self.stream, spare, &mut self.client.fds)? {
                RecvOutcome::Data(count) => {
                    self.buffer.commit(count);
                    let client = &mut self.client;
                    dispatched += self
                        .framer
                        .drain(&mut self.buffer, |frame| dispatch(client, frame))?;
                }
                RecvOutcome::WouldBlock => return Ok(dispatched),
                RecvOutcome::Closed => return Err(ProtocolError::Closed),
            }
        }
    }

    /// Applies notices posted by other threads.
    pub fn handle_notices(&mut self) -> Result<(), ProtocolError> {
        for notice in self.mailbox.drain() {
            match notice {
                Notice::BufferReleased(handle) => self.client.buffer_released(handle)?,
                Notice::Key { time, key, pressed } => self.client.deliver_key(time, key, pressed)?,
                Notice::Focus(gained) => self.client.focus_changed(gained)?,
                Notice::Shutdown => return Err(ProtocolError::Shutdown),
            }
        }
        Ok(())
    }

    /// Writes queued events.
    pub fn flush(&mut self) -> Result<FlushOutcome, ProtocolError> {
        self.client.outgoing.flush(&self.stream)
    }

    /// Waits for socket or mailbox activity once and handles it.
    pub fn poll_once(&mut self, timeout: PollTimeout) -> Result<(), ProtocolError> {
        let mut interest = PollFlags::POLLIN;
        if !self.client.outgoing.is_empty() {
            interest |= PollFlags::POLLOUT;
        }
        let (socket_ready, wake_ready) = {
            let mut fds = [
                PollFd::new(self.stream.as_fd(), interest),
                PollFd::new(self.mailbox.wake_fd(), PollFlags::POLLIN),
            ];
            match poll(&mut fds, timeout) {
                Ok(_) | Err(Errno::EINTR) => {}
                Err(errno) => return Err(ProtocolError::Socket(errno)),
            }
            let [socket_fd, wake_fd] = &fds;
            (
                socket_fd.revents().unwrap_or_else(PollFlags::empty),
                wake_fd.revents().unwrap_or_else(PollFlags::empty),
            )
        };

        if wake_ready.contains(PollFlags::POLLIN) {
            self.handle_notices()?;
        }
        if socket_ready.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
            self.on_readable()?;
        }
        self.flush()?;
        Ok(())
    }

    /// Drives the connection until it fails or is asked to stop, then tears
    /// it down. Returns the reason the connection ended.
    pub fn serve(mut self) -> ProtocolError {
        let error = loop {
            if let Err(error) = self.poll_once(PollTimeout::NONE) {
                break error;
            }
        };
        self.close(&error);
        error
    }

    /// Reports `error` to the peer when appropriate, then tears down.
    pub fn close(&mut self, error: &ProtocolError) {
        let client = self.client.id();
        match error {
            ProtocolError::Closed | ProtocolError::Shutdown => {
                debug!(target: CONNECTION_TARGET, %client, reason = error.teardown_reason(), "connection closing");
            }
            _ => {
                warn!(
                    target: CONNECTION_TARGET,
                    %client,
                    reason = error.teardown_reason(),
                    %error,
                    "protocol error; closing connection"
                );
            }
        }
        if let Some((object, code, message)) = error.display_error() {
            let reported = self
                .client
                .display_error(object, code, &message)
                .and_then(|()| self.flush());
            if let Err(flush_error) = reported {
                debug!(target: CONNECTION_TARGET, %client, error = %flush_error, "could not report protocol error");
            }
        }
        self.client.teardown();
        info!(target: CONNECTION_TARGET, %client, "connection torn down");
    }
}
