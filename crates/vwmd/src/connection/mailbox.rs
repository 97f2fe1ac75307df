//! Cross-thread notices for one connection.
//!
//! Other threads never touch connection state. They post a [`Notice`] and
//! write a byte to a wake socket that the connection polls alongside its
//! client socket.

use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::render::BufferHandle;

/// Work handed to a connection from outside its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The render thread finished reading a submitted buffer.
    BufferReleased(BufferHandle),
    Key { time: u32, key: u32, pressed: bool },
    /// Keyboard focus was gained (`true`) or lost.
    Focus(bool),
    Shutdown,
}

/// Posting half, shared with the seat and the render thread.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    notices: Sender<Notice>,
    wake: Arc<UnixStream>,
}

impl MailboxSender {
    /// Queues `notice`; `false` once the connection has gone.
    pub fn post(&self, notice: Notice) -> bool {
        if self.notices.send(notice).is_err() {
            return false;
        }
        match (&*self.wake).write(&[1]) {
            Ok(_) => true,
            // A full wake socket already guarantees a pending wake-up.
            Err(error) => error.kind() == ErrorKind::WouldBlock,
        }
    }
}

/// Receiving half, owned by the connection.
#[derive(Debug)]
pub struct Mailbox {
    notices: Receiver<Notice>,
    wake: UnixStream,
}

impl Mailbox {
    /// Descriptor that becomes readable when notices are pending.
    #[must_use]
    pub fn wake_fd(&self) -> BorrowedFd<'_> {
        self.wake.as_fd()
    }

    /// Takes every pending notice, clearing the wake socket.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut scratch = [0_u8; 64];
        loop {
            match self.wake.read(&mut scratch) {
                Ok(0) => break,
                Ok(_) => {}
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        self.notices.try_iter().collect()
    }
}

/// Creates a connected sender/receiver pair.
pub fn mailbox() -> io::Result<(MailboxSender, Mailbox)> {
    let (writer, reader) = UnixStream::pair()?;
    writer.set_nonblocking(true)?;
    reader.set_nonblocking(true)?;
    let (notices, receiver) = mpsc::channel();
    Ok((
        MailboxSender {
            notices,
            wake: Arc::new(writer),
        },
        Mailbox {
            notices: receiver,
            wake: reader,
        },
    ))
}
