//! Descriptor queue and `SCM_RIGHTS` transport.
//!
//! Received descriptors are queued in arrival order regardless of which
//! message's bytes carried them; `fd` arguments pop them positionally.
//! Outgoing descriptors are staged alongside the bytes of the message that
//! declared them and leave with the first `sendmsg` that carries those bytes.

use std::collections::VecDeque;
use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::sys::socket::{self, ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr};
use vwm_protocol::{EncodedMessage, FdSource};

use super::errors::ProtocolError;

/// Upper bound on descriptors waiting to be claimed by requests.
pub const MAX_QUEUED_FDS: usize = 256;

/// Descriptors sent with a single `sendmsg`.
pub const MAX_FDS_PER_MESSAGE: usize = 28;

/// FIFO of descriptors received from the client.
#[derive(Debug, Default)]
pub struct FdQueue {
    fds: VecDeque<OwnedFd>,
}

impl FdQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received descriptors, failing once the queue bound is passed.
    ///
    /// Descriptors past the bound are closed.
    pub fn extend(&mut self, fds: impl IntoIterator<Item = OwnedFd>) -> Result<(), ProtocolError> {
        self.fds.extend(fds);
        if self.fds.len() > MAX_QUEUED_FDS {
            let count = self.fds.len();
            self.fds.truncate(MAX_QUEUED_FDS);
            return Err(ProtocolError::TooManyDescriptors { count });
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    /// Closes every unclaimed descriptor.
    pub fn clear(&mut self) {
        self.fds.clear();
    }
}

impl FdSource for FdQueue {
    fn pop_fd(&mut self) -> Option<OwnedFd> {
        self.fds.pop_front()
    }
}

/// Result of one receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    Data(usize),
    WouldBlock,
    Closed,
}

/// Reads into `buf`, queueing any descriptors that arrive with the bytes.
pub fn recv_with_fds(
    fd: &impl AsFd,
    buf: &mut [u8],
    queue: &mut FdQueue,
) -> Result<RecvOutcome, ProtocolError> {
    let raw = fd.as_fd().as_raw_fd();
    let mut cmsg_space = nix::cmsg_space!([RawFd; MAX_FDS_PER_MESSAGE]);
    loop {
        let mut iovs = [IoSliceMut::new(buf)];
        let received = socket::recvmsg::<UnixAddr>(
            raw,
            &mut iovs,
            Some(&mut cmsg_space),
            MsgFlags::MSG_CMSG_CLOEXEC | MsgFlags::MSG_DONTWAIT,
        );
        let message = match received {
            Ok(message) => message,
            Err(Errno::EINTR) => continue,
            Err(Errno::EAGAIN) => return Ok(RecvOutcome::WouldBlock),
            Err(Errno::ECONNRESET) => return Ok(RecvOutcome::Closed),
            Err(errno) => return Err(ProtocolError::Socket(errno)),
        };

        let mut received_fds = Vec::new();
        for cmsg in message.cmsgs().map_err(ProtocolError::Socket)? {
            if let ControlMessageOwned::ScmRights(raw_fds) = cmsg {
                for raw_fd in raw_fds {
                    // SAFETY: the kernel just installed this descriptor for us
                    // and nothing else owns it.
                    received_fds.push(unsafe { OwnedFd::from_raw_fd(raw_fd) });
                }
            }
        }
        let bytes = message.bytes;
        queue.extend(received_fds)?;
        if bytes == 0 {
            return Ok(RecvOutcome::Closed);
        }
        return Ok(RecvOutcome::Data(bytes));
    }
}

/// Sends `bytes` with `fds` attached as one `SCM_RIGHTS` control message.
///
/// Returns the number of bytes accepted by the kernel; descriptors are either
/// all delivered with the first byte or not at all.
pub fn send_with_fds(fd: &impl AsFd, bytes: &[u8], fds: &[OwnedFd]) -> Result<usize, Errno> {
    let raw_fds: Vec<RawFd> = fds.iter().map(AsRawFd::as_raw_fd).collect();
    let iovs = [IoSlice::new(bytes)];
    let rights = [ControlMessage::ScmRights(&raw_fds)];
    let cmsgs: &[ControlMessage<'_>] = if raw_fds.is_empty() { &[] } else { &rights };
    loop {
        match socket::sendmsg::<()>(
            fd.as_fd().as_raw_fd(),
            &iovs,
            cmsgs,
            MsgFlags::MSG_NOSIGNAL | MsgFlags::MSG_DONTWAIT,
            None,
        ) {
            Err(Errno::EINTR) => {}
            other => return other,
        }
    }
}

/// Outcome of flushing the outgoing queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Drained,
    /// The socket buffer is full; bytes remain queued.
    Pending,
}

/// Encoded events waiting to be written.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    bytes: Vec<u8>,
    sent: usize,
    fds: VecDeque<OwnedFd>,
}

impl OutgoingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a message and its descriptors behind everything already queued.
    pub fn push(&mut self, message: EncodedMessage) {
        self.bytes.extend_from_slice(&message.bytes);
        self.fds.extend(message.fds);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent == self.bytes.len()
    }

    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.bytes.len() - self.sent
    }

    #[must_use]
    pub fn pending_fds(&self) -> usize {
        self.fds.len()
    }

    /// Writes as much as the socket accepts.
    ///
    /// When more descriptors are staged than fit one control message, only a
    /// single byte accompanies each batch so no message's bytes overtake the
    /// descriptors it declared.
    pub fn flush(&mut self, fd: &impl AsFd) -> Result<FlushOutcome, ProtocolError> {
        while !self.is_empty() {
            let batch = self.fds.len().min(MAX_FDS_PER_MESSAGE);
            let window = if self.fds.len() > MAX_FDS_PER_MESSAGE {
                1
            } else {
                self.pending_bytes()
            };
            let staged: Vec<OwnedFd> = self.fds.drain(..batch).collect();
            let end = self.sent + window;
            let chunk = self.bytes.get(self.sent..end).unwrap_or(&[]);
            match send_with_fds(fd, chunk, &staged) {
                Ok(written) => {
                    self.sent += written;
                }
                Err(Errno::EAGAIN) => {
                    for staged_fd in staged.into_iter().rev() {
                        self.fds.push_front(staged_fd);
                    }
                    return Ok(FlushOutcome::Pending);
                }
                Err(Errno::EPIPE | Errno::ECONNRESET) => return Err(ProtocolError::Closed),
                Err(errno) => return Err(ProtocolError::Socket(errno)),
            }
        }
        self.bytes.clear();
        self.sent = 0;
        Ok(FlushOutcome::Drained)
    }

    /// Drops everything still queued.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.sent = 0;
        self.fds.clear();
    }
}
