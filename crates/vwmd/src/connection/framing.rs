//! Splits the receive stream into complete messages.

use vwm_protocol::{HEADER_SIZE, MessageHeader, WireError};

use super::buffer::ReceiveBuffer;

/// Reassembly progress between reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// No header has been seen for the next message.
    #[default]
    AwaitingHeader,
    /// A header declared this total size but the body is incomplete.
    AwaitingBody(u16),
}

/// One complete message borrowed from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw target id as sent; zero and unknown ids are rejected on dispatch.
    pub object: u32,
    pub opcode: u16,
    pub payload: &'a [u8],
}

/// Stateful message splitter for one connection.
#[derive(Debug, Default)]
pub struct Framer {
    state: FrameState,
}

impl Framer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: FrameState::AwaitingHeader,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Prepares `buffer` for the next read.
    ///
    /// While a body is pending the partial message is moved to the front of
    /// the buffer and room is reserved for all of it, so it completes
    /// contiguously.
    pub fn prepare_read(&self, buffer: &mut ReceiveBuffer) {
        if let FrameState::AwaitingBody(size) = self.state {
            buffer.compact();
            buffer.ensure_contiguous(usize::from(size));
        }
    }

    /// Hands every complete message in `buffer` to `sink`, in order.
    ///
    /// Stops at the first partial message, leaving its bytes unconsumed, and
    /// returns the number of frames delivered. A header declaring fewer than
    /// eight bytes is a framing violation; a sink error stops the drain with
    /// the failing message left unconsumed.
    pub fn drain<F, E>(&mut self, buffer: &mut ReceiveBuffer, mut sink: F) -> Result<usize, E>
    where
        F: FnMut(Frame<'_>) -> Result<(), E>,
        E: From<WireError>,
    {
        let mut delivered = 0;
        loop {
            let pending = buffer.unconsumed();
            let Some(header) = MessageHeader::parse(pending) else {
                self.state = FrameState::AwaitingHeader;
                break;
            };
            let header = header.validate()?;
            let size = usize::from(header.size);
            let Some(payload) = pending.get(HEADER_SIZE..size) else {
                self.state = FrameState::AwaitingBody(header.size);
                break;
            };
            sink(Frame {
                object: header.object,
                opcode: header.opcode,
                payload,
            })?;
            buffer.consume(size);
            delivered += 1;
        }
        Ok(delivered)
    }
}
