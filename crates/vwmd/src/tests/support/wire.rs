//! A minimal client speaking the wire format over a Unix stream.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use vwm_protocol::schema::display;
use vwm_protocol::{HEADER_SIZE, MessageHeader};

const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// One event read back from the server.
#[derive(Debug, Clone)]
pub struct ReceivedEvent {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl ReceivedEvent {
    /// Payload word at `index`.
    pub fn word(&self, index: usize) -> Option<u32> {
        let start = index * 4;
        let bytes: [u8; 4] = self.payload.get(start..start + 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// String argument whose length prefix is the word at `index`.
    pub fn string(&self, index: usize) -> Option<String> {
        let len = usize::try_from(self.word(index)?).ok()?;
        let start = (index + 1) * 4;
        let bytes = self.payload.get(start..start + len.checked_sub(1)?)?;
        String::from_utf8(bytes.to_vec()).ok()
    }
}

pub struct WireClient {
    stream: UnixStream,
}

impl WireClient {
    pub fn new(stream: UnixStream) -> io::Result<Self> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        Ok(Self { stream })
    }

    pub fn connect(path: &Path) -> io::Result<Self> {
        Self::new(UnixStream::connect(path)?)
    }

    /// Sends a request whose arguments are all 32-bit words.
    pub fn send(&mut self, object: u32, opcode: u16, words: &[u32]) -> io::Result<()> {
        let size = u16::try_from(HEADER_SIZE + words.len() * 4)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "request too large"))?;
        let mut out = Vec::with_capacity(usize::from(size));
        MessageHeader {
            object,
            opcode,
            size,
        }
        .write_into(&mut out);
        for word in words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        self.stream.write_all(&out)
    }

    /// Reads one event, or `None` once the server has hung up.
    pub fn read_event(&mut self) -> io::Result<Option<ReceivedEvent>> {
        let mut raw = [0_u8; HEADER_SIZE];
        match self.stream.read_exact(&mut raw) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(error),
        }
        let header = MessageHeader::parse(&raw)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "short header"))?;
        let length = usize::from(header.size)
            .checked_sub(HEADER_SIZE)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "undersized event"))?;
        let mut payload = vec![0_u8; length];
        self.stream.read_exact(&mut payload)?;
        Ok(Some(ReceivedEvent { header, payload }))
    }

    /// Sends `wl_display.sync` and collects every event up to and including
    /// the `delete_id` that retires the callback after it fires.
    pub fn roundtrip(&mut self, callback_id: u32) -> io::Result<Vec<ReceivedEvent>> {
        self.send(1, display::request::SYNC, &[callback_id])?;
        let mut events = Vec::new();
        while let Some(event) = self.read_event()? {
            let retired = event.header.object == 1
                && event.header.opcode == display::event::DELETE_ID
                && event.word(0) == Some(callback_id);
            events.push(event);
            if retired {
                return Ok(events);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "server hung up before the callback fired",
        ))
    }

    /// Reads until the server hangs up, returning what arrived first.
    pub fn drain(&mut self) -> io::Result<Vec<ReceivedEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.read_event()? {
            events.push(event);
        }
        Ok(events)
    }
}
