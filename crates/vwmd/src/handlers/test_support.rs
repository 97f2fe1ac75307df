//! Drives handlers against a real client socket pair.

use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use rstest::fixture;
use vwm_protocol::schema::{display, registry as wl_registry};
use vwm_protocol::{ArgValue, FdSource, HEADER_SIZE, MessageHeader, ObjectId, registry};

use super::dispatch_table;
use crate::connection::dispatch::invoke;
use crate::connection::errors::ProtocolError;
use crate::connection::fds::{FdQueue, RecvOutcome, recv_with_fds};
use crate::connection::mailbox::{Mailbox, mailbox};
use crate::connection::{Client, ClientId, Collaborators};
use crate::globals::OutputInfo;
use crate::input::{Seat, StaticKeymap};
use crate::render::RenderQueue;

pub(crate) fn id(raw: u32) -> ObjectId {
    ObjectId::new(raw).expect("non-zero id")
}

/// An event as the peer received it.
#[derive(Debug)]
pub(crate) struct TestEvent {
    pub object: u32,
    pub opcode: u16,
    pub payload: Vec<u8>,
}

impl TestEvent {
    /// The payload word at `word`.
    pub fn uint(&self, word: usize) -> u32 {
        let start = word * 4;
        let bytes: [u8; 4] = self.payload[start..start + 4].try_into().expect("word");
        u32::from_le_bytes(bytes)
    }

    pub fn int(&self, word: usize) -> i32 {
        self.uint(word).cast_signed()
    }

    /// The string whose length prefix sits at `word`.
    pub fn string(&self, word: usize) -> String {
        let len = self.uint(word) as usize;
        let start = (word + 1) * 4;
        String::from_utf8(self.payload[start..start + len - 1].to_vec()).expect("utf-8")
    }

    /// The array whose length prefix sits at `word`.
    pub fn array(&self, word: usize) -> Vec<u8> {
        let len = self.uint(word) as usize;
        let start = (word + 1) * 4;
        self.payload[start..start + len].to_vec()
    }
}

pub(crate) struct Harness {
    pub client: Client,
    pub render: RenderQueue,
    pub seat: Seat,
    pub mailbox: Mailbox,
    pub peer_fds: FdQueue,
    server: UnixStream,
    peer: UnixStream,
}

#[fixture]
pub(crate) fn harness() -> Harness {
    let (server, peer) = UnixStream::pair().expect("socket pair");
    peer.set_nonblocking(true).expect("nonblocking peer");
    let render = RenderQueue::new();
    let seat = Seat::new();
    let client_id = ClientId::new(1);
    let (sender, mailbox) = mailbox().expect("mailbox");
    seat.register(client_id, sender);
    let collaborators = Collaborators {
        render: render.clone(),
        seat: seat.clone(),
        input: Arc::new(StaticKeymap::default()),
        output: OutputInfo::default(),
        dispatch: Arc::new(dispatch_table()),
    };
    Harness {
        client: Client::new(client_id, collaborators),
        render,
        seat,
        mailbox,
        peer_fds: FdQueue::new(),
        server,
        peer,
    }
}

impl Harness {
    /// Runs a request on `object` as if it had been decoded from the wire.
    pub fn try_request(&mut self, object: u32, opcode: u16, args: Vec<ArgValue>) -> Result<(), ProtocolError> {
        let target = id(object);
        let interface = self.client.objects.get(target)?.interface;
        let message = registry().request(interface, opcode).expect("declared request");
        invoke(&mut self.client, target, message, args)
    }

    pub fn request(&mut self, object: u32, opcode: u16, args: Vec<ArgValue>) {
        self.try_request(object, opcode, args).expect("request succeeds");
    }

    pub fn get_registry(&mut self, registry_id: u32) {
        self.request(
            1,
            display::request::GET_REGISTRY,
            vec![ArgValue::NewId(id(registry_id))],
        );
    }

    pub fn try_bind(
        &mut self,
        registry_id: u32,
        name: u32,
        interface: &str,
        version: u32,
        new_id: u32,
    ) -> Result<(), ProtocolError> {
        self.try_request(
            registry_id,
            wl_registry::request::BIND,
            vec![
                ArgValue::Uint(name),
                ArgValue::GenericNewId {
                    interface: interface.to_owned(),
                    version,
                    id: id(new_id),
                },
            ],
        )
    }

    pub fn bind(&mut self, registry_id: u32, name: u32, interface: &str, version: u32, new_id: u32) {
        self.try_bind(registry_id, name, interface, version, new_id)
            .expect("bind succeeds");
    }

    /// Flushes queued events to the peer and parses everything it received.
    pub fn events(&mut self) -> Vec<TestEvent> {
        self.client.outgoing.flush(&self.server).expect("flush");
        let mut bytes = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            match recv_with_fds(&self.peer, &mut chunk, &mut self.peer_fds).expect("recv") {
                RecvOutcome::Data(count) => bytes.extend_from_slice(&chunk[..count]),
                RecvOutcome::WouldBlock | RecvOutcome::Closed => break,
            }
        }

        let mut events = Vec::new();
        let mut rest = bytes.as_slice();
        while !rest.is_empty() {
            let header = MessageHeader::parse(rest).expect("header");
            let size = usize::from(header.size);
            events.push(TestEvent {
                object: header.object,
                opcode: header.opcode,
                payload: rest[HEADER_SIZE..size].to_vec(),
            });
            rest = &rest[size..];
        }
        events
    }

    /// The next descriptor the peer received.
    pub fn take_peer_fd(&mut self) -> OwnedFd {
        self.peer_fds.pop_fd().expect("descriptor received")
    }

    /// Applies focus notices the seat posted to this client.
    pub fn apply_notices(&mut self) {
        for notice in self.mailbox.drain() {
            if let crate::connection::mailbox::Notice::Focus(gained) = notice {
                self.client.focus_changed(gained).expect("focus change");
            }
        }
    }
}
