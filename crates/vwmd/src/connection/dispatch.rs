//! Request dispatch keyed by interface and opcode.
//!
//! The table maps `(interface, opcode)` to a plain function pointer. Decoding
//! happens before the handler runs, against the compiled plan from the
//! protocol registry, so handlers only ever see typed arguments.

use std::collections::HashMap;
use std::os::fd::OwnedFd;
use std::sync::Arc;

use tracing::{debug, trace};
use vwm_protocol::{
    ArgValue, CompiledMessage, Fixed, Interface, ObjectId, WireError, decode_request, registry,
};

use super::errors::{ObjectError, ProtocolError};
use super::framing::Frame;
use super::{CONNECTION_TARGET, Client};

/// Handler for one request. Receives the target object's id and the decoded
/// arguments.
pub type RequestHandler = fn(&mut Client, ObjectId, &mut Args) -> Result<(), ProtocolError>;

/// Handlers by `(interface, opcode)`.
#[derive(Debug, Default)]
pub struct DispatchTable {
    handlers: HashMap<(Interface, u16), RequestHandler>,
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any previous one.
    pub fn register(&mut self, interface: Interface, opcode: u16, handler: RequestHandler) {
        self.handlers.insert((interface, opcode), handler);
    }

    #[must_use]
    pub fn handler(&self, interface: Interface, opcode: u16) -> Option<RequestHandler> {
        self.handlers.get(&(interface, opcode)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Decoded arguments of one request, consumed positionally by handlers.
#[derive(Debug)]
pub struct Args {
    message: &'static CompiledMessage,
    values: Vec<Option<ArgValue>>,
}

impl Args {
    #[must_use]
    pub fn new(message: &'static CompiledMessage, values: Vec<ArgValue>) -> Self {
        Self {
            message,
            values: values.into_iter().map(Some).collect(),
        }
    }

    #[must_use]
    pub const fn message(&self) -> &'static CompiledMessage {
        self.message
    }

    pub fn uint(&self, index: usize) -> Result<u32, ProtocolError> {
        match self.peek(index) {
            Some(ArgValue::Uint(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "uint")),
        }
    }

    pub fn int(&self, index: usize) -> Result<i32, ProtocolError> {
        match self.peek(index) {
            Some(ArgValue::Int(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "int")),
        }
    }

    pub fn fixed(&self, index: usize) -> Result<Fixed, ProtocolError> {
        match self.peek(index) {
            Some(ArgValue::Fixed(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "fixed")),
        }
    }

    /// An object reference; `None` only for nullable arguments.
    pub fn object(&self, index: usize) -> Result<Option<ObjectId>, ProtocolError> {
        match self.peek(index) {
            Some(ArgValue::Object(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "object")),
        }
    }

    pub fn new_id(&self, index: usize) -> Result<ObjectId, ProtocolError> {
        match self.peek(index) {
            Some(ArgValue::NewId(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "new_id")),
        }
    }

    /// Takes a generic new-id as `(interface name, version, id)`.
    pub fn generic_new_id(&mut self, index: usize) -> Result<(String, u32, ObjectId), ProtocolError> {
        match self.take(index) {
            Some(ArgValue::GenericNewId {
                interface,
                version,
                id,
            }) => Ok((interface, version, id)),
            _ => Err(self.mismatch(index, "generic new_id")),
        }
    }

    /// Takes a string; `None` only for nullable arguments.
    pub fn string(&mut self, index: usize) -> Result<Option<String>, ProtocolError> {
        match self.take(index) {
            Some(ArgValue::String(value)) => Ok(value),
            _ => Err(self.mismatch(index, "string")),
        }
    }

    pub fn array(&mut self, index: usize) -> Result<Vec<u8>, ProtocolError> {
        match self.take(index) {
            Some(ArgValue::Array(value)) => Ok(value),
            _ => Err(self.mismatch(index, "array")),
        }
    }

    pub fn take_fd(&mut self, index: usize) -> Result<OwnedFd, ProtocolError> {
        match self.take(index) {
            Some(ArgValue::Fd(fd)) => Ok(fd),
            _ => Err(self.mismatch(index, "fd")),
        }
    }

    fn peek(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    fn take(&mut self, index: usize) -> Option<ArgValue> {
        self.values.get_mut(index).and_then(Option::take)
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> ProtocolError {
        ProtocolError::ArgumentMismatch {
            interface: self.message.interface,
            request: self.message.name(),
            index,
            expected,
        }
    }
}

/// Decodes one framed request and runs its handler.
///
/// An opcode the target's interface does not declare is skipped, as is a
/// declared request with no registered handler. Destructor requests retire
/// the target after the handler returns.
pub fn dispatch(client: &mut Client, frame: Frame<'_>) -> Result<(), ProtocolError> {
    let id = ObjectId::new(frame.object).ok_or(ObjectError::UnknownObject { id: 0 })?;
    let interface = client.objects.get(id)?.interface;
    let Some(message) = registry().request(interface, frame.opcode) else {
        debug!(
            target: CONNECTION_TARGET,
            client = %client.id(),
            object = %id,
            ?interface,
            opcode = frame.opcode,
            "skipping undeclared opcode"
        );
        return Ok(());
    };

    let values = decode_request(message, frame.payload, &mut client.fds).map_err(|error| match error {
        WireError::NoPendingDescriptor { index } => ProtocolError::NoPendingDescriptor {
            interface,
            request: message.name(),
            index,
        },
        other => ProtocolError::FramingViolation(other),
    })?;
    invoke(client, id, message, values)
}

/// Runs the handler for an already decoded request, then retires the target
/// if the request is a destructor.
pub fn invoke(
    client: &mut Client,
    id: ObjectId,
    message: &'static CompiledMessage,
    values: Vec<ArgValue>,
) -> Result<(), ProtocolError> {
    let interface = message.interface;
    trace!(
        target: CONNECTION_TARGET,
        client = %client.id(),
        object = %id,
        ?interface,
        request = message.name(),
        "dispatching request"
    );

    let table = Arc::clone(&client.collaborators.dispatch);
    match table.handler(interface, message.opcode) {
        Some(handler) => handler(client, id, &mut Args::new(message, values))?,
        None if message.is_destructor() => {}
        None => debug!(
            target: CONNECTION_TARGET,
            client = %client.id(),
            ?interface,
            request = message.name(),
            "no handler registered; request ignored"
        ),
    }

    if message.is_destructor() && client.objects.get(id).is_ok() {
        client.retire(id)?;
    }
    Ok(())
}
