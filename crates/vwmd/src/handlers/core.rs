//! `wl_display` and `wl_registry`.

use tracing::debug;
use vwm_protocol::schema::{display, registry};
use vwm_protocol::{Interface, ObjectId};

use super::{HANDLER_TARGET, dmabuf, seat, shm};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::Object;
use crate::globals::{GLOBALS, global};

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::Display, display::request::SYNC, sync);
    table.register(Interface::Display, display::request::GET_REGISTRY, get_registry);
    table.register(Interface::Registry, registry::request::BIND, bind);
}

/// Answers with a callback that fires immediately: every earlier request has
/// already been processed.
fn sync(client: &mut Client, _display: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let callback = args.new_id(0)?;
    client.objects.add(callback, Object::plain(Interface::Callback, 1))?;
    let serial = client.next_serial();
    client.callback_done(callback, serial)
}

fn get_registry(client: &mut Client, _display: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    client.objects.add(id, Object::plain(Interface::Registry, 1))?;
    for entry in &GLOBALS {
        client.registry_global(id, entry)?;
    }
    Ok(())
}

fn bind(client: &mut Client, registry_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let name = args.uint(0)?;
    let (interface, version, id) = args.generic_new_id(1)?;
    let Some(entry) = global(name) else {
        return Err(ProtocolError::invalid(
            registry_id,
            display::error::INVALID_OBJECT,
            format!("invalid global {interface} ({name})"),
        ));
    };
    if interface != entry.interface.name() {
        return Err(ProtocolError::invalid(
            registry_id,
            display::error::INVALID_OBJECT,
            format!(
                "invalid interface for global {name}: have {interface}, wanted {}",
                entry.interface.name()
            ),
        ));
    }
    if version == 0 || version > entry.version {
        return Err(ProtocolError::invalid(
            registry_id,
            display::error::INVALID_OBJECT,
            format!(
                "invalid version for global {interface} ({name}): have {version}, wanted 1..={}",
                entry.version
            ),
        ));
    }

    client.objects.add(id, Object::plain(entry.interface, version))?;
    debug!(
        target: HANDLER_TARGET,
        client = %client.id(),
        object = %id,
        interface = %interface,
        version,
        "bound global"
    );
    announce(client, entry.interface, id, version)
}

/// Sends the events a freshly bound global starts with.
fn announce(client: &mut Client, interface: Interface, id: ObjectId, version: u32) -> Result<(), ProtocolError> {
    match interface {
        Interface::Shm => shm::announce(client, id),
        Interface::Seat => seat::announce(client, id, version),
        Interface::Output => {
            let info = client.collaborators.output.clone();
            client.output_description(id, &info, version)
        }
        Interface::LinuxDmabuf => dmabuf::announce(client, id, version),
        _ => Ok(()),
    }
}
