//! Request handlers.
//!
//! Each submodule registers the handlers for one family of interfaces into
//! the shared [`DispatchTable`]. Handlers receive the client, the id of the
//! object the request targets and its decoded arguments. Requests with no
//! server-side effect beyond destroying their target are not registered; the
//! dispatcher retires destructor targets on its own.

mod compositor;
mod core;
mod dmabuf;
mod seat;
mod shm;
mod xdg;

use vwm_protocol::schema::display;
use vwm_protocol::{Interface, ObjectId};

use crate::connection::Client;
use crate::connection::dispatch::DispatchTable;
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{
    BufferState, DmabufParams, ObjectState, RegionState, ShmPool, SurfaceState, ToplevelState,
    XdgSurfaceState,
};

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// Builds the table of every request the server acts on.
#[must_use]
pub fn dispatch_table() -> DispatchTable {
    let mut table = DispatchTable::new();
    core::register(&mut table);
    compositor::register(&mut table);
    shm::register(&mut table);
    seat::register(&mut table);
    xdg::register(&mut table);
    dmabuf::register(&mut table);
    table
}

/// Version of an existing object, inherited by the objects it creates.
fn version_of(client: &Client, id: ObjectId) -> Result<u32, ProtocolError> {
    Ok(client.objects.get(id)?.version)
}

/// Fails unless `id` names a live object of `interface`.
fn expect_interface(client: &Client, id: ObjectId, interface: Interface) -> Result<(), ProtocolError> {
    if client.objects.get(id)?.interface == interface {
        Ok(())
    } else {
        Err(not_a(id, interface))
    }
}

fn not_a(id: ObjectId, interface: Interface) -> ProtocolError {
    ProtocolError::invalid(
        ObjectId::DISPLAY,
        display::error::INVALID_OBJECT,
        format!("object {id} is not a {}", interface.name()),
    )
}

fn surface_state(client: &mut Client, id: ObjectId) -> Result<&mut SurfaceState, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::Surface(state) => Ok(state),
        _ => Err(not_a(id, Interface::Surface)),
    }
}

fn buffer_state(client: &mut Client, id: ObjectId) -> Result<&mut BufferState, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::Buffer(state) => Ok(state),
        _ => Err(not_a(id, Interface::Buffer)),
    }
}

fn region_state(client: &mut Client, id: ObjectId) -> Result<&mut RegionState, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::Region(state) => Ok(state),
        _ => Err(not_a(id, Interface::Region)),
    }
}

fn pool_state(client: &mut Client, id: ObjectId) -> Result<&mut ShmPool, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::ShmPool(state) => Ok(state),
        _ => Err(not_a(id, Interface::ShmPool)),
    }
}

fn xdg_surface_state(client: &mut Client, id: ObjectId) -> Result<&mut XdgSurfaceState, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::XdgSurface(state) => Ok(state),
        _ => Err(not_a(id, Interface::XdgSurface)),
    }
}

fn toplevel_state(client: &mut Client, id: ObjectId) -> Result<&mut ToplevelState, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::Toplevel(state) => Ok(state),
        _ => Err(not_a(id, Interface::Toplevel)),
    }
}

fn params_state(client: &mut Client, id: ObjectId) -> Result<&mut DmabufParams, ProtocolError> {
    match &mut client.objects.get_mut(id)?.state {
        ObjectState::DmabufParams(state) => Ok(state),
        _ => Err(not_a(id, Interface::LinuxBufferParams)),
    }
}

#[cfg(test)]
pub(crate) mod test_support;
