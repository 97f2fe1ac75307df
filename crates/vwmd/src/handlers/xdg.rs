//! `xdg_wm_base`, `xdg_surface` and `xdg_toplevel`.
//!
//! Every toplevel is configured once at creation with the compositor's
//! choice of size (zero, meaning the client decides) and the activated
//! state, and takes keyboard focus.

use tracing::debug;
use vwm_protocol::schema::{display, toplevel, wm_base, xdg_surface};
use vwm_protocol::{Interface, ObjectId};

use super::{
    HANDLER_TARGET, expect_interface, not_a, surface_state, toplevel_state, version_of,
    xdg_surface_state,
};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{Object, ObjectState, SurfaceRole, ToplevelState, XdgSurfaceState};
use crate::render::Rect;

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::WmBase, wm_base::request::DESTROY, destroy_wm_base);
    table.register(Interface::WmBase, wm_base::request::CREATE_POSITIONER, create_positioner);
    table.register(Interface::WmBase, wm_base::request::GET_XDG_SURFACE, get_xdg_surface);

    table.register(Interface::XdgSurface, xdg_surface::request::DESTROY, destroy_xdg_surface);
    table.register(Interface::XdgSurface, xdg_surface::request::GET_TOPLEVEL, get_toplevel);
    table.register(Interface::XdgSurface, xdg_surface::request::GET_POPUP, get_popup);
    table.register(
        Interface::XdgSurface,
        xdg_surface::request::SET_WINDOW_GEOMETRY,
        set_window_geometry,
    );
    table.register(Interface::XdgSurface, xdg_surface::request::ACK_CONFIGURE, ack_configure);

    table.register(Interface::Toplevel, toplevel::request::DESTROY, destroy_toplevel);
    table.register(Interface::Toplevel, toplevel::request::SET_TITLE, set_title);
    table.register(Interface::Toplevel, toplevel::request::SET_APP_ID, set_app_id);
}

fn destroy_wm_base(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    if !client.objects.ids_of(Interface::XdgSurface).is_empty() {
        return Err(ProtocolError::invalid(
            id,
            wm_base::error::DEFUNCT_SURFACES,
            "xdg_wm_base destroyed before its surfaces",
        ));
    }
    Ok(())
}

fn create_positioner(client: &mut Client, wm_base_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, wm_base_id)?;
    client.objects.add(id, Object::plain(Interface::Positioner, version))?;
    Ok(())
}

fn get_xdg_surface(client: &mut Client, wm_base_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let surface = args
        .object(1)?
        .ok_or_else(|| not_a(wm_base_id, Interface::Surface))?;
    expect_interface(client, surface, Interface::Surface)?;
    let version = version_of(client, wm_base_id)?;

    let state = surface_state(client, surface)?;
    if state.role.is_some() {
        return Err(ProtocolError::invalid(
            wm_base_id,
            wm_base::error::ROLE,
            format!("wl_surface {surface} already has a role"),
        ));
    }
    state.role = Some(SurfaceRole::Xdg(id));
    client.objects.add(
        id,
        Object::new(
            Interface::XdgSurface,
            version,
            ObjectState::XdgSurface(XdgSurfaceState {
                surface,
                toplevel: None,
                pending_serial: None,
                configured: false,
                geometry: None,
            }),
        ),
    )?;
    Ok(())
}

/// Detaches the role so the surface can be given a new one.
fn destroy_xdg_surface(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    let surface = xdg_surface_state(client, id)?.surface;
    if let Ok(state) = surface_state(client, surface) {
        state.role = None;
    }
    Ok(())
}

fn get_toplevel(client: &mut Client, xdg_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, xdg_id)?;
    let state = xdg_surface_state(client, xdg_id)?;
    if state.toplevel.is_some() {
        return Err(ProtocolError::invalid(
            xdg_id,
            xdg_surface::error::ALREADY_CONSTRUCTED,
            "xdg_surface already has a role object",
        ));
    }
    state.toplevel = Some(id);
    client.objects.add(
        id,
        Object::new(
            Interface::Toplevel,
            version,
            ObjectState::Toplevel(ToplevelState {
                xdg_surface: Some(xdg_id),
                ..ToplevelState::default()
            }),
        ),
    )?;

    client.toplevel_configure(id, 0, 0, &[toplevel::state::ACTIVATED])?;
    let serial = client.next_serial();
    client.xdg_surface_configure(xdg_id, serial)?;
    xdg_surface_state(client, xdg_id)?.pending_serial = Some(serial);
    debug!(target: HANDLER_TARGET, client = %client.id(), toplevel = %id, serial, "configured toplevel");

    client.collaborators.seat.focus(client.id());
    Ok(())
}

fn get_popup(_client: &mut Client, xdg_id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    Err(ProtocolError::invalid(
        xdg_id,
        display::error::IMPLEMENTATION,
        "xdg_popup is not supported",
    ))
}

fn set_window_geometry(client: &mut Client, xdg_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let geometry = Rect::new(args.int(0)?, args.int(1)?, args.int(2)?, args.int(3)?);
    if geometry.is_empty() {
        return Err(ProtocolError::invalid(
            xdg_id,
            display::error::INVALID_METHOD,
            format!("window geometry {}x{} is empty", geometry.width, geometry.height),
        ));
    }
    xdg_surface_state(client, xdg_id)?.geometry = Some(geometry);
    Ok(())
}

fn ack_configure(client: &mut Client, xdg_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let serial = args.uint(0)?;
    let state = xdg_surface_state(client, xdg_id)?;
    if state.pending_serial.is_none_or(|pending| serial > pending) {
        return Err(ProtocolError::invalid(
            xdg_id,
            wm_base::error::INVALID_SURFACE_STATE,
            format!("serial {serial} was never sent in a configure"),
        ));
    }
    state.configured = true;
    Ok(())
}

/// Unlinks the toplevel and, if this client holds focus, moves keyboards to
/// the next newest toplevel.
fn destroy_toplevel(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    if let Some(xdg) = toplevel_state(client, id)?.xdg_surface {
        if let Ok(state) = xdg_surface_state(client, xdg) {
            state.toplevel = None;
        }
    }
    client.retire(id)?;
    if client.collaborators.seat.focused() == Some(client.id()) {
        client.focus_changed(true)?;
    } else {
        client.drop_keyboard_focus()?;
    }
    Ok(())
}

fn set_title(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let title = args.string(0)?;
    toplevel_state(client, id)?.title = title;
    Ok(())
}

fn set_app_id(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let app_id = args.string(0)?;
    toplevel_state(client, id)?.app_id = app_id;
    Ok(())
}
