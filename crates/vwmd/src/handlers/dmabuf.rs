//! `zwp_linux_dmabuf_v1` and its buffer parameter objects.
//!
//! Only single-format linear buffers are importable, and only through
//! `create_immed`. The asynchronous `create` path always reports failure.

use tracing::debug;
use vwm_protocol::schema::{linux_buffer_params as params, linux_dmabuf};
use vwm_protocol::{Interface, ObjectId};

use super::{HANDLER_TARGET, params_state, version_of};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{
    BufferSource, BufferState, DmabufAttributes, DmabufParams, DmabufPlane, Object, ObjectState,
};

/// DRM fourcc codes, which differ from the `wl_shm` enum for these two.
const DRM_FORMAT_ARGB8888: u32 = 0x3432_5241;
const DRM_FORMAT_XRGB8888: u32 = 0x3432_5258;
const FORMATS: [u32; 2] = [DRM_FORMAT_ARGB8888, DRM_FORMAT_XRGB8888];

const MODIFIER_LINEAR: u64 = 0;
const MAX_PLANES: u32 = 4;

/// Version that replaced `format` events with `modifier` events.
const MODIFIER_SINCE: u32 = 3;

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::LinuxDmabuf, linux_dmabuf::request::CREATE_PARAMS, create_params);
    table.register(Interface::LinuxBufferParams, params::request::ADD, add);
    table.register(Interface::LinuxBufferParams, params::request::CREATE, create);
    table.register(Interface::LinuxBufferParams, params::request::CREATE_IMMED, create_immed);
}

pub(super) fn announce(client: &mut Client, dmabuf: ObjectId, version: u32) -> Result<(), ProtocolError> {
    for format in FORMATS {
        if version >= MODIFIER_SINCE {
            client.dmabuf_modifier(dmabuf, format, MODIFIER_LINEAR)?;
        } else {
            client.dmabuf_format(dmabuf, format)?;
        }
    }
    Ok(())
}

fn create_params(client: &mut Client, dmabuf: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, dmabuf)?;
    client.objects.add(
        id,
        Object::new(
            Interface::LinuxBufferParams,
            version,
            ObjectState::DmabufParams(DmabufParams::default()),
        ),
    )?;
    Ok(())
}

fn already_used(id: ObjectId) -> ProtocolError {
    ProtocolError::invalid(id, params::error::ALREADY_USED, "params were already used to create a buffer")
}

fn add(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let fd = args.take_fd(0)?;
    let index = args.uint(1)?;
    let offset = args.uint(2)?;
    let stride = args.uint(3)?;
    let modifier = (u64::from(args.uint(4)?) << 32) | u64::from(args.uint(5)?);

    let state = params_state(client, id)?;
    if state.used {
        return Err(already_used(id));
    }
    if index >= MAX_PLANES {
        return Err(ProtocolError::invalid(
            id,
            params::error::PLANE_IDX,
            format!("plane index {index} exceeds {MAX_PLANES} planes"),
        ));
    }
    if state.planes.iter().any(|plane| plane.index == index) {
        return Err(ProtocolError::invalid(
            id,
            params::error::PLANE_SET,
            format!("plane {index} was already set"),
        ));
    }
    state.planes.push(DmabufPlane {
        fd,
        index,
        offset,
        stride,
        modifier,
    });
    Ok(())
}

/// Server-side allocation is not available, so the request fails politely.
fn create(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    let state = params_state(client, id)?;
    if state.used {
        return Err(already_used(id));
    }
    state.used = true;
    state.planes.clear();
    debug!(target: HANDLER_TARGET, client = %client.id(), params = %id, "refusing asynchronous dmabuf import");
    client.params_failed(id)
}

fn create_immed(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let buffer = args.new_id(0)?;
    let width = args.int(1)?;
    let height = args.int(2)?;
    let format = args.uint(3)?;

    let state = params_state(client, id)?;
    if state.used {
        return Err(already_used(id));
    }
    state.used = true;
    let mut planes = std::mem::take(&mut state.planes);
    planes.sort_by_key(|plane| plane.index);

    let contiguous = planes
        .iter()
        .zip(0..)
        .all(|(plane, expected)| plane.index == expected);
    if planes.is_empty() || !contiguous {
        return Err(ProtocolError::invalid(
            id,
            params::error::INCOMPLETE,
            "planes must be set contiguously from index 0",
        ));
    }
    if !FORMATS.contains(&format) {
        return Err(ProtocolError::invalid(
            id,
            params::error::INVALID_FORMAT,
            format!("unsupported format 0x{format:08x}"),
        ));
    }
    if width <= 0 || height <= 0 {
        return Err(ProtocolError::invalid(
            id,
            params::error::INVALID_DIMENSIONS,
            format!("invalid buffer size {width}x{height}"),
        ));
    }

    let version = version_of(client, id)?;
    client.objects.add(
        buffer,
        Object::new(
            Interface::Buffer,
            version,
            ObjectState::Buffer(BufferState {
                source: BufferSource::Dmabuf(DmabufAttributes {
                    width,
                    height,
                    format,
                    planes,
                }),
                busy: false,
            }),
        ),
    )?;
    debug!(target: HANDLER_TARGET, client = %client.id(), %buffer, width, height, "imported dmabuf");
    Ok(())
}
