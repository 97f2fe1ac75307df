//! `wl_shm`, `wl_shm_pool` and shared-memory `wl_buffer`s.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::debug;
use vwm_protocol::schema::{shm, shm_pool};
use vwm_protocol::{Interface, ObjectId};

use super::{HANDLER_TARGET, pool_state, version_of};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{BufferSource, BufferState, Object, ObjectState, ShmPool};
use crate::shm::{ShmMapping, ShmView};

/// Pixel formats accepted for shared-memory buffers.
const FORMATS: [u32; 2] = [shm::format::ARGB8888, shm::format::XRGB8888];

const BYTES_PER_PIXEL: i32 = 4;

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::Shm, shm::request::CREATE_POOL, create_pool);
    table.register(Interface::ShmPool, shm_pool::request::CREATE_BUFFER, create_buffer);
    table.register(Interface::ShmPool, shm_pool::request::RESIZE, resize);
}

pub(super) fn announce(client: &mut Client, shm: ObjectId) -> Result<(), ProtocolError> {
    for format in FORMATS {
        client.shm_format(shm, format)?;
    }
    Ok(())
}

fn pool_len(owner: ObjectId, size: i32) -> Result<NonZeroUsize, ProtocolError> {
    usize::try_from(size)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            ProtocolError::invalid(
                owner,
                shm::error::INVALID_STRIDE,
                format!("invalid pool size {size}"),
            )
        })
}

fn create_pool(client: &mut Client, shm_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let fd = args.take_fd(1)?;
    let len = pool_len(shm_id, args.int(2)?)?;
    let mapping = ShmMapping::map(&fd, len).map_err(|errno| {
        ProtocolError::invalid(shm_id, shm::error::INVALID_FD, format!("failed mmap of fd: {errno}"))
    })?;
    let version = version_of(client, shm_id)?;
    client.objects.add(
        id,
        Object::new(
            Interface::ShmPool,
            version,
            ObjectState::ShmPool(ShmPool {
                fd,
                mapping: Arc::new(mapping),
            }),
        ),
    )?;
    debug!(target: HANDLER_TARGET, client = %client.id(), pool = %id, bytes = len.get(), "created shm pool");
    Ok(())
}

/// Checks that a `stride × height` image at `offset` fits in `pool_len`
/// bytes and that each row holds `width` pixels.
fn validate_layout(
    pool: ObjectId,
    pool_len: usize,
    offset: i32,
    width: i32,
    height: i32,
    stride: i32,
) -> Result<usize, ProtocolError> {
    let invalid = |message: String| ProtocolError::invalid(pool, shm::error::INVALID_STRIDE, message);
    if offset < 0 || width <= 0 || height <= 0 || stride <= 0 {
        return Err(invalid(format!(
            "invalid width, height or stride ({width}x{height}, {stride})"
        )));
    }
    if width.checked_mul(BYTES_PER_PIXEL).is_none_or(|row| stride < row) {
        return Err(invalid(format!("stride {stride} too small for width {width}")));
    }
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let end = usize::try_from(stride)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(stride, height)| stride.checked_mul(height))
        .and_then(|span| span.checked_add(offset));
    match end {
        Some(end) if end <= pool_len => Ok(offset),
        _ => Err(invalid(format!(
            "buffer at offset {offset} with {height} rows of {stride} bytes exceeds pool size {pool_len}"
        ))),
    }
}

fn create_buffer(client: &mut Client, pool_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let offset = args.int(1)?;
    let width = args.int(2)?;
    let height = args.int(3)?;
    let stride = args.int(4)?;
    let format = args.uint(5)?;
    if !FORMATS.contains(&format) {
        return Err(ProtocolError::invalid(
            pool_id,
            shm::error::INVALID_FORMAT,
            format!("invalid format 0x{format:x}"),
        ));
    }

    let mapping = Arc::clone(&pool_state(client, pool_id)?.mapping);
    let offset = validate_layout(pool_id, mapping.len(), offset, width, height, stride)?;
    let version = version_of(client, pool_id)?;
    let view = ShmView {
        mapping,
        offset,
        width,
        height,
        stride,
        format,
    };
    client.objects.add(
        id,
        Object::new(
            Interface::Buffer,
            version,
            ObjectState::Buffer(BufferState {
                source: BufferSource::Shm(view),
                busy: false,
            }),
        ),
    )?;
    Ok(())
}

/// Grows the pool. Buffers created earlier keep the old mapping alive until
/// they are destroyed.
fn resize(client: &mut Client, pool_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let len = pool_len(pool_id, args.int(0)?)?;
    let pool = pool_state(client, pool_id)?;
    let current = pool.mapping.len();
    if len.get() < current {
        return Err(ProtocolError::invalid(
            pool_id,
            shm::error::INVALID_STRIDE,
            format!("shrinking pool from {current} to {len} bytes is invalid"),
        ));
    }
    if len.get() == current {
        return Ok(());
    }
    let mapping = ShmMapping::map(&pool.fd, len).map_err(|errno| {
        ProtocolError::invalid(pool_id, shm::error::INVALID_FD, format!("failed mremap of pool: {errno}"))
    })?;
    pool.mapping = Arc::new(mapping);
    debug!(target: HANDLER_TARGET, client = %client.id(), pool = %pool_id, bytes = len.get(), "resized shm pool");
    Ok(())
}
