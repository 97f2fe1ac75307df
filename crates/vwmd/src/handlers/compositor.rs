//! `wl_compositor`, `wl_surface` and `wl_region`.
//!
//! Surface state is double-buffered: attach, damage, frame and offset
//! accumulate until `commit`, which hands shared-memory buffers to the render
//! thread. Frame callbacks for a submitted buffer fire when the render thread
//! releases it, so clients pace themselves to presentation.

use std::mem;

use tracing::{debug, trace};
use vwm_protocol::schema::{compositor, display, region, surface, xdg_surface};
use vwm_protocol::{Interface, ObjectId};

use super::{
    HANDLER_TARGET, buffer_state, expect_interface, region_state, surface_state, version_of,
    xdg_surface_state,
};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{
    BufferSource, Object, ObjectState, RegionOp, RegionState, SurfaceRole, SurfaceState,
};
use crate::render::{BufferHandle, Rect, Submission};

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::Compositor, compositor::request::CREATE_SURFACE, create_surface);
    table.register(Interface::Compositor, compositor::request::CREATE_REGION, create_region);

    table.register(Interface::Surface, surface::request::DESTROY, destroy_surface);
    table.register(Interface::Surface, surface::request::ATTACH, attach);
    table.register(Interface::Surface, surface::request::DAMAGE, damage);
    table.register(Interface::Surface, surface::request::FRAME, frame);
    table.register(Interface::Surface, surface::request::SET_OPAQUE_REGION, set_opaque_region);
    table.register(Interface::Surface, surface::request::SET_INPUT_REGION, set_input_region);
    table.register(Interface::Surface, surface::request::COMMIT, commit);
    table.register(Interface::Surface, surface::request::SET_BUFFER_TRANSFORM, set_buffer_transform);
    table.register(Interface::Surface, surface::request::SET_BUFFER_SCALE, set_buffer_scale);
    table.register(Interface::Surface, surface::request::DAMAGE_BUFFER, damage);
    table.register(Interface::Surface, surface::request::OFFSET, offset);

    table.register(Interface::Region, region::request::ADD, region_add);
    table.register(Interface::Region, region::request::SUBTRACT, region_subtract);
}

fn create_surface(client: &mut Client, compositor: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, compositor)?;
    client.objects.add(
        id,
        Object::new(Interface::Surface, version, ObjectState::Surface(SurfaceState::new())),
    )?;
    Ok(())
}

fn create_region(client: &mut Client, compositor: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, compositor)?;
    client.objects.add(
        id,
        Object::new(Interface::Region, version, ObjectState::Region(RegionState::default())),
    )?;
    Ok(())
}

/// Clears the surface from the output and drops its callbacks and focus.
fn destroy_surface(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    let state = surface_state(client, id)?;
    let extent = state.extent.take();
    let mut callbacks = mem::take(&mut state.pending_frames);
    for (_, frames) in state.awaiting_release.drain(..) {
        callbacks.extend(frames);
    }

    client.collaborators.render.damage(extent);
    for callback in callbacks {
        if client.objects.get(callback).is_ok() {
            client.retire(callback)?;
        }
    }
    if client.keyboard_focus == Some(id) {
        client.drop_keyboard_focus()?;
    }
    Ok(())
}

fn attach(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let buffer = args.object(0)?;
    let x = args.int(1)?;
    let y = args.int(2)?;
    if let Some(buffer) = buffer {
        expect_interface(client, buffer, Interface::Buffer)?;
    }
    let state = surface_state(client, id)?;
    state.pending_buffer = Some(buffer);
    state.pending_offset = (x, y);
    Ok(())
}

/// Handles both `damage` and `damage_buffer`; without scaling or transforms
/// applied the two coordinate spaces coincide.
fn damage(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let rect = Rect::new(args.int(0)?, args.int(1)?, args.int(2)?, args.int(3)?);
    surface_state(client, id)?.pending_damage.push(rect);
    Ok(())
}

fn frame(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let callback = args.new_id(0)?;
    client.objects.add(callback, Object::plain(Interface::Callback, 1))?;
    surface_state(client, id)?.pending_frames.push(callback);
    Ok(())
}

fn region_ops(client: &mut Client, region: Option<ObjectId>) -> Result<Option<Vec<RegionOp>>, ProtocolError> {
    region
        .map(|region| region_state(client, region).map(|state| state.ops.clone()))
        .transpose()
}

fn set_opaque_region(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let ops = region_ops(client, args.object(0)?)?;
    surface_state(client, id)?.opaque_region = ops;
    Ok(())
}

fn set_input_region(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let ops = region_ops(client, args.object(0)?)?;
    surface_state(client, id)?.input_region = ops;
    Ok(())
}

fn set_buffer_transform(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let transform = args.int(0)?;
    if !(0..=7).contains(&transform) {
        return Err(ProtocolError::invalid(
            id,
            surface::error::INVALID_TRANSFORM,
            format!("buffer transform {transform} is not a wl_output.transform"),
        ));
    }
    surface_state(client, id)?.transform = transform;
    Ok(())
}

fn set_buffer_scale(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let scale = args.int(0)?;
    if scale < 1 {
        return Err(ProtocolError::invalid(
            id,
            surface::error::INVALID_SCALE,
            format!("buffer scale {scale} must be positive"),
        ));
    }
    surface_state(client, id)?.scale = scale;
    Ok(())
}

fn offset(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let x = args.int(0)?;
    let y = args.int(1)?;
    surface_state(client, id)?.pending_offset = (x, y);
    Ok(())
}

/// Applies pending state.
///
/// A new shared-memory buffer is submitted to the render thread and marked
/// busy; its frame callbacks wait for the release. Everything else completes
/// the frame callbacks immediately.
fn commit(client: &mut Client, id: ObjectId, _args: &mut Args) -> Result<(), ProtocolError> {
    check_xdg_configured(client, id)?;

    let state = surface_state(client, id)?;
    let attach = state.pending_buffer.take();
    let (dx, dy) = mem::take(&mut state.pending_offset);
    let pending_damage = mem::take(&mut state.pending_damage);
    let frames = mem::take(&mut state.pending_frames);
    let previous_extent = state.extent;
    let position = (state.position.0.saturating_add(dx), state.position.1.saturating_add(dy));
    state.position = position;

    let Some(attach) = attach else {
        return client.complete_frames(frames);
    };
    let Some(buffer) = attach else {
        let state = surface_state(client, id)?;
        state.current_buffer = None;
        state.extent = None;
        client.collaborators.render.damage(previous_extent);
        return client.complete_frames(frames);
    };

    let view = match &buffer_state(client, buffer)?.source {
        BufferSource::Shm(view) => Some(view.clone()),
        BufferSource::Dmabuf(_) => None,
    };
    let Some(view) = view else {
        // No GPU import: dmabuf contents are never read, so the buffer is
        // free again at once.
        let state = surface_state(client, id)?;
        state.current_buffer = Some(buffer);
        state.extent = None;
        client.collaborators.render.damage(previous_extent);
        client.buffer_release(buffer)?;
        return client.complete_frames(frames);
    };
    buffer_state(client, buffer)?.busy = true;

    let area = Rect::new(position.0, position.1, view.width, view.height);
    let damage = pending_damage
        .iter()
        .map(|rect| Rect::new(rect.x.saturating_add(area.x), rect.y.saturating_add(area.y), rect.width, rect.height))
        .map(|rect| rect.intersect(area))
        .fold(Rect::default(), Rect::union);
    let state = surface_state(client, id)?;
    state.current_buffer = Some(buffer);
    state.extent = Some(area);
    state.awaiting_release.push((buffer, frames));

    if let Some(previous) = previous_extent.filter(|previous| *previous != area) {
        client.collaborators.render.damage([previous]);
    }
    trace!(
        target: HANDLER_TARGET,
        client = %client.id(),
        surface = %id,
        buffer = %buffer,
        width = area.width,
        height = area.height,
        "submitting buffer"
    );
    client.collaborators.render.render_signal(Submission {
        handle: BufferHandle {
            client: client.id(),
            surface: id,
            buffer,
        },
        area,
        damage: if damage.is_empty() { area } else { damage },
        pixels: view,
    });
    Ok(())
}

/// An xdg surface may not attach a buffer before acknowledging a configure.
fn check_xdg_configured(client: &mut Client, id: ObjectId) -> Result<(), ProtocolError> {
    let state = surface_state(client, id)?;
    let attaching = matches!(state.pending_buffer, Some(Some(_)));
    let Some(SurfaceRole::Xdg(xdg)) = state.role else {
        return Ok(());
    };
    if attaching && !xdg_surface_state(client, xdg)?.configured {
        return Err(ProtocolError::invalid(
            xdg,
            xdg_surface::error::UNCONFIGURED_BUFFER,
            "buffer attached before the first configure was acknowledged",
        ));
    }
    Ok(())
}

fn region_add(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let rect = region_rect(id, args)?;
    region_state(client, id)?.ops.push(RegionOp::Add(rect));
    Ok(())
}

fn region_subtract(client: &mut Client, id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let rect = region_rect(id, args)?;
    region_state(client, id)?.ops.push(RegionOp::Subtract(rect));
    Ok(())
}

fn region_rect(id: ObjectId, args: &Args) -> Result<Rect, ProtocolError> {
    let rect = Rect::new(args.int(0)?, args.int(1)?, args.int(2)?, args.int(3)?);
    if rect.width < 0 || rect.height < 0 {
        return Err(ProtocolError::invalid(
            id,
            display::error::INVALID_METHOD,
            format!("region rectangle has negative size {}x{}", rect.width, rect.height),
        ));
    }
    Ok(rect)
}

impl Client {
    /// Fires each still-live frame callback with the current time.
    pub(crate) fn complete_frames(&mut self, callbacks: Vec<ObjectId>) -> Result<(), ProtocolError> {
        let time = self.timestamp();
        for callback in callbacks {
            if matches!(self.objects.get(callback), Ok(object) if object.interface == Interface::Callback) {
                self.callback_done(callback, time)?;
            }
        }
        Ok(())
    }

    /// The render thread finished with a buffer: release it and fire the
    /// frame callbacks committed with it.
    ///
    /// The buffer or surface may have been destroyed in the meantime.
    pub fn buffer_released(&mut self, handle: BufferHandle) -> Result<(), ProtocolError> {
        let mut release = false;
        if let Ok(Object {
            state: ObjectState::Buffer(buffer),
            ..
        }) = self.objects.get_mut(handle.buffer)
        {
            release = mem::replace(&mut buffer.busy, false);
        }
        if release {
            self.buffer_release(handle.buffer)?;
        }

        let frames = match self.objects.get_mut(handle.surface) {
            Ok(Object {
                state: ObjectState::Surface(surface),
                ..
            }) => surface
                .awaiting_release
                .iter()
                .position(|(buffer, _)| *buffer == handle.buffer)
                .map(|index| surface.awaiting_release.remove(index).1)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        debug!(
            target: HANDLER_TARGET,
            client = %self.id(),
            buffer = %handle.buffer,
            callbacks = frames.len(),
            "buffer released"
        );
        self.complete_frames(frames)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use vwm_protocol::ArgValue;
    use vwm_protocol::schema::{buffer, callback, shm, shm_pool};

    use super::*;
    use crate::handlers::test_support::{Harness, harness, id};

    const COMPOSITOR: u32 = 3;
    const SHM: u32 = 4;
    const SURFACE: u32 = 5;
    const POOL: u32 = 6;
    const BUFFER: u32 = 7;
    const CALLBACK: u32 = 8;

    fn with_surface(harness: &mut Harness) {
        harness.get_registry(2);
        harness.bind(2, 1, "wl_compositor", 5, COMPOSITOR);
        harness.bind(2, 2, "wl_shm", 1, SHM);
        harness.request(COMPOSITOR, compositor::request::CREATE_SURFACE, vec![ArgValue::NewId(id(SURFACE))]);
    }

    fn with_buffer(harness: &mut Harness) {
        let mut file = tempfile::tempfile().expect("pool file");
        file.write_all(&[0x7f; 1024]).expect("fill pool");
        let pool_fd = std::os::fd::OwnedFd::from(file);
        harness.request(
            SHM,
            shm::request::CREATE_POOL,
            vec![ArgValue::NewId(id(POOL)), ArgValue::Fd(pool_fd), ArgValue::Int(1024)],
        );
        harness.request(
            POOL,
            shm_pool::request::CREATE_BUFFER,
            vec![
                ArgValue::NewId(id(BUFFER)),
                ArgValue::Int(0),
                ArgValue::Int(8),
                ArgValue::Int(8),
                ArgValue::Int(32),
                ArgValue::Uint(shm::format::ARGB8888),
            ],
        );
    }

    fn attach_and_commit(harness: &mut Harness, x: i32, y: i32) {
        harness.request(
            SURFACE,
            surface::request::ATTACH,
            vec![ArgValue::Object(Some(id(BUFFER))), ArgValue::Int(x), ArgValue::Int(y)],
        );
        harness.request(SURFACE, surface::request::FRAME, vec![ArgValue::NewId(id(CALLBACK))]);
        harness.request(SURFACE, surface::request::COMMIT, Vec::new());
    }

    #[rstest]
    fn commit_without_buffer_fires_frames_at_once(mut harness: Harness) {
        with_surface(&mut harness);
        harness.events();
        harness.request(SURFACE, surface::request::FRAME, vec![ArgValue::NewId(id(CALLBACK))]);
        harness.request(SURFACE, surface::request::COMMIT, Vec::new());

        let events = harness.events();
        assert_eq!(events[0].object, CALLBACK);
        assert_eq!(events[0].opcode, callback::event::DONE);
        assert!(harness.client.objects.get(id(CALLBACK)).is_err());
    }

    #[rstest]
    fn shm_commit_submits_and_defers_frames(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        harness.events();
        attach_and_commit(&mut harness, 10, 20);

        assert!(harness.events().is_empty(), "frame waits for release");
        let batch = harness.render.next_batch().expect("submission queued");
        let [submission] = batch.submissions.as_slice() else {
            panic!("expected one submission");
        };
        assert_eq!(submission.area, Rect::new(10, 20, 8, 8));
        assert_eq!(submission.damage, submission.area);
        assert_eq!(submission.handle.buffer, id(BUFFER));

        harness.client.buffer_released(submission.handle).expect("release");
        let events = harness.events();
        let opcodes: Vec<(u32, u16)> = events.iter().map(|event| (event.object, event.opcode)).collect();
        assert_eq!(
            opcodes,
            vec![
                (BUFFER, buffer::event::RELEASE),
                (CALLBACK, callback::event::DONE),
                (1, display::event::DELETE_ID),
            ]
        );
    }

    #[rstest]
    fn damage_far_outside_the_buffer_is_clipped_to_its_area(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        harness.events();
        harness.request(
            SURFACE,
            surface::request::ATTACH,
            vec![ArgValue::Object(Some(id(BUFFER))), ArgValue::Int(10), ArgValue::Int(20)],
        );
        let rects = [
            (i32::MIN, 0, 1, 1),
            (100, 0, 1, 1),
            (2, 3, 1, 1),
            (i32::MAX, i32::MAX, i32::MAX, 4),
        ];
        for (x, y, width, height) in rects {
            harness.request(
                SURFACE,
                surface::request::DAMAGE_BUFFER,
                vec![ArgValue::Int(x), ArgValue::Int(y), ArgValue::Int(width), ArgValue::Int(height)],
            );
        }
        harness.request(SURFACE, surface::request::COMMIT, Vec::new());

        let batch = harness.render.next_batch().expect("submission queued");
        let [submission] = batch.submissions.as_slice() else {
            panic!("expected one submission");
        };
        assert_eq!(submission.area, Rect::new(10, 20, 8, 8));
        assert_eq!(submission.damage, Rect::new(12, 23, 1, 1));
    }

    #[rstest]
    fn damage_wholly_outside_the_buffer_redraws_the_area(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        harness.events();
        harness.request(
            SURFACE,
            surface::request::ATTACH,
            vec![ArgValue::Object(Some(id(BUFFER))), ArgValue::Int(0), ArgValue::Int(0)],
        );
        for x in [i32::MIN, 100] {
            harness.request(
                SURFACE,
                surface::request::DAMAGE,
                vec![ArgValue::Int(x), ArgValue::Int(0), ArgValue::Int(1), ArgValue::Int(1)],
            );
        }
        harness.request(SURFACE, surface::request::COMMIT, Vec::new());

        let batch = harness.render.next_batch().expect("submission queued");
        let [submission] = batch.submissions.as_slice() else {
            panic!("expected one submission");
        };
        assert_eq!(submission.damage, submission.area);
    }

    #[rstest]
    fn moving_a_surface_damages_its_old_extent(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        attach_and_commit(&mut harness, 0, 0);
        let first = harness.render.next_batch().expect("first commit");
        harness.client.buffer_released(first.submissions[0].handle).expect("release");

        harness.request(
            SURFACE,
            surface::request::ATTACH,
            vec![ArgValue::Object(Some(id(BUFFER))), ArgValue::Int(4), ArgValue::Int(0)],
        );
        harness.request(SURFACE, surface::request::COMMIT, Vec::new());

        let second = harness.render.next_batch().expect("second commit");
        assert_eq!(second.damage, vec![Rect::new(0, 0, 8, 8)]);
        assert_eq!(second.submissions[0].area, Rect::new(4, 0, 8, 8));
    }

    #[rstest]
    fn destroying_a_surface_damages_its_extent(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        attach_and_commit(&mut harness, 2, 3);
        harness.render.next_batch().expect("commit");

        harness.request(SURFACE, surface::request::DESTROY, Vec::new());
        let batch = harness.render.next_batch().expect("teardown damage");
        assert_eq!(batch.damage, vec![Rect::new(2, 3, 8, 8)]);
        assert!(harness.client.objects.get(id(CALLBACK)).is_err());
        assert!(harness.client.objects.get(id(SURFACE)).is_err());
    }

    #[rstest]
    fn attaching_a_non_buffer_is_rejected(mut harness: Harness) {
        with_surface(&mut harness);
        let error = harness
            .try_request(
                SURFACE,
                surface::request::ATTACH,
                vec![ArgValue::Object(Some(id(COMPOSITOR))), ArgValue::Int(0), ArgValue::Int(0)],
            )
            .expect_err("compositor is not a buffer");
        let (_, code, _) = error.display_error().expect("reported");
        assert_eq!(code, display::error::INVALID_OBJECT);
    }

    #[rstest]
    #[case(surface::request::SET_BUFFER_SCALE, 0, surface::error::INVALID_SCALE)]
    #[case(surface::request::SET_BUFFER_TRANSFORM, 8, surface::error::INVALID_TRANSFORM)]
    fn invalid_buffer_parameters_are_surface_errors(
        mut harness: Harness,
        #[case] opcode: u16,
        #[case] value: i32,
        #[case] expected: u32,
    ) {
        with_surface(&mut harness);
        let error = harness
            .try_request(SURFACE, opcode, vec![ArgValue::Int(value)])
            .expect_err("out of range");
        assert_eq!(error.display_error().map(|(object, code, _)| (object, code)), Some((id(SURFACE), expected)));
    }

    #[rstest]
    fn regions_record_their_operations(mut harness: Harness) {
        with_surface(&mut harness);
        harness.request(COMPOSITOR, compositor::request::CREATE_REGION, vec![ArgValue::NewId(id(9))]);
        let rect = |x| vec![ArgValue::Int(x), ArgValue::Int(0), ArgValue::Int(4), ArgValue::Int(4)];
        harness.request(9, region::request::ADD, rect(0));
        harness.request(9, region::request::SUBTRACT, rect(2));
        harness.request(SURFACE, surface::request::SET_OPAQUE_REGION, vec![ArgValue::Object(Some(id(9)))]);

        let state = surface_state(&mut harness.client, id(SURFACE)).expect("surface");
        assert_eq!(
            state.opaque_region,
            Some(vec![
                RegionOp::Add(Rect::new(0, 0, 4, 4)),
                RegionOp::Subtract(Rect::new(2, 0, 4, 4)),
            ])
        );
    }

    #[rstest]
    fn negative_region_sizes_are_rejected(mut harness: Harness) {
        with_surface(&mut harness);
        harness.request(COMPOSITOR, compositor::request::CREATE_REGION, vec![ArgValue::NewId(id(9))]);
        let result = harness.try_request(
            9,
            region::request::ADD,
            vec![ArgValue::Int(0), ArgValue::Int(0), ArgValue::Int(-1), ArgValue::Int(4)],
        );
        assert!(matches!(result, Err(ProtocolError::InvalidRequest { .. })));
    }

    #[rstest]
    fn releases_for_destroyed_buffers_still_fire_frames(mut harness: Harness) {
        with_surface(&mut harness);
        with_buffer(&mut harness);
        attach_and_commit(&mut harness, 0, 0);
        let batch = harness.render.next_batch().expect("commit");
        harness.request(BUFFER, buffer::request::DESTROY, Vec::new());
        harness.events();

        harness.client.buffer_released(batch.submissions[0].handle).expect("release");
        let events = harness.events();
        assert_eq!(events[0].object, CALLBACK);
        assert_eq!(events[0].opcode, callback::event::DONE);
    }
}
