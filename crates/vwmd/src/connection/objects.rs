//! Per-connection object table.
//!
//! Ids are chosen by the client, dense and 1-based. The table never shrinks:
//! destroying an object leaves an empty slot that a later `new_id` may reuse,
//! and the only other legal allocation is the id one past the end.

use std::os::fd::OwnedFd;
use std::sync::Arc;

use vwm_protocol::{Interface, ObjectId};

use super::errors::ObjectError;
use crate::render::Rect;
use crate::shm::{ShmMapping, ShmView};

/// A live server-side object.
#[derive(Debug)]
pub struct Object {
    pub interface: Interface,
    /// Version bound by the client; children inherit their parent's.
    pub version: u32,
    pub state: ObjectState,
}

impl Object {
    #[must_use]
    pub const fn new(interface: Interface, version: u32, state: ObjectState) -> Self {
        Self {
            interface,
            version,
            state,
        }
    }

    /// An object whose interface carries no server-side state.
    #[must_use]
    pub const fn plain(interface: Interface, version: u32) -> Self {
        Self::new(interface, version, ObjectState::Plain)
    }
}

/// Interface-specific server state.
#[derive(Debug)]
pub enum ObjectState {
    /// Interfaces whose behaviour needs no stored state.
    Plain,
    ShmPool(ShmPool),
    Buffer(BufferState),
    Surface(SurfaceState),
    Region(RegionState),
    XdgSurface(XdgSurfaceState),
    Toplevel(ToplevelState),
    DmabufParams(DmabufParams),
}

/// Client memory shared through `wl_shm.create_pool`.
#[derive(Debug)]
pub struct ShmPool {
    pub fd: OwnedFd,
    pub mapping: Arc<ShmMapping>,
}

/// Where a buffer's pixels live.
#[derive(Debug)]
pub enum BufferSource {
    Shm(ShmView),
    Dmabuf(DmabufAttributes),
}

#[derive(Debug)]
pub struct BufferState {
    pub source: BufferSource,
    /// Set while the render thread may still read the pixels.
    pub busy: bool,
}

impl BufferState {
    #[must_use]
    pub fn size(&self) -> (i32, i32) {
        match &self.source {
            BufferSource::Shm(view) => (view.width, view.height),
            BufferSource::Dmabuf(attributes) => (attributes.width, attributes.height),
        }
    }
}

/// Double-buffered surface state.
#[derive(Debug, Default)]
pub struct SurfaceState {
    /// `None` means no attach since the last commit; `Some(None)` detaches.
    pub pending_buffer: Option<Option<ObjectId>>,
    pub pending_offset: (i32, i32),
    pub pending_damage: Vec<Rect>,
    pub pending_frames: Vec<ObjectId>,
    pub current_buffer: Option<ObjectId>,
    /// Frame callbacks waiting for the render thread to release a buffer.
    pub awaiting_release: Vec<(ObjectId, Vec<ObjectId>)>,
    /// Area occupied on the output after the last commit.
    pub extent: Option<Rect>,
    pub position: (i32, i32),
    pub opaque_region: Option<Vec<RegionOp>>,
    pub input_region: Option<Vec<RegionOp>>,
    pub transform: i32,
    pub scale: i32,
    pub role: Option<SurfaceRole>,
}

impl SurfaceState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scale: 1,
            ..Self::default()
        }
    }
}

/// Role assigned to a surface by a shell protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    /// `xdg_surface` with the given object id.
    Xdg(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOp {
    Add(Rect),
    Subtract(Rect),
}

#[derive(Debug, Default)]
pub struct RegionState {
    pub ops: Vec<RegionOp>,
}

#[derive(Debug)]
pub struct XdgSurfaceState {
    pub surface: ObjectId,
    pub toplevel: Option<ObjectId>,
    /// Serial of the newest configure sent.
    pub pending_serial: Option<u32>,
    /// Whether the client has acknowledged any configure.
    pub configured: bool,
    pub geometry: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct ToplevelState {
    pub xdg_surface: Option<ObjectId>,
    pub title: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug)]
pub struct DmabufPlane {
    pub fd: OwnedFd,
    pub index: u32,
    pub offset: u32,
    pub stride: u32,
    pub modifier: u64,
}

#[derive(Debug, Default)]
pub struct DmabufParams {
    pub planes: Vec<DmabufPlane>,
    pub used: bool,
}

#[derive(Debug)]
pub struct DmabufAttributes {
    pub width: i32,
    pub height: i32,
    pub format: u32,
    pub planes: Vec<DmabufPlane>,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Live(Object),
}

/// Dense id-indexed object storage.
#[derive(Debug)]
pub struct ObjectTable {
    slots: Vec<Slot>,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    /// A table holding only the display at id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::Live(Object::plain(Interface::Display, 1))],
        }
    }

    /// Number of slots, empty ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers `object` at `id`.
    ///
    /// `id` must be one past the end of the table or name an empty slot.
    pub fn add(&mut self, id: ObjectId, object: Object) -> Result<(), ObjectError> {
        let index = slot_index(id);
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot @ Slot::Empty) => {
                *slot = Slot::Live(object);
                Ok(())
            }
            None if index == len => {
                self.slots.push(Slot::Live(object));
                Ok(())
            }
            _ => Err(ObjectError::IdNotAllocatable {
                id: id.get(),
                next: u32::try_from(len + 1).unwrap_or(u32::MAX),
            }),
        }
    }

    pub fn get(&self, id: ObjectId) -> Result<&Object, ObjectError> {
        match self.slots.get(slot_index(id)) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Empty) => Err(ObjectError::DeletedObject { id: id.get() }),
            None => Err(ObjectError::UnknownObject { id: id.get() }),
        }
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut Object, ObjectError> {
        match self.slots.get_mut(slot_index(id)) {
            Some(Slot::Live(object)) => Ok(object),
            Some(Slot::Empty) => Err(ObjectError::DeletedObject { id: id.get() }),
            None => Err(ObjectError::UnknownObject { id: id.get() }),
        }
    }

    /// Empties the slot at `id`, returning what it held.
    pub fn delete(&mut self, id: ObjectId) -> Result<Object, ObjectError> {
        let slot = self
            .slots
            .get_mut(slot_index(id))
            .ok_or(ObjectError::UnknownObject { id: id.get() })?;
        match std::mem::replace(slot, Slot::Empty) {
            Slot::Live(object) => Ok(object),
            Slot::Empty => Err(ObjectError::DeletedObject { id: id.get() }),
        }
    }

    /// Live objects with their ids, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Live(object) => {
                let id = u32::try_from(index + 1).ok().and_then(ObjectId::new)?;
                Some((id, object))
            }
            Slot::Empty => None,
        })
    }

    /// Ids of live objects implementing `interface`.
    #[must_use]
    pub fn ids_of(&self, interface: Interface) -> Vec<ObjectId> {
        self.iter()
            .filter(|(_, object)| object.interface == interface)
            .map(|(id, _)| id)
            .collect()
    }

    /// Drops every object, releasing memory mappings and descriptors.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

fn slot_index(id: ObjectId) -> usize {
    usize::try_from(id.get() - 1).unwrap_or(usize::MAX)
}
