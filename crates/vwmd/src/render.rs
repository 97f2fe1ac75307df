//! Hand-off between connection threads and the render thread.
//!
//! Connections push submissions into one mutex-guarded queue and wake the
//! render thread through a condition variable. The render thread presents
//! each submission and only then routes `buffer_released` back to the
//! owning connection, so the client never reuses memory that is still being
//! read.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};
use vwm_protocol::ObjectId;

use crate::connection::ClientId;
use crate::shm::ShmView;

const RENDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::render");

/// Axis-aligned rectangle in output coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.x.saturating_add(self.width).max(other.x.saturating_add(other.width));
        let bottom = self
            .y
            .saturating_add(self.height)
            .max(other.y.saturating_add(other.height));
        Self::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top))
    }

    /// Overlap of both; empty when they are disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.x.saturating_add(self.width).min(other.x.saturating_add(other.width));
        let bottom = self
            .y
            .saturating_add(self.height)
            .min(other.y.saturating_add(other.height));
        if right <= left || bottom <= top {
            return Self::default();
        }
        Self::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top))
    }
}

/// Identifies a submitted buffer so its release can be routed home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    pub client: ClientId,
    pub surface: ObjectId,
    pub buffer: ObjectId,
}

/// A committed buffer ready to be presented.
#[derive(Debug, Clone)]
pub struct Submission {
    pub handle: BufferHandle,
    /// Where the buffer lands on the output.
    pub area: Rect,
    pub damage: Rect,
    pub pixels: ShmView,
}

/// Consumer of committed frames; GPU presentation plugs in here.
#[cfg_attr(test, mockall::automock)]
pub trait RenderConsumer: Send {
    /// Reads the submission's pixels. The client may reuse the buffer as
    /// soon as this returns.
    fn present(&mut self, submission: &Submission);

    /// Repaints areas that lost their content, such as a departed client's
    /// surfaces.
    fn repaint(&mut self, damage: &[Rect]);
}

/// Logs and discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderConsumer;

impl RenderConsumer for NullRenderConsumer {
    fn present(&mut self, submission: &Submission) {
        trace!(
            target: RENDER_TARGET,
            client = %submission.handle.client,
            surface = %submission.handle.surface,
            width = submission.area.width,
            height = submission.area.height,
            "presented frame"
        );
    }

    fn repaint(&mut self, damage: &[Rect]) {
        trace!(target: RENDER_TARGET, rects = damage.len(), "repainted damage");
    }
}

/// Routes buffer releases back to the connection that submitted them.
pub trait ReleaseRouter: Send + Sync {
    fn buffer_released(&self, handle: BufferHandle);
}

#[derive(Debug, Default)]
struct RenderState {
    submissions: Vec<Submission>,
    damage: Vec<Rect>,
    shutdown: bool,
}

impl RenderState {
    const fn is_dirty(&self) -> bool {
        !self.submissions.is_empty() || !self.damage.is_empty()
    }
}

/// Queue shared by every connection and the render thread.
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    shared: Arc<(Mutex<RenderState>, Condvar)>,
}

/// Work taken from the queue in one wake-up.
#[derive(Debug, Default)]
pub struct RenderBatch {
    pub submissions: Vec<Submission>,
    pub damage: Vec<Rect>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a committed buffer and wakes the render thread.
    pub fn render_signal(&self, submission: Submission) {
        self.update(|state| state.submissions.push(submission));
    }

    /// Schedules a repaint of areas that lost their content.
    pub fn damage(&self, rects: impl IntoIterator<Item = Rect>) {
        let rects: Vec<Rect> = rects.into_iter().filter(|rect| !rect.is_empty()).collect();
        if rects.is_empty() {
            return;
        }
        self.update(|state| state.damage.extend(rects));
    }

    /// Asks the render thread to exit once the queue is drained.
    pub fn shutdown(&self) {
        self.update(|state| state.shutdown = true);
    }

    /// Blocks until work arrives; `None` once shut down with nothing left.
    pub fn next_batch(&self) -> Option<RenderBatch> {
        let (lock, condvar) = &*self.shared;
        let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !state.is_dirty() && !state.shutdown {
            state = condvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if !state.is_dirty() {
            return None;
        }
        Some(RenderBatch {
            submissions: std::mem::take(&mut state.submissions),
            damage: std::mem::take(&mut state.damage),
        })
    }

    fn update(&self, change: impl FnOnce(&mut RenderState)) {
        let (lock, condvar) = &*self.shared;
        let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut state);
        condvar.notify_one();
    }
}

/// Starts the render thread.
pub fn spawn_render_thread(
    queue: RenderQueue,
    mut consumer: Box<dyn RenderConsumer>,
    router: Arc<dyn ReleaseRouter>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("vwmd-render".to_owned())
        .spawn(move || {
            debug!(target: RENDER_TARGET, "render thread started");
            while let Some(batch) = queue.next_batch() {
                for submission in &batch.submissions {
                    consumer.present(submission);
                    router.buffer_released(submission.handle);
                }
                if !batch.damage.is_empty() {
                    consumer.repaint(&batch.damage);
                }
            }
            debug!(target: RENDER_TARGET, "render thread stopped");
        })
}
