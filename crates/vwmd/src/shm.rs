//! Read-only mappings of client shared memory.

use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;
use std::os::fd::AsFd;
use std::ptr::NonNull;
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::mman::{self, MapFlags, ProtFlags};

/// A shared, read-only `mmap` of a client pool.
///
/// Buffers and render submissions hold the mapping through an [`Arc`], so a
/// pool may be destroyed or remapped while earlier buffers are still in use.
pub struct ShmMapping {
    ptr: NonNull<c_void>,
    len: NonZeroUsize,
}

// SAFETY: the mapping is never written through and is unmapped only once, on
// drop of the last owner.
unsafe impl Send for ShmMapping {}
// SAFETY: as above; shared access only ever reads.
unsafe impl Sync for ShmMapping {}

impl ShmMapping {
    /// Maps `len` bytes of `fd` for reading.
    pub fn map(fd: impl AsFd, len: NonZeroUsize) -> Result<Self, Errno> {
        // SAFETY: a fresh shared read-only mapping aliases no Rust memory.
        let ptr = unsafe {
            mman::mmap(
                None,
                len,
                ProtFlags::PROT_READ,
                MapFlags::MAP_SHARED,
                fd,
                0,
            )?
        };
        Ok(Self { ptr, len })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len.get()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Copies the bytes at `offset` into `out`, or returns `None` when the
    /// range leaves the mapping.
    ///
    /// The client owns the pool and may rewrite it while the copy runs, so
    /// the result can be a torn frame. The region is only ever read through
    /// raw pointers and never borrowed as `&[u8]`.
    ///
    /// A client that truncates the backing file below the mapped length
    /// makes this read fault with `SIGBUS`; no handler is installed for it.
    pub fn copy_into(&self, offset: usize, out: &mut [u8]) -> Option<()> {
        let end = offset.checked_add(out.len())?;
        if end > self.len.get() {
            return None;
        }
        // SAFETY: `offset..end` lies within the `len` readable bytes mapped
        // for the lifetime of `self`, and `out` is private memory that cannot
        // overlap a fresh mapping.
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.ptr.as_ptr().cast::<u8>().add(offset),
                out.as_mut_ptr(),
                out.len(),
            );
        }
        Some(())
    }

    /// Snapshot of `len` bytes starting at `offset`.
    #[must_use]
    pub fn read(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        if offset.checked_add(len)? > self.len.get() {
            return None;
        }
        let mut out = vec![0; len];
        self.copy_into(offset, &mut out)?;
        Some(out)
    }
}

impl Drop for ShmMapping {
    fn drop(&mut self) {
        // SAFETY: the region was created by `mmap` with this length and no
        // borrow of it can outlive `self`.
        if let Err(errno) = unsafe { mman::munmap(self.ptr, self.len.get()) } {
            tracing::warn!(
                target: concat!(env!("CARGO_PKG_NAME"), "::shm"),
                %errno,
                "failed to unmap client pool"
            );
        }
    }
}

impl fmt::Debug for ShmMapping {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ShmMapping")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// A buffer's window into a pool mapping.
#[derive(Debug, Clone)]
pub struct ShmView {
    pub mapping: Arc<ShmMapping>,
    pub offset: usize,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: u32,
}

impl ShmView {
    /// Copy of the bytes spanned by the buffer, or `None` if the view does
    /// not fit. See [`ShmMapping::copy_into`] for what a misbehaving client
    /// can do to the read.
    #[must_use]
    pub fn pixels(&self) -> Option<Vec<u8>> {
        let stride = usize::try_from(self.stride).ok()?;
        let height = usize::try_from(self.height).ok()?;
        self.mapping.read(self.offset, stride.checked_mul(height)?)
    }
}
