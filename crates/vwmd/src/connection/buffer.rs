//! Receive buffer with inline storage and heap promotion.
//!
//! Unconsumed bytes live between two cursors, `first` and `last`, inside one
//! contiguous allocation. Consumed bytes are reclaimed by compaction
//! (`copy_within` down to offset zero) rather than by wrapping, so a message
//! that is still being assembled is always contiguous.

/// Bytes held inline before the buffer moves to the heap.
pub const INLINE_CAPACITY: usize = 4096;

/// Smallest spare region handed to a socket read.
pub const MIN_READ_SPACE: usize = 512;

const GROWTH_FACTOR: usize = 4;

#[derive(Debug)]
enum Storage {
    Inline([u8; INLINE_CAPACITY]),
    Heap(Vec<u8>),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Inline(bytes) => bytes,
            Self::Heap(bytes) => bytes,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Inline(bytes) => bytes,
            Self::Heap(bytes) => bytes,
        }
    }
}

/// Per-connection store for received but not yet framed bytes.
#[derive(Debug)]
pub struct ReceiveBuffer {
    storage: Storage,
    first: usize,
    last: usize,
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: Storage::Inline([0; INLINE_CAPACITY]),
            first: 0,
            last: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.bytes().len()
    }

    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// Bytes received but not yet consumed.
    #[must_use]
    pub fn unconsumed(&self) -> &[u8] {
        self.storage.bytes().get(self.first..self.last).unwrap_or(&[])
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.last - self.first
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// Marks `count` bytes at the front as consumed.
    ///
    /// Once everything is consumed both cursors return to zero and heap
    /// storage is released in favour of the inline array.
    pub fn consume(&mut self, count: usize) {
        self.first = self.first.saturating_add(count).min(self.last);
        if self.first == self.last {
            self.first = 0;
            self.last = 0;
            self.storage = Storage::Inline([0; INLINE_CAPACITY]);
        }
    }

    /// Moves unconsumed bytes down to offset zero.
    pub fn compact(&mut self) {
        if self.first == 0 {
            return;
        }
        let (first, last) = (self.first, self.last);
        self.storage.bytes_mut().copy_within(first..last, 0);
        self.last = last - first;
        self.first = 0;
    }

    /// Guarantees room for `total` contiguous unconsumed bytes starting at
    /// `first`, compacting and then growing as needed.
    pub fn ensure_contiguous(&mut self, total: usize) {
        if self.capacity() - self.first >= total {
            return;
        }
        self.compact();
        if self.capacity() < total {
            self.grow_to(total);
        }
    }

    /// Writable region after `last`, at least [`MIN_READ_SPACE`] bytes long.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        if self.capacity() - self.last < MIN_READ_SPACE {
            self.compact();
            if self.capacity() - self.last < MIN_READ_SPACE {
                self.grow_to(self.last + MIN_READ_SPACE);
            }
        }
        let last = self.last;
        self.storage.bytes_mut().get_mut(last..).unwrap_or(&mut [])
    }

    /// Records that `count` bytes were written into [`Self::spare_mut`].
    pub fn commit(&mut self, count: usize) {
        self.last = self.last.saturating_add(count).min(self.capacity());
    }

    fn grow_to(&mut self, minimum: usize) {
        let mut capacity = self.capacity();
        while capacity < minimum {
            capacity = capacity.saturating_mul(GROWTH_FACTOR);
        }
        match &mut self.storage {
            Storage::Heap(bytes) => bytes.resize(capacity, 0),
            Storage::Inline(inline) => {
                let mut heap = vec![0; capacity];
                if let (Some(target), Some(source)) =
                    (heap.get_mut(..self.last), inline.get(..self.last))
                {
                    target.copy_from_slice(source);
                }
                self.storage = Storage::Heap(heap);
            }
        }
    }
}
