//! Header codec, checked payload cursor and primitive wire values.

use std::fmt;

use crate::errors::WireError;
use crate::id::ObjectId;

/// Size in bytes of every message header.
pub const HEADER_SIZE: usize = 8;

/// The eight bytes that open every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Sender (events) or target (requests) object id, possibly invalid.
    pub object: u32,
    pub opcode: u16,
    /// Total message size, header included.
    pub size: u16,
}

impl MessageHeader {
    /// Parses a header from the first eight bytes of `bytes`.
    ///
    /// Returns `None` when fewer than eight bytes are available. The declared
    /// size is not validated; see [`MessageHeader::validate`].
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_SIZE] = bytes.get(..HEADER_SIZE)?.try_into().ok()?;
        let [o0, o1, o2, o3, op0, op1, s0, s1] = *header;
        Some(Self {
            object: u32::from_le_bytes([o0, o1, o2, o3]),
            opcode: u16::from_le_bytes([op0, op1]),
            size: u16::from_le_bytes([s0, s1]),
        })
    }

    /// Rejects headers whose declared size cannot hold the header itself.
    pub fn validate(self) -> Result<Self, WireError> {
        if usize::from(self.size) < HEADER_SIZE {
            return Err(WireError::UndersizedMessage { size: self.size });
        }
        Ok(self)
    }

    /// Payload length implied by the declared size.
    #[must_use]
    pub fn payload_len(self) -> usize {
        usize::from(self.size).saturating_sub(HEADER_SIZE)
    }

    pub fn write_into(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.object.to_le_bytes());
        out.extend_from_slice(&self.opcode.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
    }

    /// The addressed object, or `None` for the null id.
    #[must_use]
    pub const fn object_id(self) -> Option<ObjectId> {
        ObjectId::new(self.object)
    }
}

/// Rounds `len` up to the next multiple of four.
#[must_use]
pub const fn round_up4(len: usize) -> usize {
    (len + 3) & !3
}

/// Marshalled size of a string with `len` content bytes: prefix, content, NUL,
/// padding.
#[must_use]
pub const fn marshalled_string_size(len: usize) -> usize {
    4 + round_up4(len + 1)
}

/// Marshalled size of an array with `len` bytes: prefix, bytes, padding.
#[must_use]
pub const fn marshalled_array_size(len: usize) -> usize {
    4 + round_up4(len)
}

/// Forward-only reader over a message payload.
///
/// Every read is bounds-checked; an overrun surfaces as
/// [`WireError::Truncated`] and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct PayloadCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> PayloadCursor<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Takes the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let bytes = self.bytes;
        let start = self.offset;
        let taken = start
            .checked_add(len)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| WireError::truncated(self.offset, len, self.remaining()))?;
        self.offset += len;
        Ok(taken)
    }

    pub fn take_u32(&mut self) -> Result<u32, WireError> {
        let word: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| WireError::truncated(self.offset, 4, self.remaining()))?;
        Ok(u32::from_le_bytes(word))
    }

    pub fn take_i32(&mut self) -> Result<i32, WireError> {
        self.take_u32().map(|word| word.cast_signed())
    }

    /// Skips padding up to the next four-byte boundary.
    pub fn align4(&mut self) -> Result<(), WireError> {
        let padding = round_up4(self.offset) - self.offset;
        self.take(padding).map(|_| ())
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

/// Signed 24.8 fixed-point number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i32);

impl Fixed {
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_mul(256))
    }

    /// Values outside the 24.8 range saturate; NaN maps to zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value is clamped to the i32 range before the cast"
    )]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        let scaled = (value * 256.0)
            .round()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX));
        Self(scaled as i32)
    }

    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 256.0
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.to_f64())
    }
}
