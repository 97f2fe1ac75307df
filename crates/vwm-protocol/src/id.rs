use std::fmt;
use std::num::NonZeroU32;

/// Client-assigned object identifier.
///
/// Zero is the wire encoding of "no object" and is therefore never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(NonZeroU32);

impl ObjectId {
    /// The display object, registered before the client sends anything.
    pub const DISPLAY: Self = Self(NonZeroU32::MIN);

    /// Wraps a raw id, returning `None` for the null id.
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Raw wire value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
