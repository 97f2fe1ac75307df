//! Error types for wire decoding and encoding.

use thiserror::Error;

use crate::kind::ArgKind;

/// Errors raised while framing, decoding or encoding protocol messages.
///
/// Every variant describes untrusted input that disagrees with the declared
/// layout; callers treat all of them as fatal for the connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The header declared a total size smaller than the header itself.
    #[error("message declares size {size}, smaller than the 8 byte header")]
    UndersizedMessage { size: u16 },

    /// A read ran past the end of the payload.
    #[error("payload truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Bytes remained after every declared argument was decoded.
    #[error("{remaining} trailing bytes after the last argument")]
    TrailingBytes { remaining: usize },

    /// A string argument did not end with a NUL byte.
    #[error("string argument {index} is not NUL-terminated")]
    MissingNul { index: usize },

    /// A string argument was not valid UTF-8.
    #[error("string argument {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    /// A non-nullable argument carried the null value.
    #[error("argument {index} must not be null")]
    UnexpectedNull { index: usize },

    /// An `fd` argument was declared but no descriptor was queued.
    #[error("argument {index} expects a file descriptor but none is pending")]
    NoPendingDescriptor { index: usize },

    /// An argument value did not match the declared kind.
    #[error("argument {index} does not match declared kind {expected:?}")]
    ArgumentMismatch { index: usize, expected: ArgKind },

    /// The caller supplied the wrong number of arguments for an event.
    #[error("event expects {expected} arguments, {supplied} supplied")]
    ArityMismatch { expected: usize, supplied: usize },

    /// An encoded message would not fit the 16-bit size field.
    #[error("encoded message of {size} bytes exceeds the 65535 byte limit")]
    MessageTooLarge { size: usize },
}

impl WireError {
    /// Builds a truncation error for a cursor read.
    pub(crate) const fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Self::Truncated {
            offset,
            needed,
            available,
        }
    }
}
