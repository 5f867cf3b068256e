//! Error types for pakscope-common.

use thiserror::Error;

/// Common error type for pakscope operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of data at offset {position}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        position: usize,
        needed: usize,
        available: usize,
    },

    /// Seek target lies past the end of the stream.
    #[error("seek to {target} is out of bounds (stream length {len})")]
    SeekOutOfBounds { target: u64, len: usize },

    /// Invalid magic bytes encountered.
    #[error("invalid magic at offset {position}: expected {expected:02x?}, got {actual:02x?}")]
    InvalidMagic {
        position: usize,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Value did not match expected.
    #[error("expected value {expected}, got {actual}")]
    ExpectedValue { expected: String, actual: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing null terminator in string.
    #[error("string at offset {0} missing null terminator")]
    MissingNullTerminator(usize),

    /// A 7-bit encoded length ran past five bytes.
    #[error("malformed 7-bit encoded length at offset {0}")]
    InvalidVarint(usize),
}

impl Error {
    /// Whether this error means the data ended before the layout did.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedEof { .. } | Error::SeekOutOfBounds { .. } | Error::MissingNullTerminator(_)
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
