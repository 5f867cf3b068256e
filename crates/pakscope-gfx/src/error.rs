//! Error types for texture and object decoding.

use thiserror::Error;

/// Errors that can occur while decoding an entry payload into an object.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncation, bad strings).
    #[error("{0}")]
    Common(#[from] pakscope_common::Error),

    /// Magic number mismatch.
    #[error("invalid {kind} magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic {
        kind: &'static str,
        expected: u32,
        actual: u32,
    },

    /// Header field out of range.
    #[error("invalid {kind} header: {reason}")]
    InvalidHeader { kind: &'static str, reason: String },

    /// Width or height outside the format's allowed range.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Mip data did not start where the header said it would.
    #[error("bad mip offset: header says {expected}, data starts at {actual}")]
    BadOffset { expected: u32, actual: usize },

    /// A colour-mapped pixel referenced a palette slot that does not exist.
    #[error("colour map index {0} out of range")]
    ColorMapIndex(u32),

    /// Recognised but not decodable.
    #[error("unsupported {0}")]
    Unsupported(String),

    /// Generic image decoding failure.
    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for object decoding.
pub type Result<T> = std::result::Result<T, Error>;
