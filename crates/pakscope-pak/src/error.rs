//! Error types for pak archives.
//!
//! Errors raised while building a catalog abort opening the archive. Errors
//! raised while resolving one entry are wrapped in [`Error::Entry`] so callers
//! can skip that entry and keep going.

use thiserror::Error;

/// Errors that can occur when working with pak archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Truncated data or malformed primitive.
    #[error("{0}")]
    Common(#[from] pakscope_common::Error),

    /// Object decoder failure.
    #[error("{0}")]
    Object(#[from] pakscope_gfx::Error),

    /// ZIP central directory error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Game descriptor could not be parsed.
    #[error("invalid game descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// Wrong magic number at the start of a structure.
    #[error("invalid {format} magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic {
        format: &'static str,
        expected: u32,
        actual: u32,
    },

    /// Format version outside the supported range.
    #[error("unsupported {format} version {version:#x}")]
    UnsupportedVersion { format: &'static str, version: u32 },

    /// A directory record did not end with its fixed sentinel.
    #[error("invalid terminator for {path}: was {actual:#06x} but expected 0xffff")]
    BadTerminator { path: String, actual: u16 },

    /// Structural violation not covered by a more specific variant.
    #[error("invalid {format} archive: {reason}")]
    InvalidArchive { format: &'static str, reason: String },

    /// Entry references a numbered archive but this is not a `_dir.vpk`.
    #[error("{0} references external archives but is not a _dir.vpk")]
    NotDirectoryVpk(String),

    /// Recomputed checksum disagrees with the stored one.
    #[error("{what} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    /// Signature block present but does not verify.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// A companion file the catalog depends on is absent.
    #[error("{archive} requires {path}, which does not exist")]
    MissingDependency { archive: String, path: String },

    /// The game descriptor has no key but the format needs one.
    #[error("game {0} has no key for its obfuscated directory")]
    MissingKey(String),

    /// Recognised format that is deliberately not implemented.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A sub-archive would reopen an archive already on the open chain.
    #[error("recursive archive reference: {0}")]
    RecursiveArchive(String),

    /// Entry exists but does not hold a nested archive.
    #[error("{0} is not an archive")]
    NotAnArchive(String),

    /// Entry byte range lies outside its stream.
    #[error("{path}: range {offset}+{size} exceeds stream length {len}")]
    OutOfBounds {
        path: String,
        offset: u64,
        size: u64,
        len: u64,
    },

    /// Entry not found.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Failure scoped to a single entry.
    #[error("{path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap `self` as a failure of entry `path`. Already-wrapped errors pass through.
    pub fn for_entry(self, path: &str) -> Self {
        match self {
            Error::Entry { .. } => self,
            other => Error::Entry {
                path: path.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through [`Error::Entry`].
    pub fn root(&self) -> &Error {
        match self {
            Error::Entry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Checksum, signature or terminator failures.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self.root(),
            Error::ChecksumMismatch { .. } | Error::SignatureInvalid(_) | Error::BadTerminator { .. }
        )
    }

    /// Recognised-but-unimplemented formats.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.root(),
            Error::Unsupported(_)
                | Error::Object(pakscope_gfx::Error::Unsupported(_))
        )
    }

    /// Short reads, out-of-range seeks and ranges past end of stream.
    pub fn is_truncation(&self) -> bool {
        match self.root() {
            Error::Common(e) => e.is_truncation(),
            Error::Object(pakscope_gfx::Error::Common(e)) => e.is_truncation(),
            Error::OutOfBounds { .. } => true,
            _ => false,
        }
    }

    /// Whether the failure is scoped to one entry.
    pub fn is_entry(&self) -> bool {
        matches!(self, Error::Entry { .. })
    }
}

/// Result type for pak operations.
pub type Result<T> = std::result::Result<T, Error>;
