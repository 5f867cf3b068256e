//! Common utilities for pakscope.
//!
//! This crate provides the foundational pieces shared by every archive and
//! object decoder:
//!
//! - [`BinaryReader`] - bounds-checked, endianness-aware cursor over a byte slice
//! - [`StringEncoding`] - ASCII/UTF-8 decoding rules for on-disk strings
//! - [`crc`] - CRC32 (IEEE) checksums used for entry integrity checks

mod error;
mod reader;

pub mod crc;

pub use error::{Error, Result};
pub use reader::{BinaryReader, StringEncoding};

/// Re-export zerocopy traits and endian-typed integers for struct layouts.
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
pub use zerocopy::byteorder;

/// Re-export memchr for fast NUL scanning
pub use memchr;
