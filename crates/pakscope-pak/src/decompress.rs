//! Block decompression used by payload resolution.

use std::fmt;
use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::{Error, Result};

/// Compression algorithm of a stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// PKWARE Data Compression Library implode ("blast").
    Blast,
    /// Raw DEFLATE.
    Deflate,
    /// DEFLATE with a zlib header.
    Zlib,
}

impl Codec {
    /// Zlib when the payload starts with a zlib header, raw deflate otherwise.
    pub fn sniff_deflate(input: &[u8]) -> Self {
        match input {
            [cmf, flg, ..] if cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0 => Codec::Zlib,
            _ => Codec::Deflate,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Blast => "blast",
            Codec::Deflate => "deflate",
            Codec::Zlib => "zlib",
        })
    }
}

/// Decompresses whole payloads of known unpacked size.
pub trait Decompressor: Send + Sync + fmt::Debug {
    /// Output shorter than `unpacked_size` is an error; longer output is truncated.
    fn decompress(&self, codec: Codec, input: &[u8], unpacked_size: usize) -> Result<Vec<u8>>;
}

/// Blast via `explode`, deflate and zlib via `flate2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecompressor;

impl Decompressor for StandardDecompressor {
    fn decompress(&self, codec: Codec, input: &[u8], unpacked_size: usize) -> Result<Vec<u8>> {
        let mut output = match codec {
            Codec::Blast => explode::explode(input)
                .map_err(|e| Error::Decompression(format!("blast: {e:?}")))?,
            Codec::Deflate => decompress_deflate(input, unpacked_size)?,
            Codec::Zlib => decompress_zlib(input, unpacked_size)?,
        };
        if output.len() < unpacked_size {
            return Err(Error::Decompression(format!(
                "{codec} produced {} bytes, expected {unpacked_size}",
                output.len()
            )));
        }
        output.truncate(unpacked_size);
        Ok(output)
    }
}

/// Upper bound on DEFLATE expansion per input byte.
const MAX_DEFLATE_RATIO: usize = 1032;

fn output_capacity(input_len: usize, expected_size: usize) -> usize {
    expected_size.min(input_len.saturating_mul(MAX_DEFLATE_RATIO))
}

/// Decompress DEFLATE-compressed data with known output size.
pub fn decompress_deflate(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_capacity(data.len(), expected_size));
    DeflateDecoder::new(data)
        .take(expected_size as u64)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(output)
}

/// Decompress zlib-wrapped data with known output size.
pub fn decompress_zlib(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_capacity(data.len(), expected_size));
    ZlibDecoder::new(data)
        .take(expected_size as u64)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(output)
}
