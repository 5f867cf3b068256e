//! Studio model (`.mdl`, magic `IDST`) header metadata.
//!
//! Only the header is decoded; geometry stays in the raw bytes.

use pakscope_common::{BinaryReader, StringEncoding};

use crate::{Error, Result};

/// `IDST` read as a little-endian u32.
pub const MDL_MAGIC: u32 = 0x5453_4449;
/// `IDSQ`: GoldSrc sequence-group companion file.
pub const MDL_SEQUENCE_MAGIC: u32 = 0x5153_4449;

/// Which studio model generation a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFlavor {
    /// Version 10 (Half-Life).
    GoldSrc,
    /// Versions 44 through 49.
    Source,
}

/// Counts and identity read from a studio model header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub flavor: ModelFlavor,
    pub version: i32,
    /// Source models carry a checksum shared with their .vvd/.vtx files.
    pub checksum: Option<i32>,
    pub name: String,
    pub length: u32,
    pub bones: u32,
    pub sequences: u32,
    pub textures: u32,
    pub body_parts: u32,
}

/// Byte offsets of the header fields that differ between generations.
struct Layout {
    name: u64,
    length: u64,
    bones: u64,
    sequences: u64,
    textures: u64,
    body_parts: u64,
}

const GOLDSRC: Layout = Layout {
    name: 8,
    length: 72,
    bones: 140,
    sequences: 164,
    textures: 180,
    body_parts: 204,
};

const SOURCE: Layout = Layout {
    name: 12,
    length: 76,
    bones: 156,
    sequences: 188,
    textures: 204,
    body_parts: 232,
};

impl ModelInfo {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let magic = reader.read_u32()?;
        if magic == MDL_SEQUENCE_MAGIC {
            return Err(Error::Unsupported("studio sequence group file".to_string()));
        }
        if magic != MDL_MAGIC {
            return Err(Error::InvalidMagic {
                kind: "MDL",
                expected: MDL_MAGIC,
                actual: magic,
            });
        }
        let version = reader.read_i32()?;
        let (flavor, layout) = match version {
            10 => (ModelFlavor::GoldSrc, &GOLDSRC),
            44..=49 => (ModelFlavor::Source, &SOURCE),
            other => return Err(Error::Unsupported(format!("studio model version {other}"))),
        };
        let checksum = match flavor {
            ModelFlavor::Source => Some(reader.read_i32()?),
            ModelFlavor::GoldSrc => None,
        };

        let mut field = |offset: u64| -> Result<u32> {
            reader.seek(offset)?;
            Ok(reader.read_u32()?)
        };
        let length = field(layout.length)?;
        let bones = field(layout.bones)?;
        let sequences = field(layout.sequences)?;
        let textures = field(layout.textures)?;
        let body_parts = field(layout.body_parts)?;

        reader.seek(layout.name)?;
        let name = reader
            .read_string_in_buffer(64, StringEncoding::Ascii)?
            .into_owned();

        Ok(Self {
            flavor,
            version,
            checksum,
            name,
            length,
            bones,
            sequences,
            textures,
            body_parts,
        })
    }
}
