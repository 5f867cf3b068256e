//! GoldSrc (version 30) and Quake (version 29) map files exposed as lumps.

use pakscope_common::{BinaryReader, StringEncoding};
use zerocopy::byteorder::{LittleEndian, I32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use super::ArchiveContext;
use crate::entry::{EntryTag, FileEntry};
use crate::{Error, Result};

/// Synthetic file name of each header lump, in header order.
pub const BSP_LUMP_NAMES: [&str; 15] = [
    "entities.txt",
    "planes.dat",
    "textures.dat",
    "vertices.dat",
    "visibility.dat",
    "nodes.dat",
    "texInfo.dat",
    "faces.dat",
    "lighting.dat",
    "clipNodes.dat",
    "leaves.dat",
    "markSurfaces.dat",
    "edges.dat",
    "surfEdges.dat",
    "models.dat",
];

const TEXTURES: usize = 2;
const MODELS: usize = 14;
/// `dmodel_t`: bounds, origin, four hull heads, visleafs, first face, face count.
const MODEL_RECORD_SIZE: u64 = 64;
const MISSING_TEXTURE: u32 = u32::MAX;
/// Blue Shift writes planes before entities.
const BLUE_SHIFT: &str = "HL:BS";

/// One `(offset, length)` pair of the header.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct BspLump {
    pub offset: I32<LittleEndian>,
    pub length: I32<LittleEndian>,
}

impl BspLump {
    fn range(&self, name: &str) -> Result<(u64, u64)> {
        match (u64::try_from(self.offset.get()), u64::try_from(self.length.get())) {
            (Ok(offset), Ok(length)) => Ok((offset, length)),
            _ => Err(Error::InvalidArchive {
                format: "BSP",
                reason: format!("negative offset or length for {name}"),
            }),
        }
    }
}

pub(super) fn read(ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    let version = reader.read_i32()?;
    if version != 29 && version != 30 {
        return Err(Error::UnsupportedVersion {
            format: "BSP",
            version: version as u32,
        });
    }
    let mut lumps: Vec<BspLump> = reader.read_struct_array(BSP_LUMP_NAMES.len())?;
    if ctx.game.id == BLUE_SHIFT {
        lumps.swap(0, 1);
    }

    let mut files = Vec::with_capacity(lumps.len());
    for (lump, name) in lumps.iter().zip(BSP_LUMP_NAMES) {
        let (offset, length) = lump.range(name)?;
        files.push(FileEntry::new(name, offset, length));
    }

    let (offset, length) = lumps[TEXTURES].range(BSP_LUMP_NAMES[TEXTURES])?;
    if length >= 4 {
        files.extend(read_miptex_directory(reader.slice(offset, length)?, offset)?);
    }

    // An out-of-range models lump stays a per-entry failure of models.dat.
    let (offset, length) = lumps[MODELS].range(BSP_LUMP_NAMES[MODELS])?;
    if reader.slice(offset, length).is_ok() {
        for (index, start) in (offset..offset + length - length % MODEL_RECORD_SIZE)
            .step_by(MODEL_RECORD_SIZE as usize)
            .enumerate()
        {
            files.push(FileEntry::new(format!("models/model{index}.dat"), start, MODEL_RECORD_SIZE));
        }
    }
    Ok(files)
}

/// Each embedded miptex of the textures lump as `textures/<name>.tex`.
fn read_miptex_directory(lump: &[u8], lump_offset: u64) -> Result<Vec<FileEntry>> {
    let mut reader = BinaryReader::new(lump);
    let count = reader.read_u32()? as usize;
    let offsets: Vec<u32> = (0..count)
        .map(|_| reader.read_u32())
        .collect::<std::result::Result<_, _>>()?;

    let mut sorted: Vec<u32> = offsets.iter().copied().filter(|&o| o != MISSING_TEXTURE).collect();
    sorted.sort_unstable();

    let mut files = Vec::with_capacity(sorted.len());
    for &start in offsets.iter().filter(|&&o| o != MISSING_TEXTURE) {
        let end = sorted
            .iter()
            .copied()
            .find(|&o| o > start)
            .map_or(lump.len() as u64, u64::from);
        reader.seek(u64::from(start))?;
        let name = reader.read_string_in_buffer(16, StringEncoding::Ascii)?;
        let mut entry = FileEntry::new(
            format!("textures/{name}.tex"),
            lump_offset + u64::from(start),
            end.saturating_sub(u64::from(start)),
        );
        entry.tag = EntryTag::BspTexture;
        files.push(entry);
    }
    Ok(files)
}
