//! Void engine and Bullfrog resource indices.
//!
//! `master.index` lists per-area `.index` files, each opened lazily as its own
//! archive. An `.index` file catalogs payloads stored in its sibling
//! `.resources` file or in a shared resource pool.

use pakscope_common::{BinaryReader, StringEncoding};
use tracing::debug;
use zerocopy::byteorder::{BigEndian, U16, U32, U64};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use super::ArchiveContext;
use crate::decompress::Codec;
use crate::entry::{EntryTag, FileEntry, SubArchiveRef};
use crate::filesystem::sibling;
use crate::{Error, Result};

pub const MASTER_INDEX: &str = "master.index";

/// Shared pool candidates, probed in order at the file-system root.
pub const SHARED_RESOURCES: [&str; 4] = [
    "shared_2_3.sharedrsc",
    "shared_2_3_4.sharedrsc",
    "shared_1_2_3.sharedrsc",
    "shared_1_2_3_4.sharedrsc",
];

pub(crate) const MASTER_MAGIC: u32 = 0x0453_4552;
pub(crate) const SUB_MARKER: u32 = 0x1800_0000;
pub(crate) const END_MARKER: u32 = 0x0100_0000;

const SHARED_FLAG: u32 = 0x20;
const SHARED_FLAG2: u16 = 0x8000;

/// Which engine's record layout an index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexVariant {
    Void,
    Bullfrog,
}

/// Big-endian 26-byte record trailing each index entry. Void declares it as
/// `offset, 4 x u32, u16`, Bullfrog field by field; the bytes are the same.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct ResourceRecord {
    offset: U64<BigEndian>,
    file_size: U32<BigEndian>,
    packed_size: U32<BigEndian>,
    _unknown: U32<BigEndian>,
    flags: U32<BigEndian>,
    flags2: U16<BigEndian>,
}

impl IndexVariant {
    fn read_record(self, reader: &mut BinaryReader<'_>) -> Result<ResourceRecord> {
        match self {
            IndexVariant::Void | IndexVariant::Bullfrog => Ok(reader.read_struct::<ResourceRecord>()?),
        }
    }
}

pub(super) fn read(
    variant: IndexVariant,
    ctx: &ArchiveContext<'_>,
    reader: &mut BinaryReader<'_>,
) -> Result<Vec<FileEntry>> {
    let name = ctx.file_name();
    if name.eq_ignore_ascii_case(MASTER_INDEX) {
        return read_master(ctx, reader);
    }
    let Some(stem) = name.len().checked_sub(".index".len()).and_then(|at| {
        let (stem, ext) = (name.get(..at)?, name.get(at..)?);
        ext.eq_ignore_ascii_case(".index").then_some(stem)
    }) else {
        return Err(Error::InvalidArchive {
            format: "index",
            reason: format!("{} must be a .index file", ctx.path),
        });
    };
    read_index(variant, ctx, reader, stem)
}

fn read_master(ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    let magic = reader.read_u32_be()?;
    if magic != MASTER_MAGIC {
        return Err(Error::InvalidMagic {
            format: "master index",
            expected: MASTER_MAGIC,
            actual: magic,
        });
    }
    reader.skip(4)?;

    let mut files = Vec::new();
    let mut first = true;
    loop {
        let mut size = reader.read_u32()?;
        if size == SUB_MARKER {
            first = false;
            size = reader.read_u32()?;
        } else if size == END_MARKER {
            break;
        }
        let path = reader
            .read_string(size as usize, StringEncoding::Ascii)?
            .replace('\\', "/");
        let pack_id = if first { 0 } else { reader.read_u16()? };
        if !path.ends_with(".index") {
            continue;
        }
        let target = sibling(ctx.path, &path);
        let size = ctx.fs.size(&target).unwrap_or(0);
        files.push(FileEntry {
            path,
            file_size: size,
            packed_size: size,
            id: Some(u32::from(pack_id)),
            tag: EntryTag::SubArchive(SubArchiveRef::FromFileSystem(target)),
            ..Default::default()
        });
    }
    Ok(files)
}

fn read_index(
    variant: IndexVariant,
    ctx: &ArchiveContext<'_>,
    reader: &mut BinaryReader<'_>,
    stem: &str,
) -> Result<Vec<FileEntry>> {
    let resources = sibling(ctx.path, &format!("{stem}.resources"));
    if !ctx.fs.exists(&resources) {
        return Err(Error::MissingDependency {
            archive: ctx.path.to_string(),
            path: resources,
        });
    }
    let shared = SHARED_RESOURCES.iter().find(|path| ctx.fs.exists(path)).copied();
    debug!(index = ctx.path, %resources, ?shared, "resolved resource files");

    reader.seek(4)?;
    let _main_size = reader.read_u32_be()?;
    reader.skip(24)?;
    let count = reader.read_u32_be()?;

    let mut files = Vec::new();
    for _ in 0..count {
        let id = reader.read_u32_be()?;
        let tag1 = reader.read_l32_string(StringEncoding::Ascii)?.into_owned();
        let tag2 = reader.read_l32_string(StringEncoding::Ascii)?.into_owned();
        let path = reader
            .read_l32_string(StringEncoding::Ascii)?
            .replace('\\', "/");
        let record = variant.read_record(reader)?;

        let use_shared = record.flags.get() & SHARED_FLAG != 0 && record.flags2.get() == SHARED_FLAG2;
        let source = if use_shared {
            shared.map(str::to_string).ok_or_else(|| Error::MissingDependency {
                archive: ctx.path.to_string(),
                path: SHARED_RESOURCES.join(" | "),
            })?
        } else {
            resources.clone()
        };

        let (file_size, packed_size) = (record.file_size.get(), record.packed_size.get());
        files.push(FileEntry {
            path,
            offset: record.offset.get(),
            file_size: u64::from(file_size),
            packed_size: u64::from(packed_size),
            compressed: u32::from(file_size != packed_size),
            flags: record.flags.get(),
            id: Some(id),
            tag: EntryTag::Resource {
                path: source,
                tag1,
                tag2,
            },
            ..Default::default()
        });
    }
    Ok(files)
}

pub(super) fn read_data(ctx: &ArchiveContext<'_>, entry: &FileEntry) -> Result<Vec<u8>> {
    match &entry.tag {
        EntryTag::Resource { path, .. } => {
            let data = ctx.fs.open(path)?;
            let packed = BinaryReader::new(&data)
                .slice(entry.offset, entry.packed_size)
                .map_err(|_| Error::OutOfBounds {
                    path: path.clone(),
                    offset: entry.offset,
                    size: entry.packed_size,
                    len: data.len() as u64,
                })?;
            if entry.compressed == 0 {
                return Ok(packed.to_vec());
            }
            ctx.config
                .decompressor
                .decompress(Codec::sniff_deflate(packed), packed, entry.file_size as usize)
        }
        EntryTag::SubArchive(SubArchiveRef::FromFileSystem(path)) => Ok(ctx.fs.open(path)?.to_vec()),
        _ => Err(Error::InvalidArchive {
            format: "index",
            reason: format!("{} has no resource routing", entry.path),
        }),
    }
}
