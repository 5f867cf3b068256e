//! ZIP containers (`.zip`, `.pk3`, `.pk4`). The central directory is read by
//! the `zip` crate; payloads are sliced straight from the stream.

use std::io::Cursor;

use pakscope_common::crc::hash_bytes;
use pakscope_common::BinaryReader;
use zip::{CompressionMethod, ZipArchive};

use super::ArchiveContext;
use crate::decompress::Codec;
use crate::entry::{EntryTag, FileEntry};
use crate::{Error, Result};

const STORED: u32 = 0;
const DEFLATED: u32 = 8;
const OTHER_METHOD: u32 = u32::MAX;
const ENCRYPTED: u32 = 1;

pub(super) fn read(reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(reader.data()))?;
    let mut files = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        if file.is_dir() {
            continue;
        }
        let compressed = match file.compression() {
            CompressionMethod::Stored => STORED,
            CompressionMethod::Deflated => DEFLATED,
            _ => OTHER_METHOD,
        };
        files.push(FileEntry {
            path: file.name().replace('\\', "/"),
            offset: file.data_start(),
            file_size: file.size(),
            packed_size: file.compressed_size(),
            compressed,
            flags: if file.encrypted() { ENCRYPTED } else { 0 },
            hash: Some(u64::from(file.crc32())),
            tag: EntryTag::Zip { index },
            ..Default::default()
        });
    }
    Ok(files)
}

pub(super) fn read_data(
    ctx: &ArchiveContext<'_>,
    reader: &mut BinaryReader<'_>,
    entry: &FileEntry,
) -> Result<Vec<u8>> {
    if entry.flags & ENCRYPTED != 0 {
        return Err(Error::Unsupported(format!("encrypted zip entry {}", entry.path)));
    }
    let packed = reader.slice(entry.offset, entry.packed_size)?;
    let data = match entry.compressed {
        STORED => packed.to_vec(),
        DEFLATED => ctx
            .config
            .decompressor
            .decompress(Codec::Deflate, packed, entry.file_size as usize)?,
        _ => return Err(Error::Unsupported(format!("zip compression method of {}", entry.path))),
    };

    if let (true, Some(expected)) = (ctx.config.verify_crc, entry.hash) {
        let actual = hash_bytes(&data);
        if u64::from(actual) != expected {
            return Err(Error::ChecksumMismatch {
                what: entry.path.clone(),
                expected: format!("{expected:08x}"),
                actual: format!("{actual:08x}"),
            });
        }
    }
    Ok(data)
}
