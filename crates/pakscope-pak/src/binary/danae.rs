//! Arkane "Danae" paks: a directory table obfuscated with a rolling XOR key.
//!
//! The first u32 of the stream points at the table; the table starts with its
//! own byte length. The key stream runs continuously over the whole table,
//! including string terminators, and never resets between fields.

use pakscope_common::{BinaryReader, StringEncoding};

use super::ArchiveContext;
use crate::decompress::Codec;
use crate::entry::FileEntry;
use crate::{Error, Result};

/// Entries with this suffix are blast-compressed whatever their flag says.
const ALWAYS_COMPRESSED: &str = ".FTL";

/// Cursor over the obfuscated table that XORs bytes as it consumes them.
struct KeyedTable<'a> {
    bytes: &'a [u8],
    position: usize,
    key: &'a [u8],
    key_index: usize,
}

impl<'a> KeyedTable<'a> {
    fn new(bytes: &'a [u8], key: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            key,
            key_index: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn next_byte(&mut self) -> u8 {
        let value = self.bytes[self.position] ^ self.key[self.key_index];
        self.position += 1;
        self.key_index += 1;
        if self.key_index >= self.key.len() {
            self.key_index = 0;
        }
        value
    }

    fn read_i32(&mut self) -> Result<i32> {
        let available = self.bytes.len() - self.position;
        if available < 4 {
            return Err(pakscope_common::Error::UnexpectedEof {
                position: self.position,
                needed: 4,
                available,
            }
            .into());
        }
        let mut raw = [0u8; 4];
        for byte in &mut raw {
            *byte = self.next_byte();
        }
        Ok(i32::from_le_bytes(raw))
    }

    /// NUL-terminated ASCII; the terminator consumes a key byte too.
    fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        let mut raw = Vec::new();
        loop {
            if self.is_empty() {
                return Err(pakscope_common::Error::MissingNullTerminator(start).into());
            }
            match self.next_byte() {
                0 => break,
                byte => raw.push(byte),
            }
        }
        Ok(StringEncoding::Ascii.decode(&raw)?.replace('\\', "/"))
    }
}

pub(super) fn read(ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    let key = ctx
        .game
        .key_bytes()
        .ok_or_else(|| Error::MissingKey(ctx.game.id.clone()))?;

    let table_offset = reader.read_u32()?;
    reader.seek(u64::from(table_offset))?;
    let table_size = reader.read_u32()? as usize;
    let mut table = KeyedTable::new(reader.read_bytes(table_size)?, key);

    let mut files = Vec::new();
    while !table.is_empty() {
        let directory = table.read_string()?;
        let count = table.read_i32()?;
        for _ in 0..count.max(0) {
            let name = table.read_string()?;
            let mut entry = FileEntry {
                path: format!("{directory}{name}"),
                offset: u64::from(table.read_i32()? as u32),
                compressed: table.read_i32()? as u32,
                file_size: u64::from(table.read_i32()? as u32),
                packed_size: u64::from(table.read_i32()? as u32),
                ..Default::default()
            };
            if entry.path.ends_with(ALWAYS_COMPRESSED) {
                entry.compressed = 1;
            } else {
                entry.normalize();
            }
            files.push(entry);
        }
    }
    Ok(files)
}

pub(super) fn read_data(
    ctx: &ArchiveContext<'_>,
    reader: &mut BinaryReader<'_>,
    entry: &FileEntry,
) -> Result<Vec<u8>> {
    let packed = reader.slice(entry.offset, entry.packed_size)?;
    if entry.compressed & 1 != 0 {
        ctx.config
            .decompressor
            .decompress(Codec::Blast, packed, entry.file_size as usize)
    } else {
        Ok(packed.to_vec())
    }
}
