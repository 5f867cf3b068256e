//! Fallback for archives no decoder claims: the stream is one opaque entry.

use pakscope_common::BinaryReader;

use super::ArchiveContext;
use crate::entry::FileEntry;

pub(super) fn read(ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Vec<FileEntry> {
    vec![FileEntry::new(ctx.file_name(), 0, reader.len() as u64)]
}
