//! Catalog entries.

use std::path::Path;

/// Where a nested archive's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubArchiveRef {
    /// A sibling file reached through the file system (master index children).
    FromFileSystem(String),
    /// The entry's own payload is the nested archive.
    FromEntry,
}

/// Where a VPK entry's payload lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpkLocation {
    /// Appended after the tree in this file; the entry offset is absolute.
    Inline,
    /// In the numbered sibling `<base>_<archive>.vpk`.
    External { archive: u16 },
}

/// Per-decoder routing data carried by an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntryTag {
    #[default]
    None,
    /// Payload lives in a resource file; `path` is relative to the archive's directory.
    Resource {
        path: String,
        tag1: String,
        tag2: String,
    },
    SubArchive(SubArchiveRef),
    Vpk(VpkLocation),
    /// Index into the zip central directory.
    Zip { index: usize },
    /// Miptex extracted from a BSP textures lump.
    BspTexture,
}

/// One logical file inside an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    /// Forward-slash path, unique within one archive.
    pub path: String,
    /// Byte offset in the owning stream.
    pub offset: u64,
    /// Decompressed size.
    pub file_size: u64,
    /// Stored size.
    pub packed_size: u64,
    /// Decoder-specific compression flags; bit 0 selects blast for the obfuscated table.
    pub compressed: u32,
    pub flags: u32,
    pub id: Option<u32>,
    pub hash: Option<u64>,
    /// Bytes stored inline in the directory, prepended to the payload.
    pub preload: Vec<u8>,
    pub tag: EntryTag,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            file_size: size,
            packed_size: size,
            ..Default::default()
        }
    }

    /// Uncompressed entries report their stored size.
    pub fn normalize(&mut self) {
        if self.compressed == 0 {
            self.file_size = self.packed_size;
        }
    }

    /// Lower-cased extension without the dot, or empty.
    pub fn extension(&self) -> String {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    /// File name component of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Whether the payload is read from the archive's own stream.
    pub fn in_primary_stream(&self) -> bool {
        matches!(
            self.tag,
            EntryTag::None | EntryTag::BspTexture | EntryTag::Vpk(VpkLocation::Inline) | EntryTag::Zip { .. }
        ) || matches!(self.tag, EntryTag::SubArchive(SubArchiveRef::FromEntry))
    }
}

/// Case-folded lookup key: `\` becomes `/`, ASCII lower-cased.
pub fn fold_path(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}
