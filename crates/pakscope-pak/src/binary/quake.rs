//! Quake `PACK` files.

use pakscope_common::{BinaryReader, StringEncoding};
use zerocopy::byteorder::{LittleEndian, I32, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::entry::{EntryTag, FileEntry, SubArchiveRef};
use crate::{Error, Result};

pub(crate) const PAK_MAGIC: u32 = 0x4B43_4150;

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct PakHeader {
    magic: U32<LittleEndian>,
    dir_offset: I32<LittleEndian>,
    dir_length: I32<LittleEndian>,
}

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct PakRecord {
    path: [u8; 56],
    offset: I32<LittleEndian>,
    size: I32<LittleEndian>,
}

pub(super) fn read(reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    let header: PakHeader = reader.read_struct()?;
    if header.magic.get() != PAK_MAGIC {
        return Err(Error::InvalidMagic {
            format: "PAK",
            expected: PAK_MAGIC,
            actual: header.magic.get(),
        });
    }
    let (Ok(dir_offset), Ok(dir_length)) = (
        u64::try_from(header.dir_offset.get()),
        usize::try_from(header.dir_length.get()),
    ) else {
        return Err(Error::InvalidArchive {
            format: "PAK",
            reason: "negative directory offset or length".to_string(),
        });
    };
    reader.seek(dir_offset)?;
    let records: Vec<PakRecord> = reader.read_struct_array(dir_length / std::mem::size_of::<PakRecord>())?;

    records
        .iter()
        .map(|record| -> Result<FileEntry> {
            let mut name = BinaryReader::new(&record.path);
            let path = name
                .read_string_in_buffer(record.path.len(), StringEncoding::Ascii)?
                .replace('\\', "/");
            let mut entry = FileEntry::new(
                path,
                u64::from(record.offset.get() as u32),
                u64::from(record.size.get() as u32),
            );
            if entry.extension() == "wad" {
                entry.tag = EntryTag::SubArchive(SubArchiveRef::FromEntry);
            }
            Ok(entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::testing::{quake_pak as pak, Fixture};
    use crate::binary::PakBinary;
    use crate::filesystem::MemoryFileSystem;
    use crate::game::GameDescriptor;

    #[test]
    fn test_record_size() {
        assert_eq!(std::mem::size_of::<PakRecord>(), 64);
    }

    #[test]
    fn test_catalog() {
        let data = pak(&[("maps/e1m1.bsp", "bsp!"), (r"gfx\base.wad", "WAD2"), ("default.cfg", "bind")]);
        let f = Fixture::new(GameDescriptor::new("Q", "Quake"), MemoryFileSystem::new().with("id1/pak0.pak", data));

        let files = f.read(&PakBinary::QuakePak, "id1/pak0.pak").unwrap();
        let paths: Vec<_> = files.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["maps/e1m1.bsp", "gfx/base.wad", "default.cfg"]);
        assert_eq!(files[1].tag, EntryTag::SubArchive(SubArchiveRef::FromEntry));
        assert_eq!(files[0].tag, EntryTag::None);

        let bytes = f.read_data(&PakBinary::QuakePak, "id1/pak0.pak", &files[2]).unwrap();
        assert_eq!(bytes, b"bind");
    }

    #[test]
    fn test_bad_magic() {
        let mut data = pak(&[]);
        data[0] = b'Q';
        let f = Fixture::new(GameDescriptor::new("Q", "Quake"), MemoryFileSystem::new().with("pak0.pak", data));
        assert!(matches!(
            f.read(&PakBinary::QuakePak, "pak0.pak"),
            Err(Error::InvalidMagic { format: "PAK", .. })
        ));
    }
}
