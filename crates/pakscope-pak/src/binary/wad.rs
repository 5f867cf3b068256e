//! Texture WADs: GoldSrc `WAD3` and Quake `WAD2`.

use pakscope_common::{BinaryReader, StringEncoding};
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::entry::FileEntry;
use crate::{Error, Result};

pub(crate) const WAD3_MAGIC: u32 = 0x3344_4157;
pub(crate) const WAD2_MAGIC: u32 = 0x3244_4157;

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct WadHeader {
    magic: U32<LittleEndian>,
    lump_count: U32<LittleEndian>,
    lump_offset: U32<LittleEndian>,
}

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct WadLump {
    offset: U32<LittleEndian>,
    disk_size: U32<LittleEndian>,
    size: U32<LittleEndian>,
    kind: u8,
    compression: u8,
    _padding: U16<LittleEndian>,
    name: [u8; 16],
}

impl WadLump {
    fn name(&self) -> Result<String> {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        Ok(StringEncoding::Ascii.decode(&self.name[..end])?.into_owned())
    }

    fn entry(&self, path: String) -> FileEntry {
        FileEntry {
            path,
            offset: u64::from(self.offset.get()),
            file_size: u64::from(self.size.get()),
            packed_size: u64::from(self.disk_size.get()),
            compressed: u32::from(self.compression),
            flags: u32::from(self.kind),
            ..Default::default()
        }
    }
}

/// Synthetic extension for a WAD3 lump type.
pub fn wad3_extension(kind: u8) -> String {
    match kind {
        0x40 => "tex2".to_string(),
        0x42 => "pic".to_string(),
        0x43 => "tex".to_string(),
        0x46 => "fnt".to_string(),
        other => format!("{other:x}"),
    }
}

fn read_lumps(reader: &mut BinaryReader<'_>, format: &'static str, magic: u32) -> Result<Vec<WadLump>> {
    let header: WadHeader = reader.read_struct()?;
    if header.magic.get() != magic {
        return Err(Error::InvalidMagic {
            format,
            expected: magic,
            actual: header.magic.get(),
        });
    }
    reader.seek(u64::from(header.lump_offset.get()))?;
    Ok(reader.read_struct_array(header.lump_count.get() as usize)?)
}

pub(super) fn read_wad3(reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    read_lumps(reader, "WAD3", WAD3_MAGIC)?
        .iter()
        .map(|lump| -> Result<FileEntry> {
            Ok(lump.entry(format!("{}.{}", lump.name()?, wad3_extension(lump.kind))))
        })
        .collect()
}

pub(super) fn read_wad2(reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
    read_lumps(reader, "WAD2", WAD2_MAGIC)?
        .iter()
        .map(|lump| -> Result<FileEntry> {
            let mut entry = lump.entry(format!("{}.tex", lump.name()?));
            entry.hash = Some(u64::from(lump.kind));
            Ok(entry)
        })
        .collect()
}

pub(super) fn read_data(reader: &mut BinaryReader<'_>, entry: &FileEntry) -> Result<Vec<u8>> {
    if entry.compressed != 0 {
        return Err(Error::Unsupported(format!(
            "compressed WAD lump {} (method {})",
            entry.path, entry.compressed
        )));
    }
    super::read_stored(reader, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::testing::{wad, Fixture};
    use crate::binary::PakBinary;
    use crate::filesystem::MemoryFileSystem;
    use crate::game::GameDescriptor;

    fn fixture(path: &str, data: Vec<u8>) -> Fixture {
        Fixture::new(GameDescriptor::new("HL", "GoldSrc"), MemoryFileSystem::new().with(path, data))
    }

    #[test]
    fn test_lump_size() {
        assert_eq!(std::mem::size_of::<WadLump>(), 32);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(wad3_extension(0x43), "tex");
        assert_eq!(wad3_extension(0x46), "fnt");
        assert_eq!(wad3_extension(0x40), "tex2");
        assert_eq!(wad3_extension(0x42), "pic");
        assert_eq!(wad3_extension(0x07), "7");
        assert_eq!(wad3_extension(0xAB), "ab");
    }

    #[test]
    fn test_wad3_catalog_and_payloads() {
        let data = wad(
            WAD3_MAGIC,
            &[
                ("{fence", 0x43, 0, "texture"),
                ("conchars", 0x46, 0, "font"),
                ("mystery", 0x99, 0, "?"),
                ("packed", 0x43, 1, "zz"),
            ],
        );
        let f = fixture("halflife.wad", data);
        let files = f.read(&PakBinary::Wad3, "halflife.wad").unwrap();
        let paths: Vec<_> = files.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["{fence.tex", "conchars.fnt", "mystery.99", "packed.tex"]);

        let bytes = f.read_data(&PakBinary::Wad3, "halflife.wad", &files[1]).unwrap();
        assert_eq!(bytes, b"font");
        let err = f.read_data(&PakBinary::Wad3, "halflife.wad", &files[3]).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_wad2_paths_and_hash() {
        let data = wad(WAD2_MAGIC, &[("sky1", 0x44, 0, "sky"), ("palette", 0x40, 0, "pal")]);
        let f = fixture("gfx.wad", data);
        let files = f.read(&PakBinary::Wad2, "gfx.wad").unwrap();
        assert_eq!(files[0].path, "sky1.tex");
        assert_eq!(files[1].path, "palette.tex");
        assert_eq!(files[0].hash, Some(0x44));
    }

    #[test]
    fn test_wrong_magic() {
        let data = wad(WAD2_MAGIC, &[]);
        let err = fixture("x.wad", data).read(&PakBinary::Wad3, "x.wad").unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { format: "WAD3", .. }));
    }

    #[test]
    fn test_truncated_directory() {
        let mut data = wad(WAD3_MAGIC, &[("a", 0x43, 0, "1"), ("b", 0x43, 0, "2")]);
        data.truncate(data.len() - 10);
        let err = fixture("x.wad", data).read(&PakBinary::Wad3, "x.wad").unwrap_err();
        assert!(err.is_truncation());
    }
}
