//! Directory decoders, one per archive family.
//!
//! [`PakBinary::select`] picks a decoder once per archive from the game's
//! engine tag and the archive's extension. [`PakBinary::read`] builds the
//! whole catalog or fails; [`PakBinary::read_data`] resolves one entry.

mod bsp;
mod danae;
mod index;
mod quake;
mod raw;
mod vpk;
mod wad;
mod zip;

use pakscope_common::BinaryReader;
use tracing::debug;

use crate::config::PakConfig;
use crate::entry::FileEntry;
use crate::filesystem::FileSystem;
use crate::game::{Engine, GameDescriptor};
use crate::{Error, Result};

pub use bsp::{BspLump, BSP_LUMP_NAMES};
pub use index::{IndexVariant, MASTER_INDEX, SHARED_RESOURCES};
pub use vpk::{VpkHeader, VPK_MAGIC};
pub use wad::wad3_extension;

/// Everything a decoder may consult besides the stream itself.
#[derive(Clone, Copy)]
pub struct ArchiveContext<'a> {
    pub game: &'a GameDescriptor,
    pub fs: &'a dyn FileSystem,
    /// Archive path relative to `fs`.
    pub path: &'a str,
    pub config: &'a PakConfig,
}

impl ArchiveContext<'_> {
    /// Last path component of the archive.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }
}

pub(crate) fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Archive decoder families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PakBinary {
    /// XOR-obfuscated directory table (Danae).
    ObfuscatedTable,
    /// `.index` / `.resources` pairs and `master.index` (Void, Bullfrog).
    ResourceIndex(IndexVariant),
    /// Valve pack file, versions 1 and 2.
    Vpk,
    /// GoldSrc texture WAD.
    Wad3,
    /// Quake texture WAD.
    Wad2,
    /// Quake `PACK` file.
    QuakePak,
    /// GoldSrc/Quake map lumps.
    Bsp30,
    Zip,
    /// Whole stream exposed as one entry.
    Raw,
    /// Recognised family without a decoder.
    Unsupported(String),
}

impl PakBinary {
    /// Choose the decoder for `path` opened as part of `game`.
    pub fn select(game: &GameDescriptor, path: &str) -> Self {
        let ext = extension_of(path);
        let binary = match ext.as_str() {
            "bsp" => PakBinary::Bsp30,
            "zip" | "pk3" | "pk4" => PakBinary::Zip,
            _ => Self::select_by_engine(game, &ext),
        };
        debug!(game = %game.id, engine = %game.engine, path, ?binary, "selected decoder");
        binary
    }

    fn select_by_engine(game: &GameDescriptor, ext: &str) -> Self {
        match &game.engine {
            Engine::Danae => PakBinary::ObfuscatedTable,
            Engine::Void => PakBinary::ResourceIndex(IndexVariant::Void),
            Engine::Bullfrog => match game.id.as_str() {
                "DK" | "DK2" | "MC" | "MC2" | "TP" | "TH" => PakBinary::ResourceIndex(IndexVariant::Bullfrog),
                "P" | "P2" | "P3" => PakBinary::Unsupported("Populous archives".to_string()),
                "S" | "S2" => PakBinary::Unsupported("Syndicate archives".to_string()),
                other => PakBinary::Unsupported(format!("Bullfrog game {other}")),
            },
            Engine::Source | Engine::Source2 => PakBinary::Vpk,
            Engine::GoldSrc => match ext {
                "pak" => PakBinary::QuakePak,
                _ => PakBinary::Wad3,
            },
            Engine::Quake => match ext {
                "wad" => PakBinary::Wad2,
                _ => PakBinary::QuakePak,
            },
            Engine::Origin => PakBinary::Unsupported("Origin (Ultima) archives".to_string()),
            Engine::Zip => PakBinary::Zip,
            Engine::Other(_) => PakBinary::Raw,
        }
    }

    /// Build the catalog. Any error means the archive cannot be opened.
    pub fn read(&self, ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Result<Vec<FileEntry>> {
        let files = match self {
            PakBinary::ObfuscatedTable => danae::read(ctx, reader)?,
            PakBinary::ResourceIndex(variant) => index::read(*variant, ctx, reader)?,
            PakBinary::Vpk => vpk::read(ctx, reader)?,
            PakBinary::Wad3 => wad::read_wad3(reader)?,
            PakBinary::Wad2 => wad::read_wad2(reader)?,
            PakBinary::QuakePak => quake::read(reader)?,
            PakBinary::Bsp30 => bsp::read(ctx, reader)?,
            PakBinary::Zip => zip::read(reader)?,
            PakBinary::Raw => raw::read(ctx, reader),
            PakBinary::Unsupported(what) => return Err(Error::Unsupported(what.clone())),
        };
        debug!(path = ctx.path, count = files.len(), "catalog built");
        Ok(files)
    }

    /// Resolve one entry to its decompressed payload.
    pub fn read_data(
        &self,
        ctx: &ArchiveContext<'_>,
        reader: &mut BinaryReader<'_>,
        entry: &FileEntry,
    ) -> Result<Vec<u8>> {
        match self {
            PakBinary::ObfuscatedTable => danae::read_data(ctx, reader, entry),
            PakBinary::ResourceIndex(_) => index::read_data(ctx, entry),
            PakBinary::Vpk => vpk::read_data(ctx, reader, entry),
            PakBinary::Wad3 | PakBinary::Wad2 => wad::read_data(reader, entry),
            PakBinary::Zip => zip::read_data(ctx, reader, entry),
            PakBinary::QuakePak | PakBinary::Bsp30 | PakBinary::Raw => read_stored(reader, entry),
            PakBinary::Unsupported(what) => Err(Error::Unsupported(what.clone())),
        }
    }

    /// Check every archive-MD5 chunk. Only VPK carries them; other families succeed trivially.
    pub fn verify_chunks(&self, ctx: &ArchiveContext<'_>, reader: &mut BinaryReader<'_>) -> Result<usize> {
        match self {
            PakBinary::Vpk => vpk::verify_chunks(ctx, reader),
            _ => Ok(0),
        }
    }

    /// Name used in messages.
    pub fn name(&self) -> &str {
        match self {
            PakBinary::ObfuscatedTable => "obfuscated table",
            PakBinary::ResourceIndex(IndexVariant::Void) => "Void index",
            PakBinary::ResourceIndex(IndexVariant::Bullfrog) => "Bullfrog index",
            PakBinary::Vpk => "VPK",
            PakBinary::Wad3 => "WAD3",
            PakBinary::Wad2 => "WAD2",
            PakBinary::QuakePak => "PAK",
            PakBinary::Bsp30 => "BSP",
            PakBinary::Zip => "ZIP",
            PakBinary::Raw => "raw",
            PakBinary::Unsupported(what) => what,
        }
    }
}

/// Copy `packed_size` bytes at `offset` unchanged.
pub(crate) fn read_stored(reader: &mut BinaryReader<'_>, entry: &FileEntry) -> Result<Vec<u8>> {
    Ok(reader.slice(entry.offset, entry.packed_size)?.to_vec())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: &str, engine: &str) -> GameDescriptor {
        GameDescriptor::new(id, engine)
    }

    #[test]
    fn test_select_by_extension_first() {
        assert_eq!(PakBinary::select(&game("HL", "GoldSrc"), "maps/c1a0.bsp"), PakBinary::Bsp30);
        assert_eq!(PakBinary::select(&game("HL", "GoldSrc"), "halflife.wad"), PakBinary::Wad3);
        assert_eq!(PakBinary::select(&game("Q3", "Quake"), "pak0.pk3"), PakBinary::Zip);
    }

    #[test]
    fn test_select_by_engine() {
        assert_eq!(PakBinary::select(&game("AF", "Danae"), "data.pak"), PakBinary::ObfuscatedTable);
        assert_eq!(
            PakBinary::select(&game("D", "Void"), "master.index"),
            PakBinary::ResourceIndex(IndexVariant::Void)
        );
        assert_eq!(
            PakBinary::select(&game("DK2", "Bullfrog"), "x.index"),
            PakBinary::ResourceIndex(IndexVariant::Bullfrog)
        );
        assert_eq!(PakBinary::select(&game("HL2", "Source"), "pak01_dir.vpk"), PakBinary::Vpk);
        assert_eq!(PakBinary::select(&game("Q", "Quake"), "pak0.pak"), PakBinary::QuakePak);
        assert_eq!(PakBinary::select(&game("Q", "Quake"), "gfx.wad"), PakBinary::Wad2);
        assert_eq!(PakBinary::select(&game("HL", "GoldSrc"), "valve/pak0.pak"), PakBinary::QuakePak);
        assert_eq!(PakBinary::select(&game("X", "Unknown"), "blob.bin"), PakBinary::Raw);
    }

    #[test]
    fn test_stubbed_families_fail_loudly() {
        for (id, engine) in [("P2", "Bullfrog"), ("S", "Bullfrog"), ("U8", "Origin")] {
            let binary = PakBinary::select(&game(id, engine), "data.dat");
            assert!(matches!(binary, PakBinary::Unsupported(_)), "{id}");

            let fixture = testing::Fixture::new(
                game(id, engine),
                crate::filesystem::MemoryFileSystem::new().with("data.dat", vec![0u8; 16]),
            );
            let err = fixture.read(&binary, "data.dat").unwrap_err();
            assert!(err.is_unsupported());
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("dir.v1/Archive.VPK"), "vpk");
        assert_eq!(extension_of("dir.v1/README"), "");
    }
}
