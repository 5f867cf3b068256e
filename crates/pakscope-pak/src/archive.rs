//! A single archive file opened through one binary decoder.

use std::sync::Arc;

use hashbrown::HashMap;
use pakscope_common::BinaryReader;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::binary::{ArchiveContext, PakBinary};
use crate::config::PakConfig;
use crate::entry::{EntryTag, FileEntry, SubArchiveRef};
use crate::filesystem::{FileSystem, PakData};
use crate::game::GameDescriptor;
use crate::object::{ObjectFactory, PakObject};
use crate::pak::{PakFile, PathIndex};
use crate::{Error, Result};

/// Outcome counts of [`BinaryPakFile::read_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// An archive whose catalog was built once at open.
///
/// The catalog is immutable afterwards. Payloads are resolved on demand and
/// nested archives are opened lazily, at most once each.
pub struct BinaryPakFile {
    name: String,
    game: Arc<GameDescriptor>,
    fs: Arc<dyn FileSystem>,
    config: PakConfig,
    data: PakData,
    binary: PakBinary,
    files: Vec<FileEntry>,
    index: PathIndex,
    factory: ObjectFactory,
    /// Archives opened on the way to this one, this one last.
    chain: Vec<String>,
    children: Mutex<HashMap<usize, Arc<BinaryPakFile>>>,
}

impl std::fmt::Debug for BinaryPakFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryPakFile")
            .field("name", &self.name)
            .field("binary", &self.binary)
            .field("files", &self.files.len())
            .finish()
    }
}

impl BinaryPakFile {
    /// Open `path` from `fs`, choosing the decoder from the game and extension.
    pub fn open(
        game: Arc<GameDescriptor>,
        fs: Arc<dyn FileSystem>,
        path: &str,
        config: PakConfig,
    ) -> Result<Self> {
        let data = fs.open(path)?;
        Self::open_chained(game, fs, path.to_string(), data, config, Vec::new())
    }

    /// Open an archive over bytes already in memory. `name` drives decoder selection.
    pub fn from_data(
        game: Arc<GameDescriptor>,
        fs: Arc<dyn FileSystem>,
        name: &str,
        data: PakData,
        config: PakConfig,
    ) -> Result<Self> {
        Self::open_chained(game, fs, name.to_string(), data, config, Vec::new())
    }

    fn open_chained(
        game: Arc<GameDescriptor>,
        fs: Arc<dyn FileSystem>,
        name: String,
        data: PakData,
        config: PakConfig,
        mut chain: Vec<String>,
    ) -> Result<Self> {
        if chain.iter().any(|open| open.eq_ignore_ascii_case(&name)) {
            chain.push(name);
            return Err(Error::RecursiveArchive(chain.join(" -> ")));
        }
        chain.push(name.clone());

        let binary = PakBinary::select(&game, &name);
        let ctx = ArchiveContext {
            game: &game,
            fs: &*fs,
            path: &name,
            config: &config,
        };
        let files = binary.read(&ctx, &mut BinaryReader::new(&data))?;
        info!(archive = %name, format = binary.name(), entries = files.len(), "opened archive");

        let index = PathIndex::new(&files);
        let factory = ObjectFactory::for_engine(&game.engine);
        Ok(Self {
            name,
            game,
            fs,
            config,
            data,
            binary,
            files,
            index,
            factory,
            chain,
            children: Mutex::new(HashMap::new()),
        })
    }

    fn ctx(&self) -> ArchiveContext<'_> {
        ArchiveContext {
            game: &self.game,
            fs: &*self.fs,
            path: &self.name,
            config: &self.config,
        }
    }

    pub fn game(&self) -> &GameDescriptor {
        &self.game
    }

    pub fn binary(&self) -> &PakBinary {
        &self.binary
    }

    pub fn config(&self) -> &PakConfig {
        &self.config
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Size of the archive's own stream.
    pub fn data_len(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self, path: &str) -> Result<usize> {
        self.index
            .get(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }

    /// Resolve `entry`'s payload without wrapping failures.
    fn resolve(&self, entry: &FileEntry) -> Result<Vec<u8>> {
        if entry.in_primary_stream() && entry.offset.saturating_add(entry.packed_size) > self.data_len() {
            return Err(Error::OutOfBounds {
                path: self.name.clone(),
                offset: entry.offset,
                size: entry.packed_size,
                len: self.data_len(),
            });
        }
        let mut reader = BinaryReader::new(&self.data);
        self.binary.read_data(&self.ctx(), &mut reader, entry)
    }

    /// Payload of a catalog entry. Errors are wrapped as [`Error::Entry`].
    pub fn read_entry(&self, entry: &FileEntry) -> Result<Vec<u8>> {
        self.resolve(entry).map_err(|e| e.for_entry(&entry.path))
    }

    /// Resolve every entry in catalog order, handing each result to `f`.
    ///
    /// A failing entry never stops the walk.
    pub fn read_all<F>(&self, mut f: F) -> ReadSummary
    where
        F: FnMut(&FileEntry, Result<Vec<u8>>),
    {
        let mut summary = ReadSummary::default();
        for entry in &self.files {
            let result = self.read_entry(entry);
            match &result {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!(archive = %self.name, "{e}");
                    summary.failed += 1;
                }
            }
            f(entry, result);
        }
        summary
    }

    /// Check per-chunk checksums. Returns how many chunks were verified.
    pub fn verify_chunks(&self) -> Result<usize> {
        self.binary
            .verify_chunks(&self.ctx(), &mut BinaryReader::new(&self.data))
    }

    /// The nested archive stored at `path`, opened on first use.
    pub fn sub_archive(&self, path: &str) -> Result<Arc<BinaryPakFile>> {
        let position = self.position(path)?;
        if let Some(child) = self.children.lock().get(&position) {
            return Ok(Arc::clone(child));
        }

        let entry = &self.files[position];
        let (name, data) = match &entry.tag {
            EntryTag::SubArchive(SubArchiveRef::FromFileSystem(target)) => {
                (target.clone(), self.fs.open(target)?)
            }
            EntryTag::SubArchive(SubArchiveRef::FromEntry) => (
                format!("{}/{}", self.name, entry.path),
                PakData::from(self.read_entry(entry)?),
            ),
            _ => return Err(Error::NotAnArchive(entry.path.clone())),
        };
        debug!(parent = %self.name, child = %name, "opening sub-archive");

        let child = Arc::new(Self::open_chained(
            Arc::clone(&self.game),
            Arc::clone(&self.fs),
            name,
            data,
            self.config.clone(),
            self.chain.clone(),
        )?);
        Ok(Arc::clone(
            self.children.lock().entry(position).or_insert(child),
        ))
    }

    /// Entries holding nested archives.
    pub fn sub_archives(&self) -> impl Iterator<Item = &FileEntry> {
        self.files
            .iter()
            .filter(|e| matches!(e.tag, EntryTag::SubArchive(_)))
    }
}

impl PakFile for BinaryPakFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> Box<dyn Iterator<Item = &FileEntry> + '_> {
        Box::new(self.files.iter())
    }

    fn get_entry(&self, path: &str) -> Option<&FileEntry> {
        self.index.get(path).map(|i| &self.files[i])
    }

    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let entry = &self.files[self.position(path)?];
        self.read_entry(entry)
    }

    fn load_object(&self, path: &str) -> Result<PakObject> {
        let entry = &self.files[self.position(path)?];
        let data = self.read_entry(entry)?;
        self.factory
            .decode(entry, data)
            .map_err(|e| e.for_entry(&entry.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::testing::{master_index, quake_pak, wad2};
    use crate::filesystem::MemoryFileSystem;
    use crate::game::GameKey;

    fn open(game: GameDescriptor, fs: MemoryFileSystem, path: &str) -> Result<BinaryPakFile> {
        BinaryPakFile::open(Arc::new(game), Arc::new(fs), path, PakConfig::default())
    }

    fn quake() -> GameDescriptor {
        GameDescriptor::new("Q", "Quake")
    }

    #[test]
    fn test_load_and_lookup() {
        let fs = MemoryFileSystem::new().with(
            "id1/pak0.pak",
            quake_pak(&[("maps/E1M1.bsp", "bsp!"), ("default.cfg", "bind w +forward")]),
        );
        let pak = open(quake(), fs, "id1/pak0.pak").unwrap();

        assert_eq!(pak.name(), "id1/pak0.pak");
        assert_eq!(pak.len(), 2);
        assert!(pak.contains(r"MAPS\e1m1.BSP"));
        assert_eq!(pak.load_bytes("maps/e1m1.bsp").unwrap(), b"bsp!");
        assert!(matches!(
            pak.load_bytes("missing.txt"),
            Err(Error::EntryNotFound(_))
        ));
        assert!(matches!(
            pak.load_object("default.cfg").unwrap(),
            PakObject::Blob(_)
        ));
    }

    #[test]
    fn test_catalog_is_deterministic() {
        let fs = Arc::new(MemoryFileSystem::new().with(
            "pak0.pak",
            quake_pak(&[("b.txt", "2"), ("a.txt", "1"), ("c.txt", "3")]),
        ));
        let game = Arc::new(quake());
        let first = BinaryPakFile::open(game.clone(), fs.clone(), "pak0.pak", PakConfig::default()).unwrap();
        let second = BinaryPakFile::open(game, fs, "pak0.pak", PakConfig::default()).unwrap();
        assert_eq!(first.entries(), second.entries());
    }

    #[test]
    fn test_bad_entry_does_not_poison_others() {
        let mut data = quake_pak(&[("good.txt", "ok"), ("bad.txt", "xx"), ("also.txt", "fine")]);
        // Point bad.txt's offset past the end of the archive.
        let dir = data.len() - 64 * 2;
        data[dir + 56..dir + 60].copy_from_slice(&10_000i32.to_le_bytes());
        let pak = open(quake(), MemoryFileSystem::new().with("pak0.pak", data), "pak0.pak").unwrap();

        let mut seen = Vec::new();
        let summary = pak.read_all(|entry, result| seen.push((entry.path.clone(), result.is_ok())));
        assert_eq!(summary, ReadSummary { succeeded: 2, failed: 1 });
        assert_eq!(
            seen,
            [
                ("good.txt".to_string(), true),
                ("bad.txt".to_string(), false),
                ("also.txt".to_string(), true)
            ]
        );

        let err = pak.load_bytes("bad.txt").unwrap_err();
        assert!(err.is_entry());
        assert!(err.is_truncation());
        assert_eq!(pak.load_bytes("also.txt").unwrap(), b"fine");
    }

    #[test]
    fn test_corrupt_compressed_entry_is_isolated() {
        use byteorder::{LittleEndian as LE, WriteBytesExt};

        let mut data = vec![0u8; 4];
        data.extend_from_slice(&[0x00, 0x04, 0x82, 0x24, 0x25, 0x8f, 0x80, 0x7f]);
        data.extend_from_slice(&[0x07, 0x09, 0xff, 0xff]);
        data.extend_from_slice(b"ok");

        let mut table = vec![0u8];
        table.write_i32::<LE>(3).unwrap();
        for (name, offset, compressed, size, packed) in [
            ("good.txt", 4, 1, 13, 8),
            ("bad.txt", 12, 1, 16, 4),
            ("plain.txt", 16, 0, 2, 2),
        ] {
            table.extend_from_slice(name.as_bytes());
            table.push(0);
            for field in [offset, compressed, size, packed] {
                table.write_i32::<LE>(field).unwrap();
            }
        }
        let table_offset = data.len() as u32;
        data[..4].copy_from_slice(&table_offset.to_le_bytes());
        data.write_u32::<LE>(table.len() as u32).unwrap();
        data.extend(table.iter().map(|b| b ^ 0x5A));

        let game = GameDescriptor::new("AF", "Danae").with_key(GameKey::Bytes(vec![0x5A]));
        let pak = open(game, MemoryFileSystem::new().with("data.pak", data), "data.pak").unwrap();
        assert_eq!(pak.len(), 3);

        let mut failed = Vec::new();
        let summary = pak.read_all(|entry, result| {
            if result.is_err() {
                failed.push(entry.path.clone());
            }
        });
        assert_eq!(summary, ReadSummary { succeeded: 2, failed: 1 });
        assert_eq!(failed, ["bad.txt"]);

        let err = pak.load_bytes("bad.txt").unwrap_err();
        assert!(err.is_entry());
        assert!(matches!(err.root(), Error::Decompression(_)));
        assert_eq!(pak.load_bytes("good.txt").unwrap(), b"AIAIAIAIAIAIA");
        assert_eq!(pak.load_bytes("plain.txt").unwrap(), b"ok");
    }

    #[test]
    fn test_nested_wad_opens_lazily_once() {
        let wad = wad2(&[("sky1", 0x44, 0, "sky"), ("conback", 0x44, 0, "back")]);
        let wad = String::from_utf8(wad).unwrap();
        let fs = MemoryFileSystem::new().with("pak0.pak", quake_pak(&[("gfx/base.wad", &wad)]));
        let pak = open(quake(), fs, "pak0.pak").unwrap();

        assert_eq!(pak.sub_archives().count(), 1);
        let child = pak.sub_archive("gfx/base.wad").unwrap();
        assert_eq!(child.name(), "pak0.pak/gfx/base.wad");
        assert_eq!(child.binary(), &PakBinary::Wad2);
        assert_eq!(child.load_bytes("sky1.tex").unwrap(), b"sky");

        let again = pak.sub_archive("GFX/BASE.WAD").unwrap();
        assert!(Arc::ptr_eq(&child, &again));
    }

    #[test]
    fn test_plain_entry_is_not_an_archive() {
        let fs = MemoryFileSystem::new().with("pak0.pak", quake_pak(&[("a.txt", "a")]));
        let pak = open(quake(), fs, "pak0.pak").unwrap();
        assert!(matches!(pak.sub_archive("a.txt"), Err(Error::NotAnArchive(_))));
    }

    #[test]
    fn test_master_index_children_and_cycle() {
        let fs = MemoryFileSystem::new()
            .with("data/master.index", master_index(&["master.index"], &[]));
        let pak = open(GameDescriptor::new("D", "Void"), fs, "data/master.index").unwrap();
        assert_eq!(pak.len(), 1);

        let err = pak.sub_archive("master.index").unwrap_err();
        assert!(
            matches!(err, Error::RecursiveArchive(ref chain) if chain == "data/master.index -> data/master.index"),
            "{err}"
        );
    }

    #[test]
    fn test_catalog_failure_is_fatal() {
        // Table pointer is fine but the declared table size runs past the end.
        let fs = MemoryFileSystem::new().with("data.pak", vec![4, 0, 0, 0, 0xFF, 0, 0, 0]);
        let game = GameDescriptor::new("AF", "Danae").with_key(GameKey::Bytes(vec![1]));
        let err = open(game, fs, "data.pak").unwrap_err();
        assert!(!err.is_entry());
        assert!(err.is_truncation());
    }
}
