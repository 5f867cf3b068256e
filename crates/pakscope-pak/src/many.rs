//! Loose files on a file system presented as one archive.

use std::sync::Arc;

use tracing::info;

use crate::entry::FileEntry;
use crate::filesystem::FileSystem;
use crate::game::GameDescriptor;
use crate::object::{ObjectFactory, PakObject};
use crate::pak::{PakFile, PathIndex};
use crate::{Error, Result};

/// Each listed file is one entry whose payload is the whole file.
pub struct ManyPakFile {
    name: String,
    fs: Arc<dyn FileSystem>,
    files: Vec<FileEntry>,
    index: PathIndex,
    factory: ObjectFactory,
}

impl ManyPakFile {
    /// Catalog every file `fs` lists.
    pub fn open(game: &GameDescriptor, fs: Arc<dyn FileSystem>, name: &str) -> Result<Self> {
        let paths = fs.list()?;
        Self::with_paths(game, fs, name, paths)
    }

    /// Catalog exactly `paths`, in the order given.
    pub fn with_paths<I, S>(game: &GameDescriptor, fs: Arc<dyn FileSystem>, name: &str, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = paths
            .into_iter()
            .map(|path| {
                let path = path.into();
                let size = fs.size(&path)?;
                Ok(FileEntry::new(path, 0, size))
            })
            .collect::<Result<Vec<_>>>()?;
        info!(name, entries = files.len(), "cataloged loose files");
        Ok(Self {
            name: name.to_string(),
            index: PathIndex::new(&files),
            factory: ObjectFactory::for_engine(&game.engine),
            fs,
            files,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn entry(&self, path: &str) -> Result<&FileEntry> {
        self.get_entry(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }
}

impl PakFile for ManyPakFile {
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
        let entry = self.entry(path)?;
        self.fs
            .open(&entry.path)
            .map(|data| data.to_vec())
            .map_err(|e| e.for_entry(&entry.path))
    }

    fn load_object(&self, path: &str) -> Result<PakObject> {
        let entry = self.entry(path)?;
        let data = self.load_bytes(path)?;
        self.factory
            .decode(entry, data)
            .map_err(|e| e.for_entry(&entry.path))
    }
}
