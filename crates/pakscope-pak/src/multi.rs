//! An ordered group of archives searched as one.

use std::sync::Arc;

use crate::entry::FileEntry;
use crate::object::PakObject;
use crate::pak::PakFile;
use crate::{Error, Result};

/// Children are searched in order; the first one holding a path wins.
pub struct MultiPakFile {
    name: String,
    paks: Vec<Arc<dyn PakFile>>,
}

impl MultiPakFile {
    pub fn new(name: impl Into<String>, paks: Vec<Arc<dyn PakFile>>) -> Self {
        Self {
            name: name.into(),
            paks,
        }
    }

    pub fn paks(&self) -> &[Arc<dyn PakFile>] {
        &self.paks
    }

    /// The child that resolves `path`.
    pub fn owner(&self, path: &str) -> Option<&Arc<dyn PakFile>> {
        self.paks.iter().find(|pak| pak.contains(path))
    }

    /// Every entry paired with the index of the child holding it.
    pub fn entries_with_origin(&self) -> impl Iterator<Item = (usize, &FileEntry)> {
        self.paks
            .iter()
            .enumerate()
            .flat_map(|(i, pak)| pak.files().map(move |entry| (i, entry)))
    }

    fn require(&self, path: &str) -> Result<&Arc<dyn PakFile>> {
        self.owner(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }
}

impl PakFile for MultiPakFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> Box<dyn Iterator<Item = &FileEntry> + '_> {
        Box::new(self.paks.iter().flat_map(|pak| pak.files()))
    }

    fn get_entry(&self, path: &str) -> Option<&FileEntry> {
        self.paks.iter().find_map(|pak| pak.get_entry(path))
    }

    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.require(path)?.load_bytes(path)
    }

    fn load_object(&self, path: &str) -> Result<PakObject> {
        self.require(path)?.load_object(path)
    }
}
