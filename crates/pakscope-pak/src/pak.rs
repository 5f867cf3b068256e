//! The archive abstraction shared by every orchestrator.

use hashbrown::HashMap;

use crate::entry::{fold_path, FileEntry};
use crate::object::PakObject;
use crate::Result;

/// A catalog of entries plus payload and object resolution.
pub trait PakFile: Send + Sync {
    fn name(&self) -> &str;

    /// Entries in catalog order.
    fn files(&self) -> Box<dyn Iterator<Item = &FileEntry> + '_>;

    /// Exact match first, then case-insensitive with `\` treated as `/`.
    fn get_entry(&self, path: &str) -> Option<&FileEntry>;

    fn contains(&self, path: &str) -> bool {
        self.get_entry(path).is_some()
    }

    /// Resolved payload. Failures are scoped to the entry.
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Payload decoded through the archive's object factory.
    fn load_object(&self, path: &str) -> Result<PakObject>;
}

/// Path lookup over a catalog. The first entry with a given path wins.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl PathIndex {
    pub fn new(files: &[FileEntry]) -> Self {
        let mut exact = HashMap::with_capacity(files.len());
        let mut folded = HashMap::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            exact.entry(file.path.clone()).or_insert(i);
            folded.entry(fold_path(&file.path)).or_insert(i);
        }
        Self { exact, folded }
    }

    pub fn get(&self, path: &str) -> Option<usize> {
        self.exact
            .get(path)
            .or_else(|| self.folded.get(&fold_path(path)))
            .copied()
    }
}
