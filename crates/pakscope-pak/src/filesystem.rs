//! File-system collaborators that hand out archive streams.

use std::collections::BTreeMap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use walkdir::WalkDir;

use crate::Result;

/// Shared, immutable bytes of one physical stream.
#[derive(Debug, Clone)]
pub enum PakData {
    /// Memory-mapped file, paged in on demand.
    Mapped(Arc<Mmap>),
    /// Owned buffer (nested archives, in-memory fixtures).
    Owned(Arc<[u8]>),
}

impl PakData {
    /// Map a file from disk.
    pub fn map(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(PakData::Owned(Arc::from(Vec::new())));
        }
        // The file is opened read-only; callers must not truncate archives while they are open.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(PakData::Mapped(Arc::new(mmap)))
    }
}

impl Deref for PakData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            PakData::Mapped(mmap) => mmap,
            PakData::Owned(bytes) => bytes,
        }
    }
}

impl From<Vec<u8>> for PakData {
    fn from(value: Vec<u8>) -> Self {
        PakData::Owned(Arc::from(value))
    }
}

/// Source of physical streams keyed by forward-slash paths.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    fn open(&self, path: &str) -> Result<PakData>;

    /// Every file path, sorted.
    fn list(&self) -> Result<Vec<String>>;

    fn size(&self, path: &str) -> Result<u64> {
        Ok(self.open(path)?.len() as u64)
    }
}

/// Resolve `name` against the directory containing `archive`.
pub fn sibling(archive: &str, name: &str) -> String {
    match archive.rfind('/') {
        Some(pos) => format!("{}/{}", &archive[..pos], name),
        None => name.to_string(),
    }
}

fn clean(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

fn not_found(path: &str) -> crate::Error {
    std::io::Error::new(std::io::ErrorKind::NotFound, format!("{path} not found")).into()
}

/// Files under a root directory, memory-mapped on open.
#[derive(Debug, Clone)]
pub struct DirectoryFileSystem {
    root: PathBuf,
}

impl DirectoryFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(clean(path))
    }
}

impl FileSystem for DirectoryFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn open(&self, path: &str) -> Result<PakData> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(not_found(path));
        }
        PakData::map(full)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                files.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        files.sort();
        Ok(files)
    }

    fn size(&self, path: &str) -> Result<u64> {
        Ok(std::fs::metadata(self.resolve(path))?.len())
    }
}

/// Files held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(clean(path), Arc::from(data.into()));
    }

    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&clean(path))
    }

    fn open(&self, path: &str) -> Result<PakData> {
        self.files
            .get(&clean(path))
            .map(|bytes| PakData::Owned(Arc::clone(bytes)))
            .ok_or_else(|| not_found(path))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling() {
        assert_eq!(sibling("data/level.index", "level.resources"), "data/level.resources");
        assert_eq!(sibling("level.index", "level.resources"), "level.resources");
    }

    #[test]
    fn test_memory_fs() {
        let fs = MemoryFileSystem::new()
            .with("b.dat", vec![1, 2, 3])
            .with(r".\dir\a.dat", vec![4]);

        assert!(fs.exists("dir/a.dat"));
        assert!(!fs.exists("missing"));
        assert_eq!(&*fs.open("b.dat").unwrap(), &[1, 2, 3]);
        assert_eq!(fs.size("b.dat").unwrap(), 3);
        assert_eq!(fs.list().unwrap(), vec!["b.dat", "dir/a.dat"]);
        assert!(matches!(fs.open("missing"), Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_directory_fs() {
        let root = std::env::temp_dir().join(format!("pakscope-fs-{}", std::process::id()));
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("sub/x.bin"), [9u8, 8, 7]).unwrap();
        std::fs::write(root.join("empty.bin"), []).unwrap();

        let fs = DirectoryFileSystem::new(&root);
        assert!(fs.exists("sub/x.bin"));
        assert_eq!(&*fs.open("sub/x.bin").unwrap(), &[9, 8, 7]);
        assert!(fs.open("empty.bin").unwrap().is_empty());
        assert_eq!(fs.list().unwrap(), vec!["empty.bin", "sub/x.bin"]);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
