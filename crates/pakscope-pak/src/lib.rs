//! Multi-game pak archive reader.
//!
//! Opening an archive picks a directory decoder from the game descriptor and
//! the file extension, builds the catalog once, and resolves payloads on
//! demand. Supported directory formats:
//!
//! - XOR-obfuscated file tables (Arx Fatalis / Danae)
//! - `master.index` / `.index` + `.resources` pairs (Void, Bullfrog)
//! - Valve VPK v1 and v2, including MD5 sections and RSA signatures
//! - GoldSrc WAD3, Quake WAD2 and `PACK` archives
//! - BSP v29/v30 embedded miptex lumps
//! - ZIP containers (`.zip`, `.pk3`, `.pk4`)
//!
//! Failures while building a catalog are fatal. Failures while resolving a
//! payload are wrapped as [`Error::Entry`] and leave the rest of the archive
//! usable.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pakscope_pak::{BinaryPakFile, DirectoryFileSystem, GameDescriptor, PakConfig, PakFile};
//!
//! let game = Arc::new(GameDescriptor::new("HL2", "Source"));
//! let fs = Arc::new(DirectoryFileSystem::new("/games/hl2"));
//! let pak = BinaryPakFile::open(game, fs, "hl2/hl2_misc_dir.vpk", PakConfig::default())?;
//!
//! for entry in pak.files() {
//!     println!("{}: {} bytes", entry.path, entry.file_size);
//! }
//! let bytes = pak.load_bytes("scripts/game_sounds.txt")?;
//! # Ok::<(), pakscope_pak::Error>(())
//! ```

mod archive;
mod config;
mod entry;
mod error;
mod filesystem;
mod game;
mod many;
mod multi;
mod object;
mod pak;

pub mod binary;
pub mod decompress;

pub use archive::{BinaryPakFile, ReadSummary};
pub use binary::{ArchiveContext, PakBinary};
pub use config::PakConfig;
pub use decompress::{Codec, Decompressor, StandardDecompressor};
pub use entry::{fold_path, EntryTag, FileEntry, SubArchiveRef, VpkLocation};
pub use error::{Error, Result};
pub use filesystem::{sibling, DirectoryFileSystem, FileSystem, MemoryFileSystem, PakData};
pub use game::{Engine, GameDescriptor, GameKey};
pub use many::ManyPakFile;
pub use multi::MultiPakFile;
pub use object::{ObjectFactory, PakObject};
pub use pak::{PakFile, PathIndex};
