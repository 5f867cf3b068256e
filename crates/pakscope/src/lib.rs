//! Pakscope - reading pak archives from many game engines.
//!
//! This crate provides a unified interface to the pakscope library crates.
//!
//! # Crates
//!
//! - [`pakscope_common`] - Binary reading, string decoding, CRC32
//! - [`pakscope_gfx`] - Texture, sprite and model decoders
//! - [`pakscope_pak`] - Archive directory decoders and orchestration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pakscope::prelude::*;
//!
//! let game = Arc::new(GameDescriptor::new("HL", "GoldSrc"));
//! let fs = Arc::new(DirectoryFileSystem::new("/games/Half-Life"));
//! let pak = BinaryPakFile::open(game, fs, "valve/halflife.wad", PakConfig::default())?;
//!
//! if let PakObject::Wad3(mut texture) = pak.load_object("crate01.tex")? {
//!     let upload = texture.begin(Platform::OpenGL)?;
//!     println!("{:?}, {} bytes", upload.format, upload.bytes.len());
//!     texture.end();
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use pakscope_common as common;
pub use pakscope_gfx as gfx;
pub use pakscope_pak as pak;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pakscope_common::{crc, BinaryReader, StringEncoding};
    pub use pakscope_gfx::{
        Bitmap, Dds, ModelInfo, Platform, Sprite, Texture, TextureData, TextureFormat,
        TextureFrames, Tga, Wad3Texture,
    };
    pub use pakscope_pak::{
        BinaryPakFile, DirectoryFileSystem, Engine, EntryTag, FileEntry, FileSystem,
        GameDescriptor, GameKey, ManyPakFile, MemoryFileSystem, MultiPakFile, PakConfig,
        PakFile, PakObject,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
