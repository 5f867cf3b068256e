//! Neutral texture, sprite and model decoders for pakscope.
//!
//! Every decoder works on an entry's already-resolved bytes and produces an
//! object implementing [`Texture`] (or [`TextureFrames`] for animated
//! sprites). Renderers consume them through the `begin`/`end` pair:
//!
//! ```no_run
//! use pakscope_gfx::{Dds, Platform, Texture};
//!
//! let data = std::fs::read("rock.dds")?;
//! let mut texture = Dds::parse(&data)?;
//! let upload = texture.begin(Platform::OpenGL)?;
//! for (level, span) in upload.spans.iter().flatten().enumerate() {
//!     if let Some(range) = span {
//!         println!("mip {level}: {} bytes", range.len());
//!     }
//! }
//! texture.end();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bitmap;
mod dds;
mod error;
mod header;
mod model;
mod sprite;
mod tga;
mod texture;
mod wad3;

pub mod rasterize;

pub use bitmap::Bitmap;
pub use dds::{mip_spans, Dds, DDS_MAGIC};
pub use error::{Error, Result};
pub use header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC};
pub use model::{ModelFlavor, ModelInfo, MDL_MAGIC};
pub use sprite::{Sprite, SpriteTextFormat, SPR_MAGIC};
pub use texture::{
    FormatDescriptor, Platform, Span, Texture, TextureData, TextureFormat, TextureFrames,
};
pub use tga::Tga;
pub use wad3::{CharInfo, FontInfo, Wad3Kind, Wad3Texture};
