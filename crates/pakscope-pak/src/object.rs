//! Per-game object factories.
//!
//! A factory maps an entry to a decoder by extension and runs it over the
//! entry's resolved bytes. Anything a factory does not claim comes back as
//! [`PakObject::Blob`].

use pakscope_gfx::{Bitmap, Dds, ModelInfo, Sprite, Texture, Tga, Wad3Texture};

use crate::entry::FileEntry;
use crate::game::Engine;
use crate::Result;

/// A decoded entry payload.
#[derive(Debug)]
pub enum PakObject {
    Dds(Dds),
    Tga(Tga),
    Bitmap(Bitmap),
    Wad3(Wad3Texture),
    Sprite(Sprite),
    Model(ModelInfo),
    Text(String),
    /// Raw RIFF/WAVE bytes.
    Sound(Vec<u8>),
    Blob(Vec<u8>),
}

impl PakObject {
    /// Short label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            PakObject::Dds(_) => "dds",
            PakObject::Tga(_) => "tga",
            PakObject::Bitmap(_) => "bitmap",
            PakObject::Wad3(_) => "wad3",
            PakObject::Sprite(_) => "sprite",
            PakObject::Model(_) => "model",
            PakObject::Text(_) => "text",
            PakObject::Sound(_) => "sound",
            PakObject::Blob(_) => "blob",
        }
    }

    /// The texture view of image-like objects.
    pub fn as_texture_mut(&mut self) -> Option<&mut dyn Texture> {
        match self {
            PakObject::Dds(t) => Some(t),
            PakObject::Tga(t) => Some(t),
            PakObject::Bitmap(t) => Some(t),
            PakObject::Wad3(t) => Some(t),
            PakObject::Sprite(t) => Some(t),
            _ => None,
        }
    }
}

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "cfg", "ini", "json", "xml", "asl", "vmt", "lst", "shader", "md", "csv", "log", "res",
    "vdf",
];

/// Extension-to-decoder table for one engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFactory {
    GoldSrc,
    Source,
    Quake,
    /// Danae and Void.
    Arkane,
    Generic,
}

impl ObjectFactory {
    pub fn for_engine(engine: &Engine) -> Self {
        match engine {
            Engine::GoldSrc => ObjectFactory::GoldSrc,
            Engine::Source | Engine::Source2 => ObjectFactory::Source,
            Engine::Quake => ObjectFactory::Quake,
            Engine::Danae | Engine::Void => ObjectFactory::Arkane,
            _ => ObjectFactory::Generic,
        }
    }

    pub fn decode(self, entry: &FileEntry, data: Vec<u8>) -> Result<PakObject> {
        let ext = entry.extension();
        let object = match (self, ext.as_str()) {
            (ObjectFactory::GoldSrc, "pic" | "tex" | "tex2" | "fnt") => {
                PakObject::Wad3(Wad3Texture::parse(&data, &entry.path)?)
            }
            (ObjectFactory::GoldSrc, "spr") => PakObject::Sprite(Sprite::parse(&data)?),
            (ObjectFactory::GoldSrc | ObjectFactory::Source, "mdl") => {
                PakObject::Model(ModelInfo::parse(&data)?)
            }
            (ObjectFactory::Quake, "tex") => PakObject::Blob(data),
            (ObjectFactory::Quake, "jpg") => PakObject::Bitmap(Bitmap::parse(&data)?),
            (ObjectFactory::Arkane, "asl") => PakObject::Text(lossy(data)),
            (_, "dds") => PakObject::Dds(Dds::parse(&data)?),
            (_, "tga") => PakObject::Tga(Tga::parse(&data)?),
            (_, "wav") => PakObject::Sound(data),
            (ObjectFactory::Generic, "png" | "jpg" | "jpeg" | "bmp") => {
                PakObject::Bitmap(Bitmap::parse(&data)?)
            }
            (ObjectFactory::Generic, ext) if TEXT_EXTENSIONS.contains(&ext) => {
                PakObject::Text(lossy(data))
            }
            _ => PakObject::Blob(data),
        };
        tracing::trace!(path = %entry.path, kind = object.kind(), "decoded object");
        Ok(object)
    }
}

fn lossy(data: Vec<u8>) -> String {
    String::from_utf8(data).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
