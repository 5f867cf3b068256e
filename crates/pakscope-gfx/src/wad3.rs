//! GoldSrc WAD3 lump payloads: mip textures, pictures and fonts.
//!
//! All three share the same tail: a `u16` colour count followed by a
//! 256-entry RGB palette. Names starting with `{` use palette index 255 as
//! the transparent colour.

use std::path::Path;

use pakscope_common::{BinaryReader, StringEncoding};
use zerocopy::byteorder::{LittleEndian, U16};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::rasterize::{copy_pixels_by_palette, copy_pixels_by_palette_with_alpha, grey_palette};
use crate::texture::{FormatDescriptor, Platform, Span, Texture, TextureData, TextureFormat};
use crate::{Error, Result};

/// Largest width or height a WAD3 texture may declare.
pub const MAX_DIMENSION: u32 = 0x1000;

const PALETTE_SIZE: usize = 0x100 * 3;
const TRANSPARENT_INDEX: u8 = 0xFF;

/// Lump payload kind, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wad3Kind {
    /// `.tex2`: mip texture with an implicit grey palette (decals).
    Tex2,
    /// `.pic`: single picture.
    Pic,
    /// `.tex`: mip texture.
    Tex,
    /// `.fnt`: 256-glyph bitmap font.
    Fnt,
}

impl Wad3Kind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "tex2" => Some(Wad3Kind::Tex2),
            "pic" => Some(Wad3Kind::Pic),
            "tex" => Some(Wad3Kind::Tex),
            "fnt" => Some(Wad3Kind::Fnt),
            _ => None,
        }
    }

    fn is_mip_texture(self) -> bool {
        matches!(self, Wad3Kind::Tex | Wad3Kind::Tex2)
    }
}

/// One glyph of a WAD3 font.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CharInfo {
    pub start_offset: U16<LittleEndian>,
    pub char_width: U16<LittleEndian>,
}

/// Font metrics carried by `.fnt` lumps.
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub row_count: u32,
    pub row_height: u32,
    pub chars: Vec<CharInfo>,
}

/// A decoded WAD3 texture, picture or font.
#[derive(Debug, Clone)]
pub struct Wad3Texture {
    kind: Wad3Kind,
    name: Option<String>,
    width: u32,
    height: u32,
    transparent: bool,
    pixels: Vec<Vec<u8>>,
    palette: Vec<u8>,
    font: Option<FontInfo>,
    buffer: Vec<u8>,
}

impl Wad3Texture {
    /// Parse a lump payload. `path` selects the kind and transparency.
    pub fn parse(data: &[u8], path: &str) -> Result<Self> {
        let file = Path::new(path);
        let kind = file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Wad3Kind::from_extension)
            .ok_or_else(|| Error::Unsupported(format!("WAD3 lump type for {path}")))?;
        let transparent = file
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('{'));

        let mut reader = BinaryReader::new(data);
        let name = if kind.is_mip_texture() {
            Some(reader.read_string_in_buffer(16, StringEncoding::Ascii)?.into_owned())
        } else {
            None
        };
        let mut width = reader.read_u32()?;
        let height = reader.read_u32()?;
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidDimensions { width, height });
        }

        let mut font = None;
        if kind.is_mip_texture() {
            let first = reader.read_u32()?;
            reader.skip(12)?;
            if reader.position() != first as usize {
                return Err(Error::BadOffset {
                    expected: first,
                    actual: reader.position(),
                });
            }
        } else if kind == Wad3Kind::Fnt {
            width = 0x100;
            let row_count = reader.read_u32()?;
            let row_height = reader.read_u32()?;
            let chars = reader.read_struct_array::<CharInfo>(0x100)?;
            font = Some(FontInfo {
                row_count,
                row_height,
                chars,
            });
        }

        let size = width as usize * height as usize;
        let pixels = if kind.is_mip_texture() {
            [size, size >> 2, size >> 4, size >> 6]
                .iter()
                .map(|&n| reader.read_bytes(n).map(<[u8]>::to_vec))
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            vec![reader.read_bytes(size)?.to_vec()]
        };

        reader.skip(2)?;
        let stored = reader.read_bytes(PALETTE_SIZE)?;
        let palette = if kind == Wad3Kind::Tex2 {
            grey_palette()
        } else {
            stored.to_vec()
        };

        Ok(Self {
            kind,
            name,
            width,
            height,
            transparent,
            pixels,
            palette,
            font,
            buffer: Vec::new(),
        })
    }

    pub fn kind(&self) -> Wad3Kind {
        self.kind
    }

    /// Embedded texture name (mip textures only).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn font(&self) -> Option<&FontInfo> {
        self.font.as_ref()
    }

    /// Raw palette indices of mip level `index`.
    pub fn indices(&self, index: usize) -> Option<&[u8]> {
        self.pixels.get(index).map(Vec::as_slice)
    }
}

impl Texture for Wad3Texture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn mip_maps(&self) -> u32 {
        self.pixels.len() as u32
    }

    fn begin(&mut self, platform: Platform) -> Result<TextureData<'_>> {
        let bpp = if self.transparent { 4 } else { 3 };
        let total: usize = self.pixels.iter().map(Vec::len).sum();
        let mut buffer = vec![0u8; total * bpp];
        let mut spans: Vec<Span> = Vec::with_capacity(self.pixels.len());

        let mut offset = 0;
        for indices in &self.pixels {
            let span = offset..offset + indices.len() * bpp;
            let dest = &mut buffer[span.clone()];
            if self.transparent {
                copy_pixels_by_palette_with_alpha(dest, indices, &self.palette, TRANSPARENT_INDEX)?;
            } else {
                copy_pixels_by_palette(dest, 3, indices, &self.palette, 3)?;
            }
            offset = span.end;
            spans.push(Some(span));
        }

        self.buffer = buffer;
        Ok(TextureData {
            bytes: &self.buffer,
            format: FormatDescriptor {
                platform,
                format: if self.transparent {
                    TextureFormat::Rgba8
                } else {
                    TextureFormat::Rgb8
                },
            },
            spans: Some(spans),
        })
    }

    fn end(&mut self) {
        self.buffer = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a `.tex` miptex payload of `width` x `height` filled with `index`.
    fn build_miptex(name: &str, width: u32, height: u32, index: u8) -> Vec<u8> {
        let mut out = Vec::new();
        let mut name_buf = [0u8; 16];
        name_buf[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&name_buf);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        let size = width * height;
        let mut offset = 40u32;
        for shift in [0, 2, 4, 6] {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += size >> shift;
        }
        for shift in [0, 2, 4, 6] {
            out.extend(std::iter::repeat(index).take((size >> shift) as usize));
        }
        out.extend_from_slice(&256u16.to_le_bytes());
        for i in 0..=255u8 {
            out.extend_from_slice(&[i, i.wrapping_add(1), i.wrapping_add(2)]);
        }
        out
    }

    #[test]
    fn test_tex_mips_and_spans() {
        let data = build_miptex("brick", 16, 16, 4);
        let mut tex = Wad3Texture::parse(&data, "brick.tex").unwrap();

        assert_eq!(tex.name(), Some("brick"));
        assert_eq!(tex.mip_maps(), 4);
        let out = tex.begin(Platform::OpenGL).unwrap();
        assert_eq!(out.format.format, TextureFormat::Rgb8);
        let spans = out.spans.clone().unwrap();
        assert_eq!(spans[0], Some(0..768));
        assert_eq!(spans[3], Some(1008..1020));
        assert_eq!(&out.bytes[..3], &[4, 5, 6]);
    }

    #[test]
    fn test_transparent_name_keys_index_255() {
        let data = build_miptex("{fence", 4, 4, 0xFF);
        let mut tex = Wad3Texture::parse(&data, "textures/{fence.tex").unwrap();

        assert!(tex.is_transparent());
        let out = tex.begin(Platform::Unity).unwrap();
        assert_eq!(out.format.format, TextureFormat::Rgba8);
        assert_eq!(&out.bytes[..4], &[255, 0, 1, 0]);
    }

    #[test]
    fn test_tex2_uses_grey_palette() {
        let data = build_miptex("decal", 4, 4, 9);
        let mut tex = Wad3Texture::parse(&data, "decal.tex2").unwrap();
        let out = tex.begin(Platform::OpenGL).unwrap();
        assert_eq!(&out.bytes[..3], &[9, 9, 9]);
    }

    #[test]
    fn test_bad_first_offset() {
        let mut data = build_miptex("x", 4, 4, 0);
        data[24..28].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            Wad3Texture::parse(&data, "x.tex"),
            Err(Error::BadOffset { expected: 0, actual: 40 })
        ));
    }

    #[test]
    fn test_dimension_limits() {
        let mut data = build_miptex("x", 4, 4, 0);
        data[16..20].copy_from_slice(&0x1001u32.to_le_bytes());
        assert!(matches!(
            Wad3Texture::parse(&data, "x.tex"),
            Err(Error::InvalidDimensions { width: 0x1001, .. })
        ));
    }

    #[test]
    fn test_font_forces_width() {
        let mut data = Vec::new();
        data.extend_from_slice(&8u32.to_le_bytes()); // declared width, ignored
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes()); // rows
        data.extend_from_slice(&2u32.to_le_bytes()); // row height
        data.extend(std::iter::repeat(0u8).take(0x100 * 4));
        data.extend(std::iter::repeat(1u8).take(0x100 * 2));
        data.extend_from_slice(&[0, 1]);
        data.extend(std::iter::repeat(7u8).take(PALETTE_SIZE));

        let tex = Wad3Texture::parse(&data, "fonts/conchars.fnt").unwrap();
        assert_eq!(tex.width(), 0x100);
        assert_eq!(tex.font().map(|f| f.chars.len()), Some(0x100));
        assert_eq!(tex.indices(0).map(<[u8]>::len), Some(0x200));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            Wad3Texture::parse(&[0u8; 64], "thing.42"),
            Err(Error::Unsupported(_))
        ));
    }
}
