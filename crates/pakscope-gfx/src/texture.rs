//! Neutral texture contract shared by every image decoder.
//!
//! A renderer calls [`Texture::begin`] with its platform tag, uploads the
//! returned bytes span by span, then calls [`Texture::end`]. Nothing here
//! knows about a graphics API.

use std::fmt;
use std::ops::Range;

use crate::Result;

/// Rendering target requesting texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    OpenGL,
    Vulkan,
    Unity,
    Unreal,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::OpenGL => "OpenGL",
            Platform::Vulkan => "Vulkan",
            Platform::Unity => "Unity",
            Platform::Unreal => "Unreal",
        };
        f.write_str(name)
    }
}

/// Pixel layout of a texture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// BC1, 8 bytes per 4x4 block.
    Dxt1,
    /// BC2, 16 bytes per block.
    Dxt3,
    /// BC3, 16 bytes per block.
    Dxt5,
    /// BC4 single channel, 8 bytes per block.
    Bc4,
    /// BC5 two channel, 16 bytes per block.
    Bc5,
    Bc6h,
    Bc7,
    Rgba8,
    Bgra8,
    Rgb8,
    Bgr8,
    Rgb565,
    /// 16-bit with the top bit ignored.
    Rgb555,
    /// 8-bit luminance.
    L8,
    /// DXGI format this crate has no neutral name for.
    Dxgi(u32),
}

impl TextureFormat {
    /// Bytes per 4x4 block for block-compressed formats.
    pub fn block_size(self) -> Option<usize> {
        match self {
            TextureFormat::Dxt1 | TextureFormat::Bc4 => Some(8),
            TextureFormat::Dxt3
            | TextureFormat::Dxt5
            | TextureFormat::Bc5
            | TextureFormat::Bc6h
            | TextureFormat::Bc7 => Some(16),
            _ => None,
        }
    }

    /// Bytes per pixel for uncompressed formats.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Bgra8 => Some(4),
            TextureFormat::Rgb8 | TextureFormat::Bgr8 => Some(3),
            TextureFormat::Rgb565 | TextureFormat::Rgb555 => Some(2),
            TextureFormat::L8 => Some(1),
            _ => None,
        }
    }

    /// Whether the format is block compressed.
    pub fn is_compressed(self) -> bool {
        self.block_size().is_some()
    }

    /// Byte size of one `width` x `height` surface, if the format is known.
    pub fn surface_size(self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        if let Some(block) = self.block_size() {
            return Some(w.div_ceil(4) * h.div_ceil(4) * block);
        }
        self.bytes_per_pixel().map(|bpp| w * h * bpp)
    }
}

/// Format handed to a renderer: the neutral format plus the platform it was
/// requested for, so the renderer can pick its own native equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub platform: Platform,
    pub format: TextureFormat,
}

/// Byte range of one mip level or frame. `None` marks a level with no data.
pub type Span = Option<Range<usize>>;

/// Result of [`Texture::begin`].
#[derive(Debug)]
pub struct TextureData<'a> {
    pub bytes: &'a [u8],
    pub format: FormatDescriptor,
    /// Per-mip spans into `bytes`; `None` when the buffer is a single surface.
    pub spans: Option<Vec<Span>>,
}

impl TextureData<'_> {
    /// Bytes of mip level `index`, or `None` if that level is empty.
    pub fn mip(&self, index: usize) -> Option<&[u8]> {
        match &self.spans {
            Some(spans) => spans
                .get(index)
                .and_then(|span| span.clone())
                .and_then(|range| self.bytes.get(range)),
            None if index == 0 => Some(self.bytes),
            None => None,
        }
    }
}

/// A decoded texture.
pub trait Texture {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn depth(&self) -> u32 {
        0
    }
    fn mip_maps(&self) -> u32;

    /// Produce pixel data for `platform`. Palette expansion happens here.
    fn begin(&mut self, platform: Platform) -> Result<TextureData<'_>>;

    /// Release anything [`Texture::begin`] allocated.
    fn end(&mut self) {}
}

/// Animated textures (sprites) that decode one frame at a time into the
/// buffer returned by [`Texture::begin`].
pub trait TextureFrames: Texture {
    fn fps(&self) -> u32;
    fn has_frames(&self) -> bool;
    /// Decode the next frame. Returns `false` once every frame was decoded.
    fn decode_frame(&mut self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_rounds_blocks() {
        assert_eq!(TextureFormat::Dxt1.surface_size(17, 9), Some(5 * 3 * 8));
        assert_eq!(TextureFormat::Dxt5.surface_size(1, 1), Some(16));
        assert_eq!(TextureFormat::Rgb8.surface_size(3, 2), Some(18));
        assert_eq!(TextureFormat::Dxgi(2).surface_size(4, 4), None);
    }

    #[test]
    fn test_mip_lookup() {
        let bytes = [0u8; 10];
        let data = TextureData {
            bytes: &bytes,
            format: FormatDescriptor {
                platform: Platform::OpenGL,
                format: TextureFormat::L8,
            },
            spans: Some(vec![Some(0..8), Some(8..10), None]),
        };
        assert_eq!(data.mip(0).map(<[u8]>::len), Some(8));
        assert_eq!(data.mip(1).map(<[u8]>::len), Some(2));
        assert!(data.mip(2).is_none());
        assert!(data.mip(3).is_none());
    }
}
