//! Generic images (PNG, JPEG, BMP) decoded through the `image` crate.

use image::{DynamicImage, ImageFormat};

use crate::texture::{FormatDescriptor, Platform, Texture, TextureData, TextureFormat};
use crate::Result;

/// A fully decoded generic image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: TextureFormat,
    source: Option<ImageFormat>,
    bytes: Vec<u8>,
}

impl Bitmap {
    /// Decode, guessing the container from its signature.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let source = image::guess_format(data).ok();
        let decoded = image::load_from_memory(data)?;
        Ok(Self::from_image(decoded, source))
    }

    fn from_image(decoded: DynamicImage, source: Option<ImageFormat>) -> Self {
        let (width, height) = (decoded.width(), decoded.height());
        let (format, bytes) = match decoded {
            DynamicImage::ImageLuma8(img) => (TextureFormat::L8, img.into_raw()),
            img if img.color().has_alpha() => (TextureFormat::Rgba8, img.to_rgba8().into_raw()),
            img => (TextureFormat::Rgb8, img.to_rgb8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            source,
            bytes,
        }
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Container format the bytes were recognised as.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source
    }
}

impl Texture for Bitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn mip_maps(&self) -> u32 {
        1
    }

    fn begin(&mut self, platform: Platform) -> Result<TextureData<'_>> {
        Ok(TextureData {
            bytes: &self.bytes,
            format: FormatDescriptor {
                platform,
                format: self.format,
            },
            spans: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_with_alpha() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let data = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);
        let mut bitmap = Bitmap::parse(&data).unwrap();

        assert_eq!(bitmap.source_format(), Some(ImageFormat::Png));
        let out = bitmap.begin(Platform::OpenGL).unwrap();
        assert_eq!(out.format.format, TextureFormat::Rgba8);
        assert_eq!(out.bytes.len(), 3 * 2 * 4);
        assert_eq!(&out.bytes[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_bmp_rgb() {
        let img = RgbImage::from_pixel(2, 2, Rgb([9, 8, 7]));
        let data = encode(DynamicImage::ImageRgb8(img), ImageFormat::Bmp);
        let bitmap = Bitmap::parse(&data).unwrap();

        assert_eq!(bitmap.format(), TextureFormat::Rgb8);
        assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
    }

    #[test]
    fn test_garbage_fails() {
        assert!(Bitmap::parse(b"not an image").is_err());
    }
}
