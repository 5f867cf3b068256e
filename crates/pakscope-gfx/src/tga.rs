//! Truevision TGA images.
//!
//! Supports colour-mapped, true-colour and 8-bit greyscale images, raw or
//! run-length encoded. Pixels keep TGA's native BGR(A) channel order and are
//! normalised to a top-left origin.

use pakscope_common::BinaryReader;
use zerocopy::byteorder::{LittleEndian, U16};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::texture::{FormatDescriptor, Platform, Texture, TextureData, TextureFormat};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct TgaHeader {
    id_length: u8,
    map_type: u8,
    image_type: u8,
    map_first_entry: U16<LittleEndian>,
    map_length: U16<LittleEndian>,
    map_entry_size: u8,
    x_origin: U16<LittleEndian>,
    y_origin: U16<LittleEndian>,
    width: U16<LittleEndian>,
    height: U16<LittleEndian>,
    pixel_depth: u8,
    descriptor: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    ColorMapped,
    TrueColor,
    Grayscale,
}

/// A decoded-on-demand TGA image.
#[derive(Debug, Clone)]
pub struct Tga {
    width: u32,
    height: u32,
    kind: ImageKind,
    rle: bool,
    descriptor: u8,
    /// Bytes per stored pixel (index or colour).
    pixel_size: usize,
    format: TextureFormat,
    color_map: Option<ColorMap>,
    body: Vec<u8>,
    buffer: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ColorMap {
    first_index: u32,
    bytes_per_entry: usize,
    entries: Vec<u8>,
}

impl ColorMap {
    fn entry(&self, index: u32) -> Result<&[u8]> {
        let slot = index
            .checked_sub(self.first_index)
            .ok_or(Error::ColorMapIndex(index))? as usize;
        let start = slot * self.bytes_per_entry;
        self.entries
            .get(start..start + self.bytes_per_entry)
            .ok_or(Error::ColorMapIndex(index))
    }
}

fn bits_to_bytes(bits: u8) -> usize {
    (bits as usize).saturating_sub(1) / 8 + 1
}

impl Tga {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: TgaHeader = reader.read_struct()?;
        let invalid = |reason: &str| Error::InvalidHeader {
            kind: "TGA",
            reason: reason.to_string(),
        };

        if header.map_type > 1 {
            return Err(invalid("unsupported colour map type"));
        }
        let (kind, rle) = match header.image_type {
            0 => return Err(invalid("image contains no data")),
            1 => (ImageKind::ColorMapped, false),
            2 => (ImageKind::TrueColor, false),
            3 => (ImageKind::Grayscale, false),
            9 => (ImageKind::ColorMapped, true),
            10 => (ImageKind::TrueColor, true),
            11 => (ImageKind::Grayscale, true),
            other => return Err(Error::Unsupported(format!("TGA image type {other}"))),
        };
        let (width, height) = (header.width.get() as u32, header.height.get() as u32);
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        reader.skip(header.id_length as usize)?;

        let map_bytes = header.map_length.get() as usize * bits_to_bytes(header.map_entry_size);
        let color_map = if kind == ImageKind::ColorMapped {
            if header.map_type != 1 {
                return Err(invalid("colour-mapped image without a colour map"));
            }
            Some(ColorMap {
                first_index: header.map_first_entry.get() as u32,
                bytes_per_entry: bits_to_bytes(header.map_entry_size),
                entries: reader.read_bytes(map_bytes)?.to_vec(),
            })
        } else {
            // A colour map may be present but unused.
            if header.map_type == 1 {
                reader.skip(map_bytes)?;
            }
            None
        };

        let format = match (kind, header.pixel_depth, header.map_entry_size) {
            (ImageKind::ColorMapped, 8, 15 | 16) => TextureFormat::Rgb555,
            (ImageKind::ColorMapped, 8, 24) => TextureFormat::Bgr8,
            (ImageKind::ColorMapped, 8, 32) => TextureFormat::Bgra8,
            (ImageKind::TrueColor, 15 | 16, _) => TextureFormat::Rgb555,
            (ImageKind::TrueColor, 24, _) => TextureFormat::Bgr8,
            (ImageKind::TrueColor, 32, _) => TextureFormat::Bgra8,
            (ImageKind::Grayscale, 8, _) => TextureFormat::L8,
            (_, depth, entry) => {
                return Err(Error::Unsupported(format!(
                    "TGA pixel depth {depth} (map entry {entry})"
                )))
            }
        };

        Ok(Self {
            width,
            height,
            kind,
            rle,
            descriptor: header.descriptor,
            pixel_size: bits_to_bytes(header.pixel_depth),
            format,
            color_map,
            body: reader.remaining_bytes().to_vec(),
            buffer: Vec::new(),
        })
    }

    /// Neutral pixel format of the decoded buffer.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Decode into a top-left origin buffer.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let out_bpp = self.format.bytes_per_pixel().unwrap_or(1);
        let pixel_count = self.width as usize * self.height as usize;
        // An RLE packet of two bytes expands to at most 128 pixels.
        let mut out = Vec::with_capacity(pixel_count.min(self.body.len().saturating_mul(128)) * out_bpp);
        let mut reader = BinaryReader::new(&self.body);

        if self.rle {
            while out.len() < pixel_count * out_bpp {
                let packet = reader.read_u8()?;
                let count = (packet & 0x7F) as usize + 1;
                if packet & 0x80 != 0 {
                    let pixel = reader.read_bytes(self.pixel_size)?;
                    for _ in 0..count {
                        self.push_pixel(&mut out, pixel)?;
                    }
                } else {
                    for _ in 0..count {
                        let pixel = reader.read_bytes(self.pixel_size)?;
                        self.push_pixel(&mut out, pixel)?;
                    }
                }
            }
            out.truncate(pixel_count * out_bpp);
        } else {
            for _ in 0..pixel_count {
                let pixel = reader.read_bytes(self.pixel_size)?;
                self.push_pixel(&mut out, pixel)?;
            }
        }

        self.orient(&mut out, out_bpp);
        Ok(out)
    }

    fn push_pixel(&self, out: &mut Vec<u8>, pixel: &[u8]) -> Result<()> {
        match (&self.color_map, self.kind) {
            (Some(map), ImageKind::ColorMapped) => {
                let index = match pixel {
                    [lo] => *lo as u32,
                    [lo, hi, ..] => u16::from_le_bytes([*lo, *hi]) as u32,
                    [] => 0,
                };
                out.extend_from_slice(map.entry(index)?);
            }
            _ => out.extend_from_slice(pixel),
        }
        Ok(())
    }

    fn orient(&self, out: &mut [u8], bpp: usize) {
        let row = self.width as usize * bpp;
        if self.descriptor & 0x10 != 0 {
            for line in out.chunks_exact_mut(row) {
                let pixels = line.len() / bpp;
                for x in 0..pixels / 2 {
                    let (a, b) = (x * bpp, (pixels - 1 - x) * bpp);
                    for c in 0..bpp {
                        line.swap(a + c, b + c);
                    }
                }
            }
        }
        // Bottom-left origin unless bit 5 is set.
        if self.descriptor & 0x20 == 0 {
            let rows = self.height as usize;
            for y in 0..rows / 2 {
                let (top, bottom) = out.split_at_mut((rows - 1 - y) * row);
                top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
            }
        }
    }
}

impl Texture for Tga {
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
        self.buffer = self.decode()?;
        Ok(TextureData {
            bytes: &self.buffer,
            format: FormatDescriptor {
                platform,
                format: self.format,
            },
            spans: None,
        })
    }

    fn end(&mut self) {
        self.buffer = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(image_type: u8, depth: u8, width: u16, height: u16, descriptor: u8) -> Vec<u8> {
        let mut out = vec![0u8, 0, image_type, 0, 0, 0, 0, 0];
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.push(depth);
        out.push(descriptor);
        out
    }

    #[test]
    fn test_true_color_bottom_up_is_flipped() {
        let mut data = header(2, 24, 1, 2, 0);
        data.extend_from_slice(&[1, 2, 3]); // bottom row
        data.extend_from_slice(&[4, 5, 6]); // top row
        let mut tga = Tga::parse(&data).unwrap();
        let out = tga.begin(Platform::OpenGL).unwrap();

        assert_eq!(out.format.format, TextureFormat::Bgr8);
        assert_eq!(out.bytes, &[4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_rle_grayscale_top_left() {
        let mut data = header(11, 8, 4, 1, 0x20);
        // run of 3 x 0x7F, then one raw pixel 0x01
        data.extend_from_slice(&[0x82, 0x7F, 0x00, 0x01]);
        let tga = Tga::parse(&data).unwrap();

        assert_eq!(tga.format(), TextureFormat::L8);
        assert_eq!(tga.decode().unwrap(), vec![0x7F, 0x7F, 0x7F, 0x01]);
    }

    #[test]
    fn test_color_mapped_with_first_index() {
        // map: first index 1, two 24-bit entries
        let mut data = vec![0u8, 1, 1];
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.push(24);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(8);
        data.push(0x30); // top-left origin, right-to-left
        data.extend_from_slice(&[10, 11, 12, 20, 21, 22]);
        data.extend_from_slice(&[1, 2]);
        let tga = Tga::parse(&data).unwrap();

        assert_eq!(tga.decode().unwrap(), vec![20, 21, 22, 10, 11, 12]);
    }

    #[test]
    fn test_truncated_body() {
        let mut data = header(2, 32, 2, 2, 0);
        data.extend_from_slice(&[0u8; 7]);
        let tga = Tga::parse(&data).unwrap();
        assert!(tga.decode().is_err());
    }

    #[test]
    fn test_dimensions_beyond_body() {
        let mut data = header(2, 32, u16::MAX, u16::MAX, 0x20);
        data.extend_from_slice(&[1, 2, 3, 4]);
        let tga = Tga::parse(&data).unwrap();
        assert!(tga.decode().is_err());
    }

    #[test]
    fn test_rejects_no_data_and_zero_size() {
        assert!(Tga::parse(&header(0, 24, 1, 1, 0)).is_err());
        assert!(matches!(
            Tga::parse(&header(2, 24, 0, 1, 0)),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
