//! GoldSrc sprites (`.spr`, magic `IDSP`).

use pakscope_common::BinaryReader;
use zerocopy::byteorder::{LittleEndian, F32, I32, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::rasterize::{copy_pixels_by_palette, copy_pixels_by_palette_with_alpha};
use crate::texture::{FormatDescriptor, Platform, Texture, TextureData, TextureFormat, TextureFrames};
use crate::{Error, Result};

/// `IDSP` read as a little-endian u32.
pub const SPR_MAGIC: u32 = 0x5053_4449;

const FRAMES_PER_SECOND: u32 = 60;
const TRANSPARENT_INDEX: u8 = 0xFF;

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct SprHeader {
    magic: U32<LittleEndian>,
    version: I32<LittleEndian>,
    kind: I32<LittleEndian>,
    text_format: I32<LittleEndian>,
    bounding_radius: F32<LittleEndian>,
    max_width: I32<LittleEndian>,
    max_height: I32<LittleEndian>,
    num_frames: I32<LittleEndian>,
    beam_length: F32<LittleEndian>,
    synch_type: I32<LittleEndian>,
}

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct SprFrame {
    group: I32<LittleEndian>,
    origin_x: I32<LittleEndian>,
    origin_y: I32<LittleEndian>,
    width: I32<LittleEndian>,
    height: I32<LittleEndian>,
}

/// How sprite pixels blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteTextFormat {
    Normal,
    Additive,
    IndexAlpha,
    AlphaTest,
}

impl SpriteTextFormat {
    fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Additive),
            2 => Ok(Self::IndexAlpha),
            3 => Ok(Self::AlphaTest),
            other => Err(Error::InvalidHeader {
                kind: "SPR",
                reason: format!("texture format {other}"),
            }),
        }
    }

    fn keys_alpha(self) -> bool {
        matches!(self, Self::IndexAlpha | Self::AlphaTest)
    }
}

#[derive(Debug, Clone)]
struct Frame {
    width: u32,
    height: u32,
    origin: (i32, i32),
    pixels: Vec<u8>,
}

/// A sprite whose frames are expanded to RGBA one at a time.
#[derive(Debug, Clone)]
pub struct Sprite {
    version: i32,
    text_format: SpriteTextFormat,
    palette: Vec<u8>,
    frames: Vec<Frame>,
    frame: usize,
    bytes: Vec<u8>,
}

impl Sprite {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: SprHeader = reader.read_struct()?;
        if header.magic.get() != SPR_MAGIC {
            return Err(Error::InvalidMagic {
                kind: "SPR",
                expected: SPR_MAGIC,
                actual: header.magic.get(),
            });
        }
        let text_format = SpriteTextFormat::from_raw(header.text_format.get())?;

        let colors = reader.read_u16()? as usize;
        let palette = reader.read_bytes(colors * 3)?.to_vec();

        let num_frames = usize::try_from(header.num_frames.get()).unwrap_or(0);
        if num_frames == 0 {
            return Err(Error::InvalidHeader {
                kind: "SPR",
                reason: "sprite has no frames".to_string(),
            });
        }
        let mut frames = Vec::with_capacity(num_frames.min(reader.remaining() / std::mem::size_of::<SprFrame>()));
        for _ in 0..num_frames {
            let raw: SprFrame = reader.read_struct()?;
            if raw.group.get() != 0 {
                return Err(Error::Unsupported("grouped sprite frames".to_string()));
            }
            let (w, h) = (raw.width.get(), raw.height.get());
            let (Ok(width), Ok(height)) = (u32::try_from(w), u32::try_from(h)) else {
                return Err(Error::InvalidDimensions {
                    width: w as u32,
                    height: h as u32,
                });
            };
            let pixels = reader.read_bytes(width as usize * height as usize)?.to_vec();
            frames.push(Frame {
                width,
                height,
                origin: (raw.origin_x.get(), raw.origin_y.get()),
                pixels,
            });
        }

        let first = &frames[0];
        let bytes = vec![0u8; first.pixels.len() * 4];
        Ok(Self {
            version: header.version.get(),
            text_format,
            palette,
            frames,
            frame: 0,
            bytes,
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text_format(&self) -> SpriteTextFormat {
        self.text_format
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Origin of frame `index` relative to the sprite's anchor.
    pub fn frame_origin(&self, index: usize) -> Option<(i32, i32)> {
        self.frames.get(index).map(|f| f.origin)
    }
}

impl Texture for Sprite {
    fn width(&self) -> u32 {
        self.frames[0].width
    }

    fn height(&self) -> u32 {
        self.frames[0].height
    }

    fn mip_maps(&self) -> u32 {
        1
    }

    fn begin(&mut self, platform: Platform) -> Result<TextureData<'_>> {
        Ok(TextureData {
            bytes: &self.bytes,
            format: FormatDescriptor {
                platform,
                format: TextureFormat::Rgba8,
            },
            spans: None,
        })
    }
}

impl TextureFrames for Sprite {
    fn fps(&self) -> u32 {
        FRAMES_PER_SECOND
    }

    fn has_frames(&self) -> bool {
        self.frame < self.frames.len()
    }

    fn decode_frame(&mut self) -> Result<bool> {
        let Some(frame) = self.frames.get(self.frame) else {
            return Ok(false);
        };
        self.bytes.resize(frame.pixels.len() * 4, 0);
        if self.text_format.keys_alpha() {
            copy_pixels_by_palette_with_alpha(&mut self.bytes, &frame.pixels, &self.palette, TRANSPARENT_INDEX)?;
        } else {
            copy_pixels_by_palette(&mut self.bytes, 4, &frame.pixels, &self.palette, 3)?;
        }
        self.frame += 1;
        Ok(true)
    }
}
