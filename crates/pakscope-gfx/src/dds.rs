//! DirectDraw Surface textures.

use pakscope_common::BinaryReader;
use tracing::debug;

use crate::header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat};
use crate::texture::{FormatDescriptor, Platform, Span, Texture, TextureData, TextureFormat};
use crate::{Error, Result};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";

/// A DDS texture with precomputed mip spans.
#[derive(Debug, Clone)]
pub struct Dds {
    header: DdsHeader,
    header_dx10: Option<DdsHeaderDxt10>,
    format: TextureFormat,
    bytes: Vec<u8>,
    spans: Vec<Span>,
}

impl Dds {
    /// Parse a DDS file (magic included).
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(DDS_MAGIC)?;
        Self::parse_headerless(&mut reader)
    }

    /// Parse from just past the magic. Some containers strip it.
    pub fn parse_headerless(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let header: DdsHeader = reader.read_struct()?;
        if header.size.get() != DdsHeader::SIZE {
            return Err(Error::InvalidHeader {
                kind: "DDS",
                reason: format!("header size {} != {}", header.size.get(), DdsHeader::SIZE),
            });
        }

        let header_dx10 = if header.is_dx10() {
            Some(reader.read_struct::<DdsHeaderDxt10>()?)
        } else {
            None
        };
        let format = match &header_dx10 {
            Some(dx10) => dx10.texture_format(),
            None => header.pixel_format.texture_format().ok_or_else(|| {
                Error::Unsupported(format!(
                    "DDS pixel format (flags {:#x}, fourcc {:?})",
                    header.pixel_format.flags.get(),
                    header.pixel_format.four_cc
                ))
            })?,
        };

        let bytes = reader.remaining_bytes().to_vec();
        let spans = mip_spans(
            format,
            header.width.get(),
            header.height.get(),
            header.mipmap_count.get().max(1),
            bytes.len(),
        );
        debug!(
            width = header.width.get(),
            height = header.height.get(),
            ?format,
            mips = spans.len(),
            "parsed DDS"
        );

        Ok(Self {
            header,
            header_dx10,
            format,
            bytes,
            spans,
        })
    }

    /// Neutral pixel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Per-mip byte spans into the surface data.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The DX10 extension header, if present.
    pub fn header_dx10(&self) -> Option<&DdsHeaderDxt10> {
        self.header_dx10.as_ref()
    }

    /// Whether the pixel format declares an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.header.pixel_format.flags.get() & DdsPixelFormat::ALPHA_PIXELS != 0
    }
}

/// Lay out mip levels back to back.
///
/// Each level's size is clamped to the bytes still available. A level with a
/// zero dimension or nothing left to read gets an empty span, and the running
/// offset only advances by what was actually available.
pub fn mip_spans(
    format: TextureFormat,
    width: u32,
    height: u32,
    mip_count: u32,
    available: usize,
) -> Vec<Span> {
    let mut offset = 0usize;
    (0..mip_count)
        .map(|level| {
            let (w, h) = (width.checked_shr(level).unwrap_or(0), height.checked_shr(level).unwrap_or(0));
            if w == 0 || h == 0 {
                return None;
            }
            let size = format.surface_size(w, h).unwrap_or(0);
            let remains = size.min(available.saturating_sub(offset));
            if remains == 0 {
                return None;
            }
            let span = offset..offset + remains;
            offset += remains;
            Some(span)
        })
        .collect()
}

impl Texture for Dds {
    fn width(&self) -> u32 {
        self.header.width.get()
    }

    fn height(&self) -> u32 {
        self.header.height.get()
    }

    fn mip_maps(&self) -> u32 {
        self.header.mipmap_count.get()
    }

    fn begin(&mut self, platform: Platform) -> Result<TextureData<'_>> {
        Ok(TextureData {
            bytes: &self.bytes,
            format: FormatDescriptor {
                platform,
                format: self.format,
            },
            spans: Some(self.spans.clone()),
        })
    }
}
