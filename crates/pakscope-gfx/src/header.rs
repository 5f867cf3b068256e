//! DDS header structures.
//!
//! All fields are little-endian on disk and declared that way, so the layouts
//! decode identically on any host.

use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::TextureFormat;

type U32Le = U32<LittleEndian>;

/// DDS file header (follows the 4-byte `DDS ` magic).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: U32Le,
    pub flags: U32Le,
    pub height: U32Le,
    pub width: U32Le,
    pub pitch_or_linear_size: U32Le,
    /// Depth (for volume textures).
    pub depth: U32Le,
    pub mipmap_count: U32Le,
    pub reserved1: [U32Le; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: U32Le,
    pub caps2: U32Le,
    pub caps3: U32Le,
    pub caps4: U32Le,
    pub reserved2: U32Le,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Check if this is a DX10 extended header.
    pub fn is_dx10(&self) -> bool {
        self.pixel_format.flags.get() & DdsPixelFormat::FOURCC != 0
            && self.pixel_format.four_cc == FourCC::DX10
    }
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: U32Le,
    pub flags: U32Le,
    pub four_cc: FourCC,
    pub rgb_bit_count: U32Le,
    pub r_bit_mask: U32Le,
    pub g_bit_mask: U32Le,
    pub b_bit_mask: U32Le,
    pub a_bit_mask: U32Le,
}

impl DdsPixelFormat {
    pub const ALPHA_PIXELS: u32 = 0x1;
    pub const ALPHA: u32 = 0x2;
    pub const FOURCC: u32 = 0x4;
    pub const RGB: u32 = 0x40;
    pub const LUMINANCE: u32 = 0x20000;

    /// Resolve the neutral format for a non-DX10 header.
    pub fn texture_format(&self) -> Option<TextureFormat> {
        let flags = self.flags.get();
        if flags & Self::FOURCC != 0 {
            return self.four_cc.texture_format();
        }
        let bits = self.rgb_bit_count.get();
        let red = self.r_bit_mask.get();
        if flags & Self::RGB != 0 {
            return match (bits, red) {
                (32, 0x00FF_0000) => Some(TextureFormat::Bgra8),
                (32, 0x0000_00FF) => Some(TextureFormat::Rgba8),
                (24, 0x00FF_0000) => Some(TextureFormat::Bgr8),
                (24, 0x0000_00FF) => Some(TextureFormat::Rgb8),
                (16, 0xF800) => Some(TextureFormat::Rgb565),
                (16, 0x7C00) => Some(TextureFormat::Rgb555),
                _ => None,
            };
        }
        if flags & (Self::LUMINANCE | Self::ALPHA) != 0 && bits == 8 {
            return Some(TextureFormat::L8);
        }
        None
    }
}

/// Four-character code for compression type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const DXT1: Self = Self(*b"DXT1");
    pub const DXT3: Self = Self(*b"DXT3");
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header.
    pub const DX10: Self = Self(*b"DX10");
    pub const ATI1: Self = Self(*b"ATI1");
    pub const ATI2: Self = Self(*b"ATI2");
    pub const BC4U: Self = Self(*b"BC4U");
    pub const BC4S: Self = Self(*b"BC4S");
    pub const BC5U: Self = Self(*b"BC5U");
    pub const BC5S: Self = Self(*b"BC5S");

    fn texture_format(self) -> Option<TextureFormat> {
        match self {
            Self::DXT1 => Some(TextureFormat::Dxt1),
            Self::DXT3 => Some(TextureFormat::Dxt3),
            Self::DXT5 => Some(TextureFormat::Dxt5),
            Self::ATI1 | Self::BC4U | Self::BC4S => Some(TextureFormat::Bc4),
            Self::ATI2 | Self::BC5U | Self::BC5S => Some(TextureFormat::Bc5),
            _ => None,
        }
    }
}

/// DX10 extended header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DdsHeaderDxt10 {
    pub dxgi_format: U32Le,
    pub resource_dimension: U32Le,
    pub misc_flag: U32Le,
    pub array_size: U32Le,
    pub misc_flags2: U32Le,
}

impl DdsHeaderDxt10 {
    /// Map a DXGI format code to the neutral enum.
    pub fn texture_format(&self) -> TextureFormat {
        match self.dxgi_format.get() {
            28 | 29 => TextureFormat::Rgba8,
            61 => TextureFormat::L8,
            71 | 72 => TextureFormat::Dxt1,
            74 | 75 => TextureFormat::Dxt3,
            77 | 78 => TextureFormat::Dxt5,
            80 | 81 => TextureFormat::Bc4,
            83 | 84 => TextureFormat::Bc5,
            85 => TextureFormat::Rgb565,
            87 | 91 => TextureFormat::Bgra8,
            95 | 96 => TextureFormat::Bc6h,
            98 | 99 => TextureFormat::Bc7,
            other => TextureFormat::Dxgi(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromZeros;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<DdsHeader>(), DdsHeader::SIZE as usize);
        assert_eq!(std::mem::size_of::<DdsPixelFormat>(), 32);
        assert_eq!(std::mem::size_of::<DdsHeaderDxt10>(), 20);
    }

    #[test]
    fn test_dxgi_mapping() {
        let mut header = DdsHeaderDxt10::new_zeroed();
        header.dxgi_format = U32Le::new(98);
        assert_eq!(header.texture_format(), TextureFormat::Bc7);
        header.dxgi_format = U32Le::new(2);
        assert_eq!(header.texture_format(), TextureFormat::Dxgi(2));
    }
}
