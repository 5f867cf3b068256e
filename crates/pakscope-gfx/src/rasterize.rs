//! Palette expansion for indexed pixel formats.

use crate::{Error, Result};

/// Expand palette indices into `dest`.
///
/// `dest_bpp` is 3 (RGB) or 4 (RGBA); `palette_bpp` is the stride of one
/// palette entry. When the destination has an alpha channel the palette does
/// not provide, alpha is opaque.
pub fn copy_pixels_by_palette(
    dest: &mut [u8],
    dest_bpp: usize,
    indices: &[u8],
    palette: &[u8],
    palette_bpp: usize,
) -> Result<()> {
    check_dest(dest, dest_bpp, indices.len())?;
    let channels = dest_bpp.min(palette_bpp);
    for (out, &index) in dest.chunks_exact_mut(dest_bpp).zip(indices) {
        let start = index as usize * palette_bpp;
        let entry = palette
            .get(start..start + palette_bpp)
            .ok_or(Error::ColorMapIndex(index as u32))?;
        out[..channels].copy_from_slice(&entry[..channels]);
        if dest_bpp == 4 && palette_bpp < 4 {
            out[3] = 0xFF;
        }
    }
    Ok(())
}

/// Expand palette indices into RGBA, making `alpha_index` fully transparent.
pub fn copy_pixels_by_palette_with_alpha(
    dest: &mut [u8],
    indices: &[u8],
    palette: &[u8],
    alpha_index: u8,
) -> Result<()> {
    copy_pixels_by_palette(dest, 4, indices, palette, 3)?;
    for (out, &index) in dest.chunks_exact_mut(4).zip(indices) {
        if index == alpha_index {
            out[3] = 0;
        }
    }
    Ok(())
}

fn check_dest(dest: &[u8], dest_bpp: usize, pixels: usize) -> Result<()> {
    if !(3..=4).contains(&dest_bpp) || dest.len() < pixels * dest_bpp {
        return Err(Error::InvalidHeader {
            kind: "raster",
            reason: format!(
                "destination of {} bytes cannot hold {} pixels at {} bytes each",
                dest.len(),
                pixels,
                dest_bpp
            ),
        });
    }
    Ok(())
}

/// A 256-entry grey ramp palette (RGB).
pub fn grey_palette() -> Vec<u8> {
    (0..=255u8).flat_map(|i| [i, i, i]).collect()
}
