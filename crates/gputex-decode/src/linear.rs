//! Uncompressed (linear) pixel format decoding
//!
//! Per-pixel conversion of packed source buffers into ARGB32. The entry
//! points are split by source pixel width; 16-bit and 32-bit formats also
//! have big-endian variants for containers that store big-endian data.
//!
//! An optional `stride` gives the source row pitch in bytes for buffers
//! with row padding; `None` means tightly packed rows.

use crate::conv;
use crate::error::{DecodeError, DecodeResult};
use crate::image::{DecodedImage, Sbit};

/// Linear pixel formats the container parsers dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PixelFormat {
    // 8-bit
    L8,
    A8,
    R8,
    // 16-bit
    Rgb565,
    Bgr565,
    Rgb555,
    Bgr555,
    Argb1555,
    Abgr1555,
    Rgba5551,
    Argb4444,
    Abgr4444,
    Rgba4444,
    Rgb5A3,
    A8L8,
    L8A8,
    L16,
    Rg88,
    Gr88,
    // 24-bit
    Rgb888,
    Bgr888,
    // 32-bit
    Argb8888,
    Abgr8888,
    Xrgb8888,
    Rgba8888,
    Bgra8888,
    G16R16,
    A2R10G10B10,
    A2B10G10R10,
    Rgb9E5,
}

impl PixelFormat {
    /// Bytes per pixel in the source buffer.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::L8 | Self::A8 | Self::R8 => 1,
            Self::Rgb565
            | Self::Bgr565
            | Self::Rgb555
            | Self::Bgr555
            | Self::Argb1555
            | Self::Abgr1555
            | Self::Rgba5551
            | Self::Argb4444
            | Self::Abgr4444
            | Self::Rgba4444
            | Self::Rgb5A3
            | Self::A8L8
            | Self::L8A8
            | Self::L16
            | Self::Rg88
            | Self::Gr88 => 2,
            Self::Rgb888 | Self::Bgr888 => 3,
            Self::Argb8888
            | Self::Abgr8888
            | Self::Xrgb8888
            | Self::Rgba8888
            | Self::Bgra8888
            | Self::G16R16
            | Self::A2R10G10B10
            | Self::A2B10G10R10
            | Self::Rgb9E5 => 4,
        }
    }

    /// Significant bits of the source format, where narrower than 8888.
    pub const fn sbit(self) -> Option<Sbit> {
        match self {
            Self::L8 => Some(Sbit::new(8, 8, 8, 8, 0)),
            Self::A8 => Some(Sbit::new(0, 0, 0, 0, 8)),
            Self::R8 => Some(Sbit::new(8, 0, 0, 0, 0)),
            Self::Rgb565 | Self::Bgr565 => Some(Sbit::new(5, 6, 5, 0, 0)),
            Self::Rgb555 | Self::Bgr555 => Some(Sbit::new(5, 5, 5, 0, 0)),
            Self::Argb1555 | Self::Abgr1555 | Self::Rgba5551 => Some(Sbit::new(5, 5, 5, 0, 1)),
            Self::Argb4444 | Self::Abgr4444 | Self::Rgba4444 => Some(Sbit::new(4, 4, 4, 0, 4)),
            Self::Rgb5A3 => Some(Sbit::new(5, 5, 5, 0, 3)),
            Self::A8L8 | Self::L8A8 => Some(Sbit::new(8, 8, 8, 8, 8)),
            Self::L16 => Some(Sbit::new(8, 8, 8, 8, 0)),
            Self::Rg88 | Self::Gr88 | Self::G16R16 => Some(Sbit::new(8, 8, 0, 0, 0)),
            Self::A2R10G10B10 | Self::A2B10G10R10 => Some(Sbit::new(8, 8, 8, 0, 2)),
            Self::Rgb888
            | Self::Bgr888
            | Self::Xrgb8888
            | Self::Rgb9E5 => Some(Sbit::new(8, 8, 8, 0, 0)),
            Self::Argb8888 | Self::Abgr8888 | Self::Rgba8888 | Self::Bgra8888 => None,
        }
    }
}

fn validate_stride(
    bytes_per_pixel: u32,
    width: u32,
    height: u32,
    stride: Option<usize>,
    buf: &[u8],
) -> DecodeResult<usize> {
    let row = width as usize * bytes_per_pixel as usize;
    let stride = stride.unwrap_or(row);
    if stride < row {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    // Last row needs only `row` bytes, not a full stride.
    let needed = stride * (height as usize - 1) + row;
    if buf.len() < needed {
        return Err(DecodeError::BufferTooSmall {
            expected: needed,
            actual: buf.len(),
        });
    }
    Ok(stride)
}

/// Decode an 8-bit-per-pixel linear image.
pub fn from_linear8(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    let convert: fn(u8) -> u32 = match format {
        PixelFormat::L8 => conv::l8_to_argb32,
        PixelFormat::A8 => conv::a8_to_argb32,
        PixelFormat::R8 => conv::r8_to_argb32,
        _ => return Err(DecodeError::UnsupportedFormat("not an 8-bit linear format")),
    };
    let mut img = DecodedImage::new(width, height)?;
    let stride = validate_stride(1, width, height, stride, buf)?;
    let w = width as usize;
    for (y, row) in buf.chunks(stride).take(height as usize).enumerate() {
        let dst = &mut img.pixels_mut()[y * w..(y + 1) * w];
        for (px, src) in dst.iter_mut().zip(&row[..w]) {
            *px = convert(*src);
        }
    }
    if let Some(sbit) = format.sbit() {
        img.set_sbit(sbit);
    }
    Ok(img)
}

fn convert16(format: PixelFormat) -> DecodeResult<fn(u16) -> u32> {
    Ok(match format {
        PixelFormat::Rgb565 => conv::rgb565_to_argb32,
        PixelFormat::Bgr565 => conv::bgr565_to_argb32,
        PixelFormat::Rgb555 => conv::rgb555_to_argb32,
        PixelFormat::Bgr555 => conv::bgr555_to_argb32,
        PixelFormat::Argb1555 => conv::argb1555_to_argb32,
        PixelFormat::Abgr1555 => conv::abgr1555_to_argb32,
        PixelFormat::Rgba5551 => conv::rgba5551_to_argb32,
        PixelFormat::Argb4444 => conv::argb4444_to_argb32,
        PixelFormat::Abgr4444 => conv::abgr4444_to_argb32,
        PixelFormat::Rgba4444 => conv::rgba4444_to_argb32,
        PixelFormat::Rgb5A3 => conv::rgb5a3_to_argb32,
        PixelFormat::A8L8 => conv::a8l8_to_argb32,
        PixelFormat::L8A8 => conv::l8a8_to_argb32,
        PixelFormat::L16 => conv::l16_to_argb32,
        PixelFormat::Rg88 => conv::rg88_to_argb32,
        PixelFormat::Gr88 => conv::gr88_to_argb32,
        _ => {
            return Err(DecodeError::UnsupportedFormat(
                "not a 16-bit linear format",
            ));
        }
    })
}

fn from_linear16_with(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
    load: fn([u8; 2]) -> u16,
) -> DecodeResult<DecodedImage> {
    let convert = convert16(format)?;
    let mut img = DecodedImage::new(width, height)?;
    let stride = validate_stride(2, width, height, stride, buf)?;
    let w = width as usize;
    for (y, row) in buf.chunks(stride).take(height as usize).enumerate() {
        let dst = &mut img.pixels_mut()[y * w..(y + 1) * w];
        for (px, src) in dst.iter_mut().zip(row.chunks_exact(2)) {
            *px = convert(load([src[0], src[1]]));
        }
    }
    if let Some(sbit) = format.sbit() {
        img.set_sbit(sbit);
    }
    Ok(img)
}

/// Decode a 16-bit-per-pixel linear image with little-endian pixels.
pub fn from_linear16(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    from_linear16_with(format, width, height, buf, stride, u16::from_le_bytes)
}

/// Decode a 16-bit-per-pixel linear image with big-endian pixels.
pub fn from_linear16_be(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    from_linear16_with(format, width, height, buf, stride, u16::from_be_bytes)
}

/// Decode a 24-bit-per-pixel linear image.
///
/// 24-bit formats are byte-ordered, so there is no endianness variant.
pub fn from_linear24(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    let convert: fn(&[u8]) -> u32 = match format {
        PixelFormat::Rgb888 => {
            |p| 0xFF00_0000 | (u32::from(p[2]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[0])
        }
        PixelFormat::Bgr888 => {
            |p| 0xFF00_0000 | (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
        }
        _ => {
            return Err(DecodeError::UnsupportedFormat(
                "not a 24-bit linear format",
            ));
        }
    };
    let mut img = DecodedImage::new(width, height)?;
    let stride = validate_stride(3, width, height, stride, buf)?;
    let w = width as usize;
    for (y, row) in buf.chunks(stride).take(height as usize).enumerate() {
        let dst = &mut img.pixels_mut()[y * w..(y + 1) * w];
        for (px, src) in dst.iter_mut().zip(row.chunks_exact(3)) {
            *px = convert(src);
        }
    }
    if let Some(sbit) = format.sbit() {
        img.set_sbit(sbit);
    }
    Ok(img)
}

fn convert32(format: PixelFormat) -> DecodeResult<fn(u32) -> u32> {
    Ok(match format {
        PixelFormat::Argb8888 => |px| px,
        PixelFormat::Abgr8888 => |px: u32| {
            (px & 0xFF00_FF00) | ((px >> 16) & 0xFF) | ((px & 0xFF) << 16)
        },
        PixelFormat::Xrgb8888 => |px: u32| px | 0xFF00_0000,
        PixelFormat::Rgba8888 => |px: u32| px.rotate_right(8),
        PixelFormat::Bgra8888 => |px: u32| px.swap_bytes(),
        PixelFormat::G16R16 => conv::g16r16_to_argb32,
        PixelFormat::A2R10G10B10 => conv::a2r10g10b10_to_argb32,
        PixelFormat::A2B10G10R10 => conv::a2b10g10r10_to_argb32,
        PixelFormat::Rgb9E5 => conv::rgb9_e5_to_argb32,
        _ => {
            return Err(DecodeError::UnsupportedFormat(
                "not a 32-bit linear format",
            ));
        }
    })
}

fn from_linear32_with(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
    load: fn([u8; 4]) -> u32,
) -> DecodeResult<DecodedImage> {
    let convert = convert32(format)?;
    let mut img = DecodedImage::new(width, height)?;
    let stride = validate_stride(4, width, height, stride, buf)?;
    let w = width as usize;
    for (y, row) in buf.chunks(stride).take(height as usize).enumerate() {
        let dst = &mut img.pixels_mut()[y * w..(y + 1) * w];
        for (px, src) in dst.iter_mut().zip(row.chunks_exact(4)) {
            *px = convert(load([src[0], src[1], src[2], src[3]]));
        }
    }
    if let Some(sbit) = format.sbit() {
        img.set_sbit(sbit);
    }
    Ok(img)
}

/// Decode a 32-bit-per-pixel linear image with little-endian pixels.
pub fn from_linear32(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    from_linear32_with(format, width, height, buf, stride, u32::from_le_bytes)
}

/// Decode a 32-bit-per-pixel linear image with big-endian pixels.
pub fn from_linear32_be(
    format: PixelFormat,
    width: u32,
    height: u32,
    buf: &[u8],
    stride: Option<usize>,
) -> DecodeResult<DecodedImage> {
    from_linear32_with(format, width, height, buf, stride, u32::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn l8_replicates_luminance() {
        let img = from_linear8(PixelFormat::L8, 2, 1, &[0x00, 0x80], None).unwrap();
        assert_eq!(img.pixels(), &[0xFF000000, 0xFF808080]);
        assert_eq!(img.sbit(), Some(Sbit::new(8, 8, 8, 8, 0)));
    }

    #[test]
    fn rgb565_le_and_be_agree_on_swapped_input() {
        let le = from_linear16(PixelFormat::Rgb565, 1, 1, &[0x00, 0xF8], None).unwrap();
        let be = from_linear16_be(PixelFormat::Rgb565, 1, 1, &[0xF8, 0x00], None).unwrap();
        assert_eq!(le.pixels(), be.pixels());
        assert_eq!(le.pixel(0, 0), Some(0xFFFF0000));
    }

    #[test]
    fn rgb888_is_bgr_byte_order() {
        // Bytes are B, G, R in memory.
        let img = from_linear24(PixelFormat::Rgb888, 1, 1, &[0x11, 0x22, 0x33], None).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFF332211));
        let img = from_linear24(PixelFormat::Bgr888, 1, 1, &[0x11, 0x22, 0x33], None).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFF112233));
    }

    #[test]
    fn rgba8888_rotates_alpha_into_place() {
        // Memory order A,B,G,R reads as LE 0xRRGGBBAA.
        let img =
            from_linear32(PixelFormat::Rgba8888, 1, 1, &[0x44, 0x33, 0x22, 0x11], None).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0x44112233));
    }

    #[test]
    fn xrgb_forces_opaque_alpha() {
        let img =
            from_linear32(PixelFormat::Xrgb8888, 1, 1, &[0x33, 0x22, 0x11, 0x00], None).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFF112233));
    }

    #[test]
    fn stride_skips_row_padding() {
        // 2x2 L8 with rows padded to 4 bytes
        let buf = [1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE];
        let img = from_linear8(PixelFormat::L8, 2, 2, &buf, Some(4)).unwrap();
        assert_eq!(img.pixel(0, 1), Some(0xFF030303));
        assert_eq!(img.pixel(1, 1), Some(0xFF040404));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = from_linear32(PixelFormat::Argb8888, 2, 2, &[0; 15], None).unwrap_err();
        assert!(matches!(err, DecodeError::BufferTooSmall { expected: 16, .. }));
        // Stride below the row width is invalid.
        assert!(from_linear16(PixelFormat::Rgb565, 4, 1, &[0; 8], Some(6)).is_err());
    }

    #[test]
    fn format_width_mismatch_is_rejected() {
        assert!(from_linear8(PixelFormat::Rgb565, 1, 1, &[0; 2], None).is_err());
        assert!(from_linear16(PixelFormat::L8, 1, 1, &[0; 2], None).is_err());
        assert!(from_linear32(PixelFormat::Rgb888, 1, 1, &[0; 4], None).is_err());
    }
}
