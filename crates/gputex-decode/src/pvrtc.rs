//! PVRTC 2bpp / 4bpp block decoding
//!
//! Each 8-byte block holds a 32-bit modulation word and two block colors.
//! Color A is RGB5A3-style (opaque bit selects RGB555 or ARGB3444); color B
//! loses one blue bit to the mode flag. Blocks are stored in twiddled
//! (Morton) order, so both dimensions must be powers of two; callers pad
//! NPOT textures up front and crop afterwards.

use crate::conv::rgb5a3_to_argb32;
use crate::error::{DecodeError, DecodeResult};
use crate::image::{DecodedImage, Sbit};
use crate::size::calc_image_size;
use crate::size::ExpandOp;

/// Convert block color B: RGB554 when opaque, ARGB3443 otherwise.
fn color_b_to_argb32(px: u16) -> u32 {
    let px32 = u32::from(px);
    if px & 0x8000 != 0 {
        let mut argb = 0xFF00_0000;
        argb |= ((px32 << 3) & 0x0000_F0) | ((px32 >> 1) & 0x0000_0F); // B
        argb |= ((px32 << 6) & 0x00_F800) | ((px32 << 1) & 0x00_0700); // G
        argb |= ((px32 << 9) & 0xF8_0000) | ((px32 << 4) & 0x07_0000); // R
        argb
    } else {
        let mut argb = ((px32 & 0x00F0) << 4) | ((px32 & 0x0F00) << 8);
        argb |= argb << 4;

        let mut b = ((px as u8) << 4) & 0xE0;
        b |= b >> 3;
        b |= b >> 3;

        let mut a = ((px >> 7) as u8) & 0xE0;
        a |= a >> 3;
        a |= a >> 3;

        argb | (u32::from(a) << 24) | u32::from(b)
    }
}

#[derive(Clone, Copy)]
struct ColorRgba {
    b: i32,
    g: i32,
    r: i32,
    a: i32,
}

fn clamp_rgba(c: ColorRgba) -> u32 {
    let cl = |v: i32| v.clamp(0, 255) as u32;
    (cl(c.a) << 24) | (cl(c.r) << 16) | (cl(c.g) << 8) | cl(c.b)
}

const fn channels(px: u32) -> ColorRgba {
    ColorRgba {
        b: (px & 0xFF) as i32,
        g: ((px >> 8) & 0xFF) as i32,
        r: ((px >> 16) & 0xFF) as i32,
        a: (px >> 24) as i32,
    }
}

/// Mode-0 interpolation: Output = A + Mod*(B - A).
///
/// Modulation value 2 is the punch-through case: half-weight color with
/// alpha forced to zero.
fn interp_colors_mode0(color: [u32; 2], mod_data: u32) -> u32 {
    if mod_data == 0 {
        return color[0];
    }
    let c0 = channels(color[0]);
    let c1 = channels(color[1]);
    let mut d = ColorRgba {
        b: c1.b - c0.b,
        g: c1.g - c0.g,
        r: c1.r - c0.r,
        a: 0,
    };
    match mod_data {
        1 => {
            d.b /= 2;
            d.g /= 2;
            d.r /= 2;
            d.a = (c1.a - c0.a) / 2 + c0.a;
        }
        2 => {
            d.b /= 2;
            d.g /= 2;
            d.r /= 2;
        }
        _ => {
            d.a = c1.a;
        }
    }
    d.b += c0.b;
    d.g += c0.g;
    d.r += c0.r;
    clamp_rgba(d)
}

/// Mode-1 interpolation with the 3/8 and 5/8 weight steps.
fn interp_colors_mode1(color: [u32; 2], mod_data: u32) -> u32 {
    if mod_data == 0 {
        return color[0];
    }
    let c0 = channels(color[0]);
    let c1 = channels(color[1]);
    let mut d = ColorRgba {
        b: c1.b - c0.b,
        g: c1.g - c0.g,
        r: c1.r - c0.r,
        a: c1.a - c0.a,
    };
    match mod_data {
        1 => {
            d.b = d.b * 8 / 3;
            d.g = d.g * 8 / 3;
            d.r = d.r * 8 / 3;
            d.a = d.a * 8 / 3;
        }
        2 => {
            d.b = d.b * 8 / 5;
            d.g = d.g * 8 / 5;
            d.r = d.r * 8 / 5;
            d.a = d.a * 8 / 5;
        }
        _ => {}
    }
    d.b += c0.b;
    d.g += c0.g;
    d.r += c0.r;
    d.a += c0.a;
    clamp_rgba(d)
}

/// Interleave the low 10 bits of a coordinate with zero bits.
const fn twiddle_spread(v: u32) -> u32 {
    (v & 1)
        | ((v & 2) << 1)
        | ((v & 4) << 2)
        | ((v & 8) << 3)
        | ((v & 16) << 4)
        | ((v & 32) << 5)
        | ((v & 64) << 6)
        | ((v & 128) << 7)
        | ((v & 256) << 8)
        | ((v & 512) << 9)
}

/// Morton (twiddled) block index for block coordinates (x, y).
///
/// The block grid must be power-of-two on both axes. Rectangular grids
/// interleave bits up to the shorter axis; the leftover bits of the
/// longer axis pack linearly above the interleaved part.
const fn twiddle_index(x: u32, y: u32, blocks_w: u32, blocks_h: u32) -> u32 {
    let min = if blocks_w < blocks_h { blocks_w } else { blocks_h };
    let rest = if blocks_w > blocks_h { x / min } else { y / min };
    twiddle_spread(y & (min - 1)) | (twiddle_spread(x & (min - 1)) << 1) | (rest * min * min)
}

struct Block {
    mod_data: u32,
    color: [u32; 2],
    mode1: bool,
}

fn read_block(buf: &[u8], index: u32) -> Block {
    let b = &buf[index as usize * 8..][..8];
    let color_b = u16::from_le_bytes([b[4], b[5]]);
    Block {
        mod_data: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        color: [
            rgb5a3_to_argb32(u16::from_le_bytes([b[6], b[7]])),
            color_b_to_argb32(color_b),
        ],
        mode1: color_b & 0x01 != 0,
    }
}

/// Decode a PVRTC 2bpp image. Dimensions must be powers of two, at
/// least one 8x4 tile; the twiddled block order is only defined on a
/// power-of-two grid.
pub fn decode_pvrtc_2bpp(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    if width < 8 || height < 4 || !width.is_power_of_two() || !height.is_power_of_two() {
        return Err(DecodeError::DimensionConstraint {
            codec: "PVRTC 2bpp",
            width,
            height,
        });
    }
    let expected = calc_image_size(ExpandOp::Divide4, width, height)
        .ok_or(DecodeError::InvalidDimensions { width, height })?;
    if buf.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: buf.len(),
        });
    }

    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 32];
    for y in 0..height / 4 {
        for x in 0..width / 8 {
            let block = read_block(buf, twiddle_index(x, y, width / 8, height / 4));
            let mut mod_data = block.mod_data;
            if block.mode1 {
                // Each 2-bit value covers a pair of pixels.
                for pair in tile.chunks_exact_mut(2) {
                    let interp = interp_colors_mode1(block.color, mod_data & 3);
                    pair[0] = interp;
                    pair[1] = interp;
                    mod_data >>= 2;
                }
            } else {
                // One bit per pixel: 0 selects color A, 1 selects color B.
                for px in &mut tile {
                    *px = block.color[(mod_data & 1) as usize];
                    mod_data >>= 1;
                }
            }
            img.blit_tile(&tile, 8, 4, x, y);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 8, 0, 8));
    Ok(img)
}

/// Decode a PVRTC 4bpp image. Dimensions must be powers of two, at
/// least one 4x4 tile; the twiddled block order is only defined on a
/// power-of-two grid.
pub fn decode_pvrtc_4bpp(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    if width < 4 || height < 4 || !width.is_power_of_two() || !height.is_power_of_two() {
        return Err(DecodeError::DimensionConstraint {
            codec: "PVRTC 4bpp",
            width,
            height,
        });
    }
    let expected = calc_image_size(ExpandOp::Divide2, width, height)
        .ok_or(DecodeError::InvalidDimensions { width, height })?;
    if buf.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: buf.len(),
        });
    }

    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for y in 0..height / 4 {
        for x in 0..width / 4 {
            let block = read_block(buf, twiddle_index(x, y, width / 4, height / 4));
            let mut mod_data = block.mod_data;
            let interp = if block.mode1 {
                interp_colors_mode1
            } else {
                interp_colors_mode0
            };
            for px in &mut tile {
                *px = interp(block.color, mod_data & 3);
                mod_data >>= 2;
            }
            img.blit_tile(&tile, 4, 4, x, y);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 8, 0, 8));
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Block with opaque white color A, opaque black color B, given
    /// modulation word and mode bit.
    fn block(mod_data: u32, mode1: bool) -> [u8; 8] {
        let color_b: u16 = 0x8000 | u16::from(mode1);
        let color_a: u16 = 0xFFFF;
        let mut b = [0u8; 8];
        b[0..4].copy_from_slice(&mod_data.to_le_bytes());
        b[4..6].copy_from_slice(&color_b.to_le_bytes());
        b[6..8].copy_from_slice(&color_a.to_le_bytes());
        b
    }

    #[test]
    fn twiddle_interleaves_coordinates() {
        assert_eq!(twiddle_index(0, 0, 4, 4), 0);
        assert_eq!(twiddle_index(1, 0, 4, 4), 2);
        assert_eq!(twiddle_index(0, 1, 4, 4), 1);
        assert_eq!(twiddle_index(3, 3, 4, 4), 15);
        assert_eq!(twiddle_index(2, 1, 4, 4), 9);
    }

    #[test]
    fn twiddle_covers_rectangular_grids() {
        // Every index on a 4x2 grid must land inside the 8 blocks, once.
        let mut seen = [false; 8];
        for y in 0..2 {
            for x in 0..4 {
                let idx = twiddle_index(x, y, 4, 2) as usize;
                assert!(idx < 8);
                assert!(!seen[idx]);
                seen[idx] = true;
            }
        }
    }

    #[test]
    fn mode0_modulation_values() {
        // mod 0 -> color A, mod 3 -> color B.
        let white_black = [0xFFFFFFFF, 0xFF000000];
        assert_eq!(interp_colors_mode0(white_black, 0), 0xFFFFFFFF);
        assert_eq!(interp_colors_mode0(white_black, 3), 0xFF000000);
        // mod 1 -> midpoint; integer division truncates toward zero.
        let mid = interp_colors_mode0(white_black, 1);
        assert_eq!((mid >> 16) & 0xFF, 0x80);
        // mod 2 -> punch-through: alpha 0, color kept at half weight.
        let punch = interp_colors_mode0(white_black, 2);
        assert_eq!(punch >> 24, 0);
        assert_eq!((punch >> 16) & 0xFF, 0x80);
    }

    #[test]
    fn fourbpp_mode0_solid_block() {
        let img = decode_pvrtc_4bpp(4, 4, &block(0, false)).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFFFFFF));
        assert_eq!(img.sbit(), Some(Sbit::new(8, 8, 8, 0, 8)));
    }

    #[test]
    fn fourbpp_punch_through_alpha() {
        // All modulation values 2 in mode 0.
        let img = decode_pvrtc_4bpp(4, 4, &block(0xAAAA_AAAA, false)).unwrap();
        assert!(img.pixels().iter().all(|&px| px >> 24 == 0));
    }

    #[test]
    fn twobpp_mode0_selects_between_colors() {
        // Alternating bits: A, B, A, B...
        let img = decode_pvrtc_2bpp(8, 4, &block(0xAAAA_AAAA, false)).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFFFFFFFF));
        assert_eq!(img.pixel(1, 0), Some(0xFF000000));
    }

    #[test]
    fn twobpp_mode1_pairs_pixels() {
        // All 2-bit values 3 -> color B for every pixel pair.
        let img = decode_pvrtc_2bpp(8, 4, &block(0xFFFF_FFFF, true)).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFF000000));
    }

    #[test]
    fn rejects_non_tile_multiple_dimensions() {
        assert!(matches!(
            decode_pvrtc_4bpp(20, 16, &[0u8; 512]),
            Err(DecodeError::DimensionConstraint { .. })
        ));
        assert!(decode_pvrtc_2bpp(4, 4, &[0u8; 512]).is_err());
    }

    #[test]
    fn rejects_non_power_of_two_dimensions() {
        // Tile-multiple but not power-of-two; twiddled indexing would
        // run past the block grid.
        assert!(matches!(
            decode_pvrtc_4bpp(12, 16, &[0u8; 96]),
            Err(DecodeError::DimensionConstraint { .. })
        ));
        assert!(matches!(
            decode_pvrtc_2bpp(24, 8, &[0u8; 48]),
            Err(DecodeError::DimensionConstraint { .. })
        ));
    }

    #[test]
    fn rectangular_power_of_two_decodes() {
        // 16x8 4bpp: 4x2 block grid, 8 blocks.
        let mut buf = Vec::new();
        for _ in 0..8 {
            buf.extend_from_slice(&block(0, false));
        }
        let img = decode_pvrtc_4bpp(16, 8, &buf).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFFFFFF));
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            decode_pvrtc_4bpp(8, 8, &[0u8; 31]),
            Err(DecodeError::BufferTooSmall {
                expected: 32,
                actual: 31
            })
        ));
    }
}
