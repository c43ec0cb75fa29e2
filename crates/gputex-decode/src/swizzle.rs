//! Xbox texture unswizzling
//!
//! Xbox textures interleave the X and Y coordinate bits into a single
//! offset (a Morton-style ordering). Non-square textures exhaust one
//! coordinate's bits first, after which the remaining bits of the other
//! coordinate pack contiguously.

use crate::error::{DecodeError, DecodeResult};

/// Build the bit masks that mark which offset bits belong to the X and Y
/// coordinates for a `width` x `height` swizzled texture.
#[must_use]
pub fn generate_swizzle_masks(width: u32, height: u32) -> (u32, u32) {
    let mut mask_x = 0;
    let mut mask_y = 0;
    let mut bit = 1;
    let mut mask_bit = 1;
    loop {
        let mut done = true;
        if bit < width {
            mask_x |= mask_bit;
            mask_bit <<= 1;
            done = false;
        }
        if bit < height {
            mask_y |= mask_bit;
            mask_bit <<= 1;
            done = false;
        }
        bit <<= 1;
        if done {
            break;
        }
    }
    (mask_x, mask_y)
}

/// Scatter the bits of `value` into the set positions of `pattern`.
///
/// With pattern `11010100100` and value bits `abcd`, the result is
/// `ab0c0d00100`-style placement: each value bit lands on the next set
/// pattern bit from the bottom up.
#[must_use]
pub fn fill_pattern(pattern: u32, value: u32) -> u32 {
    let mut result = 0;
    let mut value = value;
    let mut bit = 1u32;
    while value != 0 && bit != 0 {
        if pattern & bit != 0 {
            if value & 1 != 0 {
                result |= bit;
            }
            value >>= 1;
        }
        bit <<= 1;
    }
    result
}

/// Byte offset of pixel (x, y) within a swizzled texture.
#[must_use]
pub fn swizzled_offset(x: u32, y: u32, mask_x: u32, mask_y: u32, bytes_per_pixel: u32) -> usize {
    (bytes_per_pixel as usize) * ((fill_pattern(mask_x, x) | fill_pattern(mask_y, y)) as usize)
}

/// Unswizzle a texture into linear row-major order.
pub fn unswizzle(
    src: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> DecodeResult<Vec<u8>> {
    let bpp = bytes_per_pixel as usize;
    let expected = (width as usize) * (height as usize) * bpp;
    if src.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: src.len(),
        });
    }

    let (mask_x, mask_y) = generate_swizzle_masks(width, height);
    let mut dst = vec![0u8; expected];
    let row_pitch = (width as usize) * bpp;
    for y in 0..height {
        for x in 0..width {
            let src_off = swizzled_offset(x, y, mask_x, mask_y, bytes_per_pixel);
            let dst_off = (y as usize) * row_pitch + (x as usize) * bpp;
            if src_off + bpp > src.len() {
                return Err(DecodeError::BufferTooSmall {
                    expected: src_off + bpp,
                    actual: src.len(),
                });
            }
            dst[dst_off..dst_off + bpp].copy_from_slice(&src[src_off..src_off + bpp]);
        }
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn square_masks_interleave() {
        let (mx, my) = generate_swizzle_masks(8, 8);
        assert_eq!(mx, 0b010101);
        assert_eq!(my, 0b101010);
        assert_eq!(mx ^ my, 0b111111);
    }

    #[test]
    fn wide_texture_packs_leftover_x_bits() {
        // 16x4: two interleaved bit pairs, then x bits pack at the top.
        let (mx, my) = generate_swizzle_masks(16, 4);
        assert_eq!(mx, 0b110101);
        assert_eq!(my, 0b001010);
    }

    #[test]
    fn fill_pattern_scatters_value_bits() {
        assert_eq!(fill_pattern(0b010101, 0b111), 0b010101);
        assert_eq!(fill_pattern(0b010101, 0b101), 0b010001);
        // Value bit 3 lands on the fourth set pattern bit (bit 5).
        assert_eq!(fill_pattern(0b110101, 0b1000), 0b100000);
    }

    #[test]
    fn unswizzle_4x4_single_byte() {
        // Morton order for 4x4: offset = y1 x1 y0 x0.
        let mut src = [0u8; 16];
        for y in 0..4u32 {
            for x in 0..4u32 {
                let off = ((y & 1) << 1 | (x & 1) | (y & 2) << 2 | (x & 2) << 1) as usize;
                src[off] = (y * 4 + x) as u8;
            }
        }
        let dst = unswizzle(&src, 4, 4, 1).unwrap();
        let linear: Vec<u8> = (0..16).collect();
        assert_eq!(dst, linear);
    }

    #[test]
    fn unswizzle_1x1_is_identity() {
        assert_eq!(unswizzle(&[0xAB], 1, 1, 1).unwrap(), vec![0xAB]);
    }

    #[test]
    fn unswizzle_rejects_short_buffer() {
        assert!(matches!(
            unswizzle(&[0u8; 15], 4, 4, 1),
            Err(DecodeError::BufferTooSmall { .. })
        ));
    }
}
