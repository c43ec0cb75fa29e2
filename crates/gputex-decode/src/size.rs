//! Image size and stride arithmetic
//!
//! Container parsers use these results both to validate the remaining file
//! length and to step through mipmap chains, so there is zero tolerance for
//! off-by-one errors. Failure is reported as `None`; callers must treat it
//! as "cannot decode" and abort the read.

use crate::MAX_DIMENSION;

/// Size expansion opcode for a pixel format.
///
/// Describes how to derive the byte length of one image plane from its
/// pixel dimensions. Linear formats multiply by bytes-per-pixel;
/// block-compressed formats align to the block footprint first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOp {
    /// 1 byte per pixel
    None,
    /// 2 bytes per pixel
    Multiply2,
    /// 3 bytes per pixel
    Multiply3,
    /// 4 bytes per pixel
    Multiply4,
    /// 6 bytes per pixel
    Multiply6,
    /// 8 bytes per pixel
    Multiply8,
    /// 12 bytes per pixel
    Multiply12,
    /// 16 bytes per pixel
    Multiply16,
    /// 4-bpp-equivalent without block alignment (dimensions pre-validated)
    Divide2,
    /// 2-bpp-equivalent without block alignment
    Divide4,
    /// 4x4 blocks at 8 bits per pixel (DXT3/5, ETC2 RGBA, BC7, ...)
    Align4,
    /// 4x4 blocks at 4 bits per pixel (DXT1, ETC1, BC4, ...)
    Align4Divide2,
    /// 8x8 blocks at 2 bits per pixel
    Align8Divide4,
}

/// Round `value` up to a multiple of `alignment` (a power of two).
pub const fn align(alignment: u32, value: u32) -> u32 {
    (value + (alignment - 1)) & !(alignment - 1)
}

/// Round up to the next power of two (identity for powers of two).
pub const fn next_pow2(value: u32) -> u32 {
    if value <= 1 {
        return 1;
    }
    1 << (32 - (value - 1).leading_zeros())
}

const fn dims_ok(width: u32, height: u32) -> bool {
    width != 0 && width <= MAX_DIMENSION && height <= MAX_DIMENSION
}

/// Byte length of one image plane under `op`.
///
/// A zero height is treated as 1 (1-D texture). Returns `None` for a zero
/// width or dimensions above the hard ceiling.
pub fn calc_image_size(op: ExpandOp, width: u32, height: u32) -> Option<usize> {
    if !dims_ok(width, height) {
        return None;
    }
    let height = if height == 0 { 1 } else { height };
    let (w, h) = (width as usize, height as usize);
    let size = match op {
        ExpandOp::None => w * h,
        ExpandOp::Multiply2 => w * h * 2,
        ExpandOp::Multiply3 => w * h * 3,
        ExpandOp::Multiply4 => w * h * 4,
        ExpandOp::Multiply6 => w * h * 6,
        ExpandOp::Multiply8 => w * h * 8,
        ExpandOp::Multiply12 => w * h * 12,
        ExpandOp::Multiply16 => w * h * 16,
        ExpandOp::Divide2 => w * h / 2,
        ExpandOp::Divide4 => w * h / 4,
        ExpandOp::Align4 => (align(4, width) as usize) * (align(4, height) as usize),
        ExpandOp::Align4Divide2 => (align(4, width) as usize) * (align(4, height) as usize) / 2,
        ExpandOp::Align8Divide4 => (align(8, width) as usize) * (align(8, height) as usize) / 4,
    };
    Some(size)
}

/// Byte length of a linear image with an explicit bytes-per-pixel and
/// optional row alignment (KTX pads rows of non-block formats to 4 bytes).
pub fn calc_image_size_linear(
    bytes_per_pixel: u32,
    row_alignment: u32,
    width: u32,
    height: u32,
) -> Option<usize> {
    if !dims_ok(width, height) || bytes_per_pixel == 0 {
        return None;
    }
    let height = if height == 0 { 1 } else { height };
    let row = if row_alignment > 1 {
        align(row_alignment, width * bytes_per_pixel)
    } else {
        width * bytes_per_pixel
    };
    Some(row as usize * height as usize)
}

/// Byte length of a PVRTC image, rounding each axis up to a power of two.
///
/// PVRTC requires power-of-two dimensions; containers storing NPOT PVRTC
/// data pad to the next power of two and record the logical size as rescale
/// dimensions. The minimum footprint is one block column/row: 16x8 for
/// 2bpp (8x4 blocks), 8x8 for 4bpp (4x4 blocks).
pub fn calc_image_size_pvrtc_pot(is_2bpp: bool, width: u32, height: u32) -> Option<usize> {
    if !dims_ok(width, height) {
        return None;
    }
    let height = if height == 0 { 1 } else { height };
    let (min_w, min_h) = if is_2bpp { (16, 8) } else { (8, 8) };
    let w = next_pow2(width).max(min_w) as usize;
    let h = next_pow2(height).max(min_h) as usize;
    let bits = if is_2bpp { w * h * 2 } else { w * h * 4 };
    Some(bits / 8)
}

/// Validate an ASTC 2D block footprint.
///
/// Only the 14 footprints defined by the ASTC LDR profile are legal.
pub const fn is_valid_astc_block(block_x: u8, block_y: u8) -> bool {
    matches!(
        (block_x, block_y),
        (4, 4)
            | (5, 4)
            | (5, 5)
            | (6, 5)
            | (6, 6)
            | (8, 5)
            | (8, 6)
            | (8, 8)
            | (10, 5)
            | (10, 6)
            | (10, 8)
            | (10, 10)
            | (12, 10)
            | (12, 12)
    )
}

/// Byte length of an ASTC image: one 128-bit block per footprint tile.
pub fn calc_image_size_astc(width: u32, height: u32, block_x: u8, block_y: u8) -> Option<usize> {
    if !dims_ok(width, height) || !is_valid_astc_block(block_x, block_y) {
        return None;
    }
    let height = if height == 0 { 1 } else { height };
    let bx = width.div_ceil(u32::from(block_x)) as usize;
    let by = height.div_ceil(u32::from(block_y)) as usize;
    Some(bx * by * 16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn align_rounds_up() {
        assert_eq!(align(4, 0), 0);
        assert_eq!(align(4, 1), 4);
        assert_eq!(align(4, 4), 4);
        assert_eq!(align(4, 5), 8);
        assert_eq!(align(8, 9), 16);
    }

    #[test]
    fn next_pow2_rounds_up() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(2), 2);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(20), 32);
        assert_eq!(next_pow2(32), 32);
        assert_eq!(next_pow2(33), 64);
    }

    #[test]
    fn dxt1_sizes_align_to_blocks() {
        // 16x16 DXT1: (16/4)*(16/4)*8 = 128 bytes
        assert_eq!(calc_image_size(ExpandOp::Align4Divide2, 16, 16), Some(128));
        // NPOT dims round up to block multiples
        assert_eq!(calc_image_size(ExpandOp::Align4Divide2, 17, 17), Some(200));
        assert_eq!(calc_image_size(ExpandOp::Align4, 5, 5), Some(64));
    }

    #[test]
    fn linear_sizes_multiply() {
        assert_eq!(calc_image_size(ExpandOp::Multiply4, 16, 16), Some(1024));
        assert_eq!(calc_image_size(ExpandOp::None, 7, 3), Some(21));
        assert_eq!(calc_image_size(ExpandOp::Multiply3, 5, 5), Some(75));
    }

    #[test]
    fn height_zero_is_one_dimensional() {
        assert_eq!(calc_image_size(ExpandOp::Multiply4, 16, 0), Some(64));
        assert_eq!(calc_image_size_pvrtc_pot(false, 8, 0), Some(32));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert_eq!(calc_image_size(ExpandOp::None, 0, 16), None);
        assert_eq!(calc_image_size(ExpandOp::None, 32769, 16), None);
        assert_eq!(calc_image_size(ExpandOp::None, 16, 32769), None);
        assert_eq!(calc_image_size_astc(0, 16, 4, 4), None);
    }

    #[test]
    fn ktx_row_alignment() {
        // RGB24 at width 5: rows padded to 16 bytes
        assert_eq!(calc_image_size_linear(3, 4, 5, 2), Some(32));
        // RGBA32 rows are naturally aligned
        assert_eq!(calc_image_size_linear(4, 4, 5, 2), Some(40));
        assert_eq!(calc_image_size_linear(1, 1, 5, 2), Some(10));
    }

    #[test]
    fn pvrtc_pot_rounds_up_npot_input() {
        // 20x20 4bpp -> 32x32 physical, 512 bytes
        assert_eq!(calc_image_size_pvrtc_pot(false, 20, 20), Some(512));
        // 2bpp variant of the same texture
        assert_eq!(calc_image_size_pvrtc_pot(true, 20, 20), Some(256));
        // Minimum block footprint applies
        assert_eq!(calc_image_size_pvrtc_pot(false, 2, 2), Some(32));
        assert_eq!(calc_image_size_pvrtc_pot(true, 2, 2), Some(32));
    }

    #[test]
    fn astc_block_sizes() {
        // 40x40 at 8x8 blocks: 5*5*16 = 400 bytes
        assert_eq!(calc_image_size_astc(40, 40, 8, 8), Some(400));
        assert_eq!(calc_image_size_astc(40, 40, 12, 12), Some(16 * 4 * 4));
        assert_eq!(calc_image_size_astc(4, 4, 4, 4), Some(16));
        // 7x3 is not a legal footprint
        assert_eq!(calc_image_size_astc(40, 40, 7, 3), None);
    }

    proptest! {
        #[test]
        fn block_sizes_cover_linear_equivalent(w in 1u32..512, h in 1u32..512) {
            // Aligned block size is never smaller than the unaligned ratio.
            let aligned = calc_image_size(ExpandOp::Align4Divide2, w, h).unwrap();
            prop_assert!(aligned >= (w as usize * h as usize) / 2);
            prop_assert_eq!(aligned % 8, 0);
        }

        #[test]
        fn pvrtc_pot_result_is_pot_sized(w in 1u32..2048, h in 1u32..2048) {
            let size = calc_image_size_pvrtc_pot(false, w, h).unwrap();
            let phys = (next_pow2(w).max(8) as usize) * (next_pow2(h).max(8) as usize);
            prop_assert_eq!(size, phys / 2);
        }

        #[test]
        fn astc_never_undercounts(w in 1u32..2048, h in 1u32..2048) {
            let size = calc_image_size_astc(w, h, 8, 8).unwrap();
            prop_assert!(size * 4 >= (w as usize) * (h as usize) / 4);
            prop_assert_eq!(size % 16, 0);
        }
    }
}
