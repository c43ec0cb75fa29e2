//! Pixel conversion primitives
//!
//! Converters from packed source formats to host-endian ARGB32
//! (`0xAARRGGBB`). Channel expansion replicates the high bits into the low
//! bits so that full-scale values map to 0xFF exactly.

/// 2-bit alpha expansion table
const A2_LOOKUP: [u32; 4] = [0x0000_0000, 0x5500_0000, 0xAA00_0000, 0xFF00_0000];

/// 3-bit alpha expansion table
const A3_LOOKUP: [u32; 8] = [
    0x0000_0000,
    0x2400_0000,
    0x4900_0000,
    0x6D00_0000,
    0x9200_0000,
    0xB600_0000,
    0xDB00_0000,
    0xFF00_0000,
];

pub(crate) const fn rgb565_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let mut argb = 0xFF00_0000;
    argb |= ((px << 8) & 0xF8_0000) | ((px << 3) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0007;
    argb | ((px << 5) & 0x00_FC00) | ((px >> 1) & 0x00_0300)
}

pub(crate) const fn bgr565_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let mut argb = 0xFF00_0000;
    argb |= ((px << 19) & 0xF8_0000) | ((px >> 8) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0007;
    argb | ((px << 5) & 0x00_FC00) | ((px >> 1) & 0x00_0300)
}

pub(crate) const fn rgb555_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let mut argb =
        0xFF00_0000 | ((px << 9) & 0xF8_0000) | ((px << 6) & 0x00_F800) | ((px << 3) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0707;
    argb
}

pub(crate) const fn bgr555_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let mut argb =
        0xFF00_0000 | ((px << 19) & 0xF8_0000) | ((px << 6) & 0x00_F800) | ((px >> 7) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0707;
    argb
}

pub(crate) const fn argb1555_to_argb32(px: u16) -> u32 {
    let px32 = px as u32;
    let mut argb = ((px32 << 9) & 0xF8_0000) | ((px32 << 6) & 0x00_F800) | ((px32 << 3) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0707;
    if px & 0x8000 != 0 {
        argb |= 0xFF00_0000;
    }
    argb
}

pub(crate) const fn abgr1555_to_argb32(px: u16) -> u32 {
    let px32 = px as u32;
    let mut argb =
        ((px32 << 19) & 0xF8_0000) | ((px32 << 6) & 0x00_F800) | ((px32 >> 7) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0707;
    if px & 0x8000 != 0 {
        argb |= 0xFF00_0000;
    }
    argb
}

pub(crate) const fn rgba5551_to_argb32(px: u16) -> u32 {
    let px32 = px as u32;
    let mut argb = ((px32 << 8) & 0xF8_0000) | ((px32 << 5) & 0x00_F800) | ((px32 << 2) & 0x00_00F8);
    argb |= (argb >> 5) & 0x07_0707;
    if px & 0x0001 != 0 {
        argb |= 0xFF00_0000;
    }
    argb
}

pub(crate) const fn argb4444_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let argb = (px & 0x000F) | ((px & 0x00F0) << 4) | ((px & 0x0F00) << 8) | ((px & 0xF000) << 12);
    argb | (argb << 4)
}

pub(crate) const fn abgr4444_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let argb =
        ((px & 0x000F) << 16) | ((px & 0x00F0) << 4) | ((px & 0x0F00) >> 8) | ((px & 0xF000) << 12);
    argb | (argb << 4)
}

pub(crate) const fn rgba4444_to_argb32(px: u16) -> u32 {
    let px = px as u32;
    let argb =
        ((px & 0x000F) << 24) | ((px & 0x00F0) >> 4) | (px & 0x0F00) | ((px & 0xF000) << 4);
    argb | (argb << 4)
}

/// GameCube-style RGB5A3: opaque bit selects RGB555 or ARGB3444.
/// PVRTC block color A uses the same layout.
pub(crate) const fn rgb5a3_to_argb32(px: u16) -> u32 {
    if px & 0x8000 != 0 {
        let px32 = px as u32;
        let mut argb = 0xFF00_0000
            | ((px32 << 3) & 0x00_00F8)
            | ((px32 << 6) & 0x00_F800)
            | ((px32 << 9) & 0xF8_0000);
        argb |= (argb >> 5) & 0x07_0707;
        argb
    } else {
        let px32 = px as u32;
        let mut argb = (px32 & 0x000F) | ((px32 & 0x00F0) << 4) | ((px32 & 0x0F00) << 8);
        argb |= argb << 4;
        argb | A3_LOOKUP[((px >> 12) & 0x07) as usize]
    }
}

pub(crate) const fn l8_to_argb32(px: u8) -> u32 {
    let px = px as u32;
    0xFF00_0000 | px | (px << 8) | (px << 16)
}

pub(crate) const fn a8_to_argb32(px: u8) -> u32 {
    (px as u32) << 24
}

pub(crate) const fn r8_to_argb32(px: u8) -> u32 {
    0xFF00_0000 | ((px as u32) << 16)
}

pub(crate) const fn l16_to_argb32(px: u16) -> u32 {
    l8_to_argb32((px >> 8) as u8)
}

pub(crate) const fn a8l8_to_argb32(px: u16) -> u32 {
    let mut i = (px & 0x00FF) as u32;
    i |= (i << 8) | (i << 16);
    i | (((px & 0xFF00) as u32) << 16)
}

pub(crate) const fn l8a8_to_argb32(px: u16) -> u32 {
    let mut i = (px & 0xFF00) as u32;
    i |= (i << 8) | (i >> 8);
    i | (((px & 0x00FF) as u32) << 24)
}

pub(crate) const fn rg88_to_argb32(px: u16) -> u32 {
    0xFF00_0000 | ((px as u32) << 8)
}

pub(crate) const fn gr88_to_argb32(px: u16) -> u32 {
    0xFF00_0000 | ((px.swap_bytes() as u32) << 8)
}

pub(crate) const fn g16r16_to_argb32(px: u32) -> u32 {
    // Truncates both channels to their top 8 bits.
    0xFF00_0000 | ((px << 8) & 0x00FF_0000) | ((px >> 16) & 0x0000_FF00)
}

pub(crate) const fn a2r10g10b10_to_argb32(px: u32) -> u32 {
    ((px >> 6) & 0xFF_0000)
        | ((px >> 4) & 0x00_FF00)
        | ((px >> 2) & 0x00_00FF)
        | A2_LOOKUP[(px >> 30) as usize]
}

pub(crate) const fn a2b10g10r10_to_argb32(px: u32) -> u32 {
    ((px << 14) & 0xFF_0000)
        | ((px >> 4) & 0x00_FF00)
        | ((px >> 22) & 0x00_00FF)
        | A2_LOOKUP[(px >> 30) as usize]
}

/// Shared-exponent HDR (E5B9G9R9 / RGB9_E5) to LDR ARGB32.
pub(crate) fn rgb9_e5_to_argb32(px: u32) -> u32 {
    const EXP_BIAS: i32 = 15;
    const MANTISSA_BITS: i32 = 9;
    let e = (px >> 27) as i32 - EXP_BIAS - MANTISSA_BITS;
    let scale = f32::from_bits(((e + 127) as u32) << 23);

    let to8 = |m: u32| -> u32 {
        let f = m as f32 * scale;
        if f <= 0.0 {
            0
        } else if f >= 1.0 {
            255
        } else {
            (f * 256.0) as u32
        }
    };
    0xFF00_0000 | (to8(px & 0x1FF) << 16) | (to8((px >> 9) & 0x1FF) << 8) | to8((px >> 18) & 0x1FF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_expands_to_ff() {
        assert_eq!(rgb565_to_argb32(0xFFFF), 0xFFFFFFFF);
        assert_eq!(rgb555_to_argb32(0x7FFF), 0xFFFFFFFF);
        assert_eq!(argb4444_to_argb32(0xFFFF), 0xFFFFFFFF);
        assert_eq!(rgba5551_to_argb32(0xFFFF), 0xFFFFFFFF);
        assert_eq!(l8_to_argb32(0xFF), 0xFFFFFFFF);
    }

    #[test]
    fn zero_is_transparent_or_black() {
        assert_eq!(rgb565_to_argb32(0), 0xFF000000);
        assert_eq!(argb1555_to_argb32(0), 0x00000000);
        assert_eq!(a8_to_argb32(0), 0x00000000);
    }

    #[test]
    fn rgb565_channel_placement() {
        // Pure red, green, blue
        assert_eq!(rgb565_to_argb32(0xF800), 0xFFFF0000);
        assert_eq!(rgb565_to_argb32(0x07E0), 0xFF00FF00);
        assert_eq!(rgb565_to_argb32(0x001F), 0xFF0000FF);
    }

    #[test]
    fn rgb5a3_opaque_bit_selects_layout() {
        // Opaque: RGB555
        assert_eq!(rgb5a3_to_argb32(0xFFFF), 0xFFFFFFFF);
        // Translucent: ARGB3444 with 3-bit alpha
        assert_eq!(rgb5a3_to_argb32(0x7FFF), 0xFFFFFFFF);
        assert_eq!(rgb5a3_to_argb32(0x0000), 0x00000000);
    }

    #[test]
    fn luminance_replicates_channels() {
        assert_eq!(l8_to_argb32(0x42), 0xFF424242);
        assert_eq!(a8l8_to_argb32(0x80FF), 0x80FFFFFF);
        assert_eq!(l16_to_argb32(0x1234), 0xFF121212);
    }

    #[test]
    fn rgb9_e5_unit_values() {
        // r=g=b: mantissa 256 with exponent 15 is 256 * 2^(15-15-9) = 0.5,
        // mid gray; just check LDR range
        let px = (15 << 27) | (256 << 18) | (256 << 9) | 256;
        let argb = rgb9_e5_to_argb32(px);
        assert_eq!(argb >> 24, 0xFF);
        let r = (argb >> 16) & 0xFF;
        assert!((0x70..=0x90).contains(&r));
    }
}
