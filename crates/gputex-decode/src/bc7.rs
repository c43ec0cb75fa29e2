//! BC7 block decoding
//!
//! BC7 has eight block modes with different endpoint precisions, subset
//! counts and index widths, so the only fixed structure is the 128-bit
//! little-endian block itself. The block is held as two 64-bit halves and
//! shifted as each field is consumed.

use crate::error::{DecodeError, DecodeResult};
use crate::image::{DecodedImage, Sbit};
use crate::size::{ExpandOp, calc_image_size};

// Interpolation weights for 2-, 3- and 4-bit indexes.
const WEIGHT2: [u8; 4] = [0, 21, 43, 64];
const WEIGHT3: [u8; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHT4: [u8; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

// Each 32-bit value defines a partition as 16 two-bit subset selectors.
const BC7_2SUB: [u32; 64] = [
    0x50505050, 0x40404040, 0x54545454, 0x54505040, 0x50404000, 0x55545450, 0x55545040, 0x54504000,
    0x50400000, 0x55555450, 0x55544000, 0x54400000, 0x55555440, 0x55550000, 0x55555500, 0x55000000,
    0x55150100, 0x00004054, 0x15010000, 0x00405054, 0x00004050, 0x15050100, 0x05010000, 0x40505054,
    0x00404050, 0x05010100, 0x14141414, 0x05141450, 0x01155440, 0x00555500, 0x15014054, 0x05414150,
    0x44444444, 0x55005500, 0x11441144, 0x05055050, 0x05500550, 0x11114444, 0x41144114, 0x44111144,
    0x15055054, 0x01055040, 0x05041050, 0x05455150, 0x14414114, 0x50050550, 0x41411414, 0x00141400,
    0x00041504, 0x00105410, 0x10541000, 0x04150400, 0x50410514, 0x41051450, 0x05415014, 0x14054150,
    0x41050514, 0x41505014, 0x40011554, 0x54150140, 0x50505500, 0x00555050, 0x15151010, 0x54540404,
];

const BC7_3SUB: [u32; 64] = [
    0xAA685050, 0x6A5A5040, 0x5A5A4200, 0x5450A0A8, 0xA5A50000, 0xA0A05050, 0x5555A0A0, 0x5A5A5050,
    0xAA550000, 0xAA555500, 0xAAAA5500, 0x90909090, 0x94949494, 0xA4A4A4A4, 0xA9A59450, 0x2A0A4250,
    0xA5945040, 0x0A425054, 0xA5A5A500, 0x55A0A0A0, 0xA8A85454, 0x6A6A4040, 0xA4A45000, 0x1A1A0500,
    0x0050A4A4, 0xAAA59090, 0x14696914, 0x69691400, 0xA08585A0, 0xAA821414, 0x50A4A450, 0x6A5A0200,
    0xA9A58000, 0x5090A0A8, 0xA8A09050, 0x24242424, 0x00AA5500, 0x24924924, 0x24499224, 0x50A50A50,
    0x500AA550, 0xAAAA4444, 0x66660000, 0xA5A0A5A0, 0x50A050A0, 0x69286928, 0x44AAAA44, 0x66666600,
    0xAA444444, 0x54A854A8, 0x95809580, 0x96969600, 0xA85454A8, 0x80959580, 0xAA141414, 0x96960000,
    0xAAAA1414, 0xA05050A0, 0xA0A5A5A0, 0x96000000, 0x40804080, 0xA9A8A9A8, 0xAAAAAA44, 0x2A4A5254,
];

// Anchor indexes for the second subset in 2-subset modes.
const ANCHOR_2OF2: [u8; 64] = [
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 2, 8, 2, 2, 8, 8, 15, 2, 8,
    2, 2, 8, 8, 2, 2, 15, 15, 6, 8, 2, 8, 15, 15, 2, 8, 2, 2, 2, 15, 15, 6, 6, 2, 6, 8, 15, 15, 2,
    2, 15, 15, 15, 15, 15, 2, 2, 15,
];

// Anchor indexes for the second subset in 3-subset modes.
const ANCHOR_2OF3: [u8; 64] = [
    3, 3, 15, 15, 8, 3, 15, 15, 8, 8, 6, 6, 6, 5, 3, 3, 3, 3, 8, 15, 3, 3, 6, 10, 5, 8, 8, 6, 8,
    5, 15, 15, 8, 15, 3, 5, 6, 10, 8, 15, 15, 3, 15, 5, 15, 15, 15, 15, 3, 15, 5, 5, 5, 8, 5, 10,
    5, 10, 8, 13, 15, 12, 3, 3,
];

// Anchor indexes for the third subset in 3-subset modes.
const ANCHOR_3OF3: [u8; 64] = [
    15, 8, 8, 3, 15, 15, 3, 8, 15, 15, 15, 15, 15, 15, 15, 8, 15, 8, 15, 3, 15, 8, 15, 8, 3, 15,
    6, 10, 15, 15, 10, 8, 15, 3, 15, 10, 10, 8, 9, 10, 6, 15, 8, 15, 3, 6, 6, 8, 15, 3, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15, 3, 15, 15, 8,
];

const SUBSET_COUNT: [u8; 8] = [3, 2, 3, 2, 1, 1, 1, 2];
const PARTITION_BITS: [u8; 8] = [4, 6, 6, 6, 0, 0, 0, 6];
const ENDPOINT_COUNT: [u8; 8] = [6, 4, 6, 4, 2, 2, 2, 4];
const ENDPOINT_BITS: [u8; 8] = [4, 6, 5, 7, 5, 7, 7, 5];
const ALPHA_BITS: [u8; 8] = [0, 0, 0, 0, 6, 8, 7, 5];
const P_BIT_COUNT: [u8; 8] = [1, 1, 0, 1, 0, 0, 1, 1];
const INDEX_BITS: [u8; 8] = [3, 3, 2, 2, 0, 2, 4, 2];

fn interpolate_component(bits: u32, index: u32, e0: u8, e1: u8) -> u8 {
    if index == 0 {
        return e0;
    }
    if index == (1 << bits) - 1 {
        return e1;
    }
    let weight = u32::from(match bits {
        2 => WEIGHT2[index as usize],
        3 => WEIGHT3[index as usize],
        _ => WEIGHT4[index as usize],
    });
    (((64 - weight) * u32::from(e0) + weight * u32::from(e1) + 32) >> 6) as u8
}

fn anchor_index(partition: u8, subset: u8, subset_count: u8) -> u8 {
    if subset == 0 {
        return 0;
    }
    match subset_count {
        2 => ANCHOR_2OF2[partition as usize],
        3 => {
            if subset == 1 {
                ANCHOR_2OF3[partition as usize]
            } else {
                ANCHOR_3OF3[partition as usize]
            }
        }
        _ => 0,
    }
}

/// The 128-bit block as two halves, shifted as fields are consumed.
struct Bc7Block {
    lsb: u64,
    msb: u64,
}

impl Bc7Block {
    fn new(bytes: &[u8]) -> Self {
        let mut lsb = [0u8; 8];
        let mut msb = [0u8; 8];
        lsb.copy_from_slice(&bytes[0..8]);
        msb.copy_from_slice(&bytes[8..16]);
        Self {
            lsb: u64::from_le_bytes(lsb),
            msb: u64::from_le_bytes(msb),
        }
    }

    /// Right-shift both halves as one 128-bit value. `shamt` < 64.
    fn rshift128(&mut self, shamt: u32) {
        if shamt == 0 {
            return;
        }
        self.lsb >>= shamt;
        self.lsb |= self.msb << (64 - shamt);
        self.msb >>= shamt;
    }
}

fn decode_block(bytes: &[u8], tile: &mut [u32; 16]) -> DecodeResult<()> {
    let mut block = Bc7Block::new(bytes);

    // The mode number is the position of the lowest set bit.
    let dword0 = block.lsb as u32;
    if dword0 == 0 {
        return Err(DecodeError::UnsupportedFormat("BC7 block with no mode bit"));
    }
    let mode = dword0.trailing_zeros() as usize;
    if mode >= 8 {
        return Err(DecodeError::UnsupportedFormat("invalid BC7 block mode"));
    }
    block.rshift128(mode as u32 + 1);

    // Rotation selects a channel to swap with alpha after decode.
    let rotation_mode = if mode == 4 || mode == 5 {
        let r = (block.lsb & 3) as u8;
        block.rshift128(2);
        r
    } else {
        0
    };

    // Mode 4 has both 2-bit and 3-bit index planes; this bit picks which
    // one carries color and which carries alpha.
    let idx_mode_m4 = if mode == 4 {
        let b = block.lsb & 1;
        block.rshift128(1);
        b != 0
    } else {
        false
    };

    let mut partition = 0u8;
    let subset: u32 = if PARTITION_BITS[mode] != 0 {
        partition = (block.lsb & ((1 << PARTITION_BITS[mode]) - 1)) as u8;
        block.rshift128(u32::from(PARTITION_BITS[mode]));
        match SUBSET_COUNT[mode] {
            2 => BC7_2SUB[partition as usize],
            3 => BC7_3SUB[partition as usize],
            _ => 0,
        }
    } else {
        0
    };

    // Endpoint components are stored RRRR/GGGG/BBBB, MSB-aligned here.
    let mut endpoints = [[0u8; 3]; 6];
    let mut endpoint_bits = u32::from(ENDPOINT_BITS[mode]);
    let endpoint_count = usize::from(ENDPOINT_COUNT[mode]);
    let endpoint_mask = (1u64 << endpoint_bits) - 1;
    let endpoint_shamt = 8 - endpoint_bits;
    for comp in 0..3 {
        for ep in endpoints.iter_mut().take(endpoint_count) {
            ep[comp] = ((block.lsb & endpoint_mask) << endpoint_shamt) as u8;
            block.rshift128(endpoint_bits);
        }
    }

    let mut alpha = [255u8; 6];
    let mut alpha_bits = u32::from(ALPHA_BITS[mode]);
    if alpha_bits != 0 {
        let alpha_mask = (1u64 << alpha_bits) - 1;
        let alpha_shamt = 8 - alpha_bits;
        for a in alpha.iter_mut().take(endpoint_count) {
            *a = ((block.lsb & alpha_mask) << alpha_shamt) as u8;
            block.rshift128(alpha_bits);
        }
    }

    // P-bits extend the endpoint precision by one shared low bit.
    if P_BIT_COUNT[mode] != 0 {
        if mode == 1 {
            // Two P-bits shared across the endpoint pairs.
            for subset_idx in 0..2 {
                if block.lsb & (1 << subset_idx) != 0 {
                    for ep in &mut endpoints[subset_idx * 2..subset_idx * 2 + 2] {
                        for c in ep.iter_mut() {
                            *c |= 0x02;
                        }
                    }
                }
            }
            block.rshift128(2);
        } else {
            let p_ep_shamt = 7 - endpoint_bits;
            let mut lsb8 = block.lsb & 0xFF;
            for ep in endpoints.iter_mut().take(endpoint_count) {
                if lsb8 & 1 != 0 {
                    for c in ep.iter_mut() {
                        *c |= 1 << p_ep_shamt;
                    }
                }
                lsb8 >>= 1;
            }

            if alpha_bits > 0 {
                let p_a_shamt = 7 - alpha_bits;
                let mut lsb8 = block.lsb & 0xFF;
                for a in alpha.iter_mut().take(endpoint_count) {
                    *a |= ((lsb8 & 1) << p_a_shamt) as u8;
                    lsb8 >>= 1;
                }
                alpha_bits += 1;
            }

            block.rshift128(endpoint_count as u32);
        }
        endpoint_bits += 1;
    }

    // Replicate high bits to expand to full 8-bit components.
    if endpoint_bits < 8 {
        for ep in endpoints.iter_mut().take(endpoint_count) {
            for c in ep.iter_mut() {
                *c |= *c >> endpoint_bits;
            }
        }
    }
    if alpha_bits != 0 && alpha_bits < 8 {
        for a in alpha.iter_mut().take(endpoint_count) {
            *a |= *a >> alpha_bits;
        }
    }

    // Only index data remains; it fits in the shifted halves directly.
    let mut index_bits = u32::from(INDEX_BITS[mode]);
    let (mut idx_data, index_mask) = if mode == 4 {
        if idx_mode_m4 {
            // Color uses the 3-bit plane (50 bits consumed so far).
            index_bits = 3;
            ((block.msb << 33) | (block.lsb >> 31), 0x07u64)
        } else {
            index_bits = 2;
            (block.lsb & ((1 << 31) - 1), 0x03u64)
        }
    } else {
        (block.lsb, (1u64 << index_bits) - 1)
    };

    let subset_count = SUBSET_COUNT[mode];
    let mut anchors = [0u8; 3];
    for (i, anchor) in anchors.iter_mut().enumerate().skip(1) {
        *anchor = anchor_index(partition, i as u8, subset_count);
    }

    let mut rgb = [[0u8; 3]; 16];
    let mut subset_data = subset;
    for (i, px) in rgb.iter_mut().enumerate() {
        let subset_idx = (subset_data & 3) as usize;
        subset_data >>= 2;
        // The anchor pixel omits its highest index bit.
        let data_idx = if i == usize::from(anchors[subset_idx]) {
            let v = idx_data & (index_mask >> 1);
            idx_data >>= index_bits - 1;
            v
        } else {
            let v = idx_data & index_mask;
            idx_data >>= index_bits;
            v
        } as u32;

        let ep = subset_idx * 2;
        for c in 0..3 {
            px[c] = interpolate_component(index_bits, data_idx, endpoints[ep][c], endpoints[ep + 1][c]);
        }
    }

    let mut out_alpha = [255u8; 16];
    if mode == 4 {
        // The other index plane carries alpha.
        let (mut idx_data, index_bits, index_mask) = if idx_mode_m4 {
            (block.lsb & ((1 << 31) - 1), 2u32, 0x03u64)
        } else {
            ((block.msb << 33) | (block.lsb >> 31), 3u32, 0x07u64)
        };
        let mut subset_data = subset;
        for (i, a) in out_alpha.iter_mut().enumerate() {
            let subset_idx = (subset_data & 3) as usize;
            subset_data >>= 2;
            let data_idx = if i == usize::from(anchors[subset_idx]) {
                let v = idx_data & (index_mask >> 1);
                idx_data >>= index_bits - 1;
                v
            } else {
                let v = idx_data & index_mask;
                idx_data >>= index_bits;
                v
            } as u32;
            *a = interpolate_component(index_bits, data_idx, alpha[0], alpha[1]);
        }
    } else if alpha_bits != 0 {
        // Mode 5 stores separate alpha indexes after the color indexes;
        // the other alpha modes reuse the color indexes.
        let mut idx_data = if mode == 5 {
            block.lsb >> 31
        } else {
            block.lsb
        };
        let mut subset_data = subset;
        for (i, a) in out_alpha.iter_mut().enumerate() {
            let subset_idx = (subset_data & 3) as usize;
            subset_data >>= 2;
            let data_idx = if i == usize::from(anchors[subset_idx]) {
                let v = idx_data & (index_mask >> 1);
                idx_data >>= index_bits - 1;
                v
            } else {
                let v = idx_data & index_mask;
                idx_data >>= index_bits;
                v
            } as u32;
            let ep = subset_idx * 2;
            *a = interpolate_component(index_bits, data_idx, alpha[ep], alpha[ep + 1]);
        }
    }

    for (i, px) in tile.iter_mut().enumerate() {
        let [mut r, mut g, mut b] = rgb[i];
        let mut a = out_alpha[i];
        match rotation_mode {
            1 => std::mem::swap(&mut a, &mut r),
            2 => std::mem::swap(&mut a, &mut g),
            3 => std::mem::swap(&mut a, &mut b),
            _ => {}
        }
        *px = (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    }
    Ok(())
}

/// Decode a BC7 image.
pub fn decode_bc7(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let expected = calc_image_size(ExpandOp::Align4, width, height)
        .ok_or(DecodeError::InvalidDimensions { width, height })?;
    if buf.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: buf.len(),
        });
    }

    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    let bw = width.div_ceil(4);
    let bh = height.div_ceil(4);
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            decode_block(block, &mut tile)?;
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 8, 0, 8));
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Append `width` bits of `value` at `*offset` in a 128-bit block.
    fn put_bits(block: &mut u128, offset: &mut u32, width: u32, value: u64) {
        *block |= u128::from(value & ((1 << width) - 1)) << *offset;
        *offset += width;
    }

    /// Build a mode 5 block with the given endpoints; all indexes zero.
    fn mode5_block(rotation: u64, rgb0: [u64; 3], rgb1: [u64; 3], a0: u64, a1: u64) -> [u8; 16] {
        let mut block = 0u128;
        let mut off = 0;
        put_bits(&mut block, &mut off, 6, 0b10_0000); // mode 5
        put_bits(&mut block, &mut off, 2, rotation);
        for c in 0..3 {
            put_bits(&mut block, &mut off, 7, rgb0[c]);
            put_bits(&mut block, &mut off, 7, rgb1[c]);
        }
        put_bits(&mut block, &mut off, 8, a0);
        put_bits(&mut block, &mut off, 8, a1);
        block.to_le_bytes()
    }

    #[test]
    fn mode5_solid_white() {
        let block = mode5_block(0, [0x7F; 3], [0x7F; 3], 0xFF, 0xFF);
        let img = decode_bc7(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFFFFFF));
        assert_eq!(img.sbit(), Some(Sbit::new(8, 8, 8, 0, 8)));
    }

    #[test]
    fn mode5_endpoint_selection() {
        // Endpoint 0 black, endpoint 1 white; pixel 15's color index = 3.
        let mut raw = mode5_block(0, [0; 3], [0x7F; 3], 0xFF, 0xFF);
        let mut block = u128::from_le_bytes(raw);
        // Color index region starts at bit 66; pixel 15 is at 1 + 14*2.
        let mut off = 66 + 29;
        put_bits(&mut block, &mut off, 2, 3);
        raw = block.to_le_bytes();
        let img = decode_bc7(4, 4, &raw).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFF000000));
        assert_eq!(img.pixel(3, 3), Some(0xFFFFFFFF));
    }

    #[test]
    fn mode5_rotation_swaps_alpha_into_red() {
        // Red endpoint 0x7F -> 0xFF, alpha endpoints 0x40.
        let block = mode5_block(1, [0x7F, 0, 0], [0x7F, 0, 0], 0x40, 0x40);
        let img = decode_bc7(4, 4, &block).unwrap();
        let px = img.pixel(0, 0).unwrap();
        assert_eq!(px >> 24, 0xFF);
        assert_eq!((px >> 16) & 0xFF, 0x40);
    }

    #[test]
    fn mode5_alpha_interpolation() {
        let block = mode5_block(0, [0x7F; 3], [0x7F; 3], 0x00, 0x00);
        let img = decode_bc7(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px >> 24 == 0));
    }

    #[test]
    fn invalid_mode_is_an_error() {
        // Low 32 bits all zero: no mode bit.
        let block = [0u8; 16];
        assert!(matches!(
            decode_bc7(4, 4, &block),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            decode_bc7(8, 8, &[0u8; 63]),
            Err(DecodeError::BufferTooSmall {
                expected: 64,
                actual: 63
            })
        ));
    }
}
