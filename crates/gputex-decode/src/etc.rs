//! ETC1 / ETC2 / EAC block decoding
//!
//! ETC1 blocks are 8 bytes: three base-color bytes, a control byte (two
//! 3-bit table codewords, the diff bit, the flip bit) and two big-endian
//! 16-bit pixel-index planes. ETC2 reuses the layout and triggers its T, H
//! and Planar modes through diff-mode component overflows. EAC alpha and
//! R11/RG11 blocks share an 8-byte codeword layout of their own.

use crate::error::{DecodeError, DecodeResult};
use crate::image::{DecodedImage, Sbit};
use crate::size::{ExpandOp, calc_image_size};

/// Intensity modifier sets, indexed by table codeword then pixel index.
///
/// Rows are rearranged to ascending two-bit pixel index order
/// (a, b, -a, -b) rather than the order used in the format tables.
const ETC1_INTENSITY: [[i16; 4]; 8] = [
    [2, 8, -2, -8],
    [5, 17, -5, -17],
    [9, 29, -9, -29],
    [13, 42, -13, -42],
    [18, 60, -18, -60],
    [24, 80, -24, -80],
    [33, 106, -33, -106],
    [47, 183, -47, -183],
];

/// Intensity modifiers when punch-through alpha is active and the block's
/// opaque bit is clear: the small modifiers are forced to zero.
const ETC2_INTENSITY_A1: [[i16; 4]; 8] = [
    [0, 8, 0, -8],
    [0, 17, 0, -17],
    [0, 29, 0, -29],
    [0, 42, 0, -42],
    [0, 60, 0, -60],
    [0, 80, 0, -80],
    [0, 106, 0, -106],
    [0, 183, 0, -183],
];

// ETC arranges pixels by column, then by row. This maps back to linear.
const ETC1_MAPPING: [usize; 16] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];

// Subblock membership bitfields, indexed by the flip bit.
// Bit n corresponds to ETC-arranged pixel n.
const ETC1_SUBBLOCK_MAPPING: [u16; 2] = [
    0xFF00, // flip == 0: left/right 2x4
    0xCCCC, // flip == 1: top/bottom 4x2
];

// 3-bit two's complement lookup.
const ETC1_3BIT_DIFF: [i8; 8] = [0, 1, 2, 3, -4, -3, -2, -1];

/// Distance table for the ETC2 'T' and 'H' modes.
const ETC2_DIST_TBL: [u8; 8] = [3, 6, 11, 16, 23, 32, 41, 64];

/// EAC modifier table, indexed by table selector then 3-bit pixel code.
const EAC_MODIFIER_TBL: [[i8; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

const fn extend_4to8(v: u8) -> i32 {
    ((v << 4) | v) as i32
}

const fn extend_5to8(v: i32) -> i32 {
    ((v << 3) | (v >> 2)) & 0xFF
}

const fn extend_6to8(v: u8) -> i32 {
    ((v << 2) | (v >> 4)) as i32
}

const fn extend_7to8(v: u8) -> i32 {
    ((v << 1) | (v >> 6)) as i32
}

#[derive(Clone, Copy, Default)]
struct ColorRgb {
    r: i32,
    g: i32,
    b: i32,
}

impl ColorRgb {
    const fn offset(self, adj: i32) -> Self {
        Self {
            r: self.r + adj,
            g: self.g + adj,
            b: self.b + adj,
        }
    }

    /// Clamp to [0, 255] per channel and pack as opaque ARGB32.
    fn clamp_argb(self) -> u32 {
        let c = |v: i32| v.clamp(0, 255) as u32;
        0xFF00_0000 | (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }
}

enum BlockMode {
    Etc1([ColorRgb; 2]),
    TH([u32; 4]),
    Planar([ColorRgb; 3]),
}

/// Decode an ETC1/ETC2 RGB block into a linear 4x4 tile.
///
/// `etc2` enables the T/H/Planar overflow modes; `a1` enables the
/// punch-through alpha interpretation of the diff bit.
fn decode_block_rgb(block: &[u8], etc2: bool, a1: bool, tile: &mut [u32; 16]) {
    let (r, g, b, control) = (block[0], block[1], block[2], block[3]);

    let mode = if !a1 && control & 0x02 == 0 {
        // Individual mode.
        BlockMode::Etc1([
            ColorRgb {
                r: extend_4to8(r >> 4),
                g: extend_4to8(g >> 4),
                b: extend_4to8(b >> 4),
            },
            ColorRgb {
                r: extend_4to8(r & 0x0F),
                g: extend_4to8(g & 0x0F),
                b: extend_4to8(b & 0x0F),
            },
        ])
    } else {
        // Differential mode, or an ETC2 overflow mode.
        let dr2 = i32::from(ETC1_3BIT_DIFF[(r & 0x07) as usize]);
        let dg2 = i32::from(ETC1_3BIT_DIFF[(g & 0x07) as usize]);
        let db2 = i32::from(ETC1_3BIT_DIFF[(b & 0x07) as usize]);
        let sr = i32::from(r >> 3) + dr2;
        let sg = i32::from(g >> 3) + dg2;
        let sb = i32::from(b >> 3) + db2;

        if etc2 && sr & !0x1F != 0 {
            // 'T' mode. R1 is split across non-contiguous bits.
            let base0 = ColorRgb {
                r: extend_4to8(((r & 0x18) >> 1) | (r & 0x03)),
                g: extend_4to8(g >> 4),
                b: extend_4to8(g & 0x0F),
            };
            let base1 = ColorRgb {
                r: extend_4to8(b >> 4),
                g: extend_4to8(b & 0x0F),
                b: extend_4to8(control >> 4),
            };
            let d = i32::from(ETC2_DIST_TBL[(((control & 0x0C) >> 1) | (control & 0x01)) as usize]);
            BlockMode::TH([
                base0.clamp_argb(),
                base1.offset(d).clamp_argb(),
                base1.clamp_argb(),
                base1.offset(-d).clamp_argb(),
            ])
        } else if etc2 && sg & !0x1F != 0 {
            // 'H' mode. G1 and B1 are split across bytes.
            let base0 = ColorRgb {
                r: extend_4to8(r >> 3),
                g: extend_4to8(((r & 0x07) << 1) | ((g >> 4) & 0x01)),
                b: extend_4to8((g & 0x08) | ((g & 0x03) << 1) | (b >> 7)),
            };
            let base1 = ColorRgb {
                r: extend_4to8(b >> 3),
                g: extend_4to8(((b & 0x07) << 1) | (control >> 7)),
                b: extend_4to8((control >> 3) & 0x0F),
            };
            // The distance index LSB comes from comparing the base colors.
            let mut d_idx = (control & 0x04) | ((control & 0x01) << 1);
            d_idx |= u8::from(base0.clamp_argb() >= base1.clamp_argb());
            let d = i32::from(ETC2_DIST_TBL[d_idx as usize]);
            BlockMode::TH([
                base0.offset(d).clamp_argb(),
                base0.offset(-d).clamp_argb(),
                base1.offset(d).clamp_argb(),
                base1.offset(-d).clamp_argb(),
            ])
        } else if etc2 && sb & !0x1F != 0 {
            // 'Planar' mode: three RGB676 colors 'O', 'H', 'V'.
            let (b3, b4, b5, b6, b7) = (block[3], block[4], block[5], block[6], block[7]);
            BlockMode::Planar([
                ColorRgb {
                    r: extend_6to8((r >> 1) & 0x3F),
                    g: extend_7to8(((r << 6) & 0x40) | ((g >> 1) & 0x3F)),
                    b: extend_6to8(((g << 5) & 0x20) | (b & 0x18) | ((b << 1) & 0x06) | (b3 >> 7)),
                },
                ColorRgb {
                    r: extend_6to8(((b3 >> 1) & 0x3C) | (b3 & 0x01)),
                    g: extend_7to8(b4 >> 1),
                    b: extend_6to8(((b4 << 5) & 0x20) | (b5 >> 3)),
                },
                ColorRgb {
                    r: extend_6to8(((b5 << 3) & 0x38) | (b6 >> 5)),
                    g: extend_7to8(((b6 << 2) & 0x7C) | (b7 >> 6)),
                    b: extend_6to8(b7 & 0x3F),
                },
            ])
        } else {
            // ETC1 differential mode.
            BlockMode::Etc1([
                ColorRgb {
                    r: extend_5to8(i32::from(r >> 3)),
                    g: extend_5to8(i32::from(g >> 3)),
                    b: extend_5to8(i32::from(b >> 3)),
                },
                ColorRgb {
                    r: extend_5to8(sr),
                    g: extend_5to8(sg),
                    b: extend_5to8(sb),
                },
            ])
        }
    };

    let mut px_msb = u16::from_be_bytes([block[4], block[5]]);
    let mut px_lsb = u16::from_be_bytes([block[6], block[7]]);
    let punch_through = a1 && control & 0x02 == 0;

    match mode {
        BlockMode::Etc1(base) => {
            let tbl = if punch_through {
                [
                    &ETC2_INTENSITY_A1[(control >> 5) as usize],
                    &ETC2_INTENSITY_A1[((control >> 2) & 0x07) as usize],
                ]
            } else {
                [
                    &ETC1_INTENSITY[(control >> 5) as usize],
                    &ETC1_INTENSITY[((control >> 2) & 0x07) as usize],
                ]
            };
            let mut subblock = ETC1_SUBBLOCK_MAPPING[(control & 0x01) as usize];
            for i in 0..16 {
                let px_idx = ((px_msb & 1) << 1 | (px_lsb & 1)) as usize;
                let p = &mut tile[ETC1_MAPPING[i]];
                if punch_through && px_idx == 2 {
                    *p = 0;
                } else {
                    let cur_sub = (subblock & 1) as usize;
                    *p = base[cur_sub]
                        .offset(i32::from(tbl[cur_sub][px_idx]))
                        .clamp_argb();
                }
                px_msb >>= 1;
                px_lsb >>= 1;
                subblock >>= 1;
            }
        }
        BlockMode::TH(paint) => {
            for i in 0..16 {
                let px_idx = ((px_msb & 1) << 1 | (px_lsb & 1)) as usize;
                let p = &mut tile[ETC1_MAPPING[i]];
                *p = if punch_through && px_idx == 2 {
                    0
                } else {
                    paint[px_idx]
                };
                px_msb >>= 1;
                px_lsb >>= 1;
            }
        }
        BlockMode::Planar([o, h, v]) => {
            for i in 0..16 {
                let px = (i / 4) as i32;
                let py = (i % 4) as i32;
                let interp = |oc: i32, hc: i32, vc: i32| -> i32 {
                    (px * (hc - oc) + py * (vc - oc) + 4 * oc + 2) >> 2
                };
                tile[ETC1_MAPPING[i]] = ColorRgb {
                    r: interp(o.r, h.r, v.r),
                    g: interp(o.g, h.g, v.g),
                    b: interp(o.b, h.b, v.b),
                }
                .clamp_argb();
            }
        }
    }
}

/// Decode an EAC codeword block into one byte channel of the tile.
///
/// `shift` selects the ARGB32 channel (24 = alpha, 16 = red, 8 = green).
/// A zero multiplier is invalid for encoders but must decode anyway.
fn decode_block_eac(block: &[u8], shift: u32, tile: &mut [u32; 16]) {
    let base = i32::from(block[0]);
    let mult = i32::from(block[1] >> 4);
    let tbl = &EAC_MODIFIER_TBL[(block[1] & 0x0F) as usize];

    // 48-bit pixel codes, stored MSB-first.
    let mut codes = 0u64;
    for b in &block[2..8] {
        codes = (codes << 8) | u64::from(*b);
    }

    for i in 0..16 {
        let code = ((codes >> (45 - 3 * i)) & 0x07) as usize;
        let v = (base + i32::from(tbl[code]) * mult).clamp(0, 255) as u32;
        let p = &mut tile[ETC1_MAPPING[i]];
        *p = (*p & !(0xFF << shift)) | (v << shift);
    }
}

fn validate_block_input(
    op: ExpandOp,
    width: u32,
    height: u32,
    buf: &[u8],
) -> DecodeResult<(u32, u32)> {
    let expected = calc_image_size(op, width, height)
        .ok_or(DecodeError::InvalidDimensions { width, height })?;
    if buf.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: buf.len(),
        });
    }
    Ok((width.div_ceil(4), height.div_ceil(4)))
}

fn decode_rgb_common(
    width: u32,
    height: u32,
    buf: &[u8],
    etc2: bool,
    a1: bool,
) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4Divide2, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 8) as usize..][..8];
            decode_block_rgb(block, etc2, a1, &mut tile);
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    Ok(img)
}

/// Decode an ETC1 image.
pub fn decode_etc1(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let mut img = decode_rgb_common(width, height, buf, false, false)?;
    img.set_sbit(Sbit::new(8, 8, 8, 0, 0));
    Ok(img)
}

/// Decode an ETC2 RGB image.
pub fn decode_etc2_rgb(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let mut img = decode_rgb_common(width, height, buf, true, false)?;
    img.set_sbit(Sbit::new(8, 8, 8, 0, 0));
    Ok(img)
}

/// Decode an ETC2 RGB image with punch-through (1-bit) alpha.
pub fn decode_etc2_rgb_a1(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let mut img = decode_rgb_common(width, height, buf, true, true)?;
    img.set_sbit(Sbit::new(8, 8, 8, 0, 1));
    Ok(img)
}

/// Decode an ETC2 RGBA image (EAC alpha block + ETC2 RGB block).
pub fn decode_etc2_rgba(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            decode_block_rgb(&block[8..16], true, false, &mut tile);
            decode_block_eac(&block[0..8], 24, &mut tile);
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 8, 0, 8));
    Ok(img)
}

/// Decode an EAC R11 image at 8-bit precision, red channel only.
pub fn decode_eac_r11(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4Divide2, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    // Only one channel is written per block; the rest stays opaque black.
    let mut tile = [0xFF00_0000u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 8) as usize..][..8];
            decode_block_eac(block, 16, &mut tile);
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 1, 1, 0, 0));
    Ok(img)
}

/// Decode an EAC RG11 image at 8-bit precision, red and green channels.
pub fn decode_eac_rg11(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0xFF00_0000u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            decode_block_eac(&block[0..8], 16, &mut tile);
            decode_block_eac(&block[8..16], 8, &mut tile);
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 1, 0, 0));
    Ok(img)
}
