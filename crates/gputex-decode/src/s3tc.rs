//! S3TC / DXTn and RGTC (BC4/BC5) block decoding
//!
//! All variants share the 4x4 block layout: DXT1 packs two RGB565 endpoints
//! and a 32-bit index word into 8 bytes; DXT3/DXT5 prepend an 8-byte alpha
//! block. DXT2 and DXT4 are the premultiplied-alpha twins of DXT3 and DXT5.

use crate::conv::rgb565_to_argb32;
use crate::error::{DecodeError, DecodeResult};
use crate::image::{DecodedImage, Sbit};
use crate::size::{ExpandOp, calc_image_size};

/// Interpolate two ARGB32 colors at 2:1 per channel.
const fn blend2_1(a: u32, b: u32) -> u32 {
    let r = (((a >> 16) & 0xFF) * 2 + ((b >> 16) & 0xFF)) / 3;
    let g = (((a >> 8) & 0xFF) * 2 + ((b >> 8) & 0xFF)) / 3;
    let bl = ((a & 0xFF) * 2 + (b & 0xFF)) / 3;
    0xFF00_0000 | (r << 16) | (g << 8) | bl
}

/// Average two ARGB32 colors per channel.
const fn blend1_1(a: u32, b: u32) -> u32 {
    let r = (((a >> 16) & 0xFF) + ((b >> 16) & 0xFF)) / 2;
    let g = (((a >> 8) & 0xFF) + ((b >> 8) & 0xFF)) / 2;
    let bl = ((a & 0xFF) + (b & 0xFF)) / 2;
    0xFF00_0000 | (r << 16) | (g << 8) | bl
}

/// Build the 4-color palette for a DXT color block.
///
/// `c0 > c1` selects the two-interpolant opaque palette. Otherwise the
/// third entry is the average and the fourth is transparent black when
/// `alpha1` is set, opaque black when it is not. DXT3/DXT5 pass
/// `force_four` since their alpha lives in the separate alpha block.
fn dxt1_palette(c0: u16, c1: u16, force_four: bool, alpha1: bool) -> [u32; 4] {
    let col0 = rgb565_to_argb32(c0);
    let col1 = rgb565_to_argb32(c1);
    if c0 > c1 || force_four {
        [col0, col1, blend2_1(col0, col1), blend2_1(col1, col0)]
    } else {
        let col3 = if alpha1 { 0 } else { 0xFF00_0000 };
        [col0, col1, blend1_1(col0, col1), col3]
    }
}

/// Decode a DXT color block (bytes 0..8 of the block) into a 4x4 tile.
fn decode_color_block(block: &[u8], force_four: bool, alpha1: bool, tile: &mut [u32; 16]) {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let pal = dxt1_palette(c0, c1, force_four, alpha1);
    for (i, px) in tile.iter_mut().enumerate() {
        *px = pal[((indices >> (2 * i)) & 3) as usize];
    }
}

/// Decode a BC3/BC4-style interpolated alpha block into 16 channel values.
fn decode_alpha_block(block: &[u8]) -> [u8; 16] {
    let a0 = u32::from(block[0]);
    let a1 = u32::from(block[1]);
    let mut codes = 0u64;
    for (i, b) in block[2..8].iter().enumerate() {
        codes |= u64::from(*b) << (8 * i);
    }

    let mut out = [0u8; 16];
    for (i, v) in out.iter_mut().enumerate() {
        let code = ((codes >> (3 * i)) & 7) as u32;
        *v = match code {
            0 => a0,
            1 => a1,
            2..=7 if a0 > a1 => ((8 - code) * a0 + (code - 1) * a1) / 7,
            2..=5 => ((6 - code) * a0 + (code - 1) * a1) / 5,
            6 => 0,
            _ => 255,
        } as u8;
    }
    out
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

fn decode_dxt1_common(
    width: u32,
    height: u32,
    buf: &[u8],
    alpha1: bool,
) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4Divide2, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 8) as usize..][..8];
            decode_color_block(block, false, alpha1, &mut tile);
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(5, 6, 5, 0, if alpha1 { 1 } else { 0 }));
    Ok(img)
}

/// Decode DXT1 without the 1-bit alpha interpretation.
pub fn decode_dxt1(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    decode_dxt1_common(width, height, buf, false)
}

/// Decode DXT1 treating the 3-color palette mode as 1-bit alpha.
pub fn decode_dxt1_a1(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    decode_dxt1_common(width, height, buf, true)
}

/// Decode DXT3: explicit 4-bit alpha plus a forced 4-color block.
pub fn decode_dxt3(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            decode_color_block(&block[8..16], true, false, &mut tile);
            let alpha = u64::from_le_bytes([
                block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
            ]);
            for (i, px) in tile.iter_mut().enumerate() {
                let a = ((alpha >> (4 * i)) & 0xF) as u32;
                *px = (*px & 0x00FF_FFFF) | ((a | (a << 4)) << 24);
            }
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(5, 6, 5, 0, 4));
    Ok(img)
}

/// Decode DXT2 (DXT3 with premultiplied alpha).
pub fn decode_dxt2(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let mut img = decode_dxt3(width, height, buf)?;
    img.un_premultiply();
    Ok(img)
}

/// Decode DXT5: interpolated 8-bit alpha plus a forced 4-color block.
pub fn decode_dxt5(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            decode_color_block(&block[8..16], true, false, &mut tile);
            let alpha = decode_alpha_block(&block[0..8]);
            for (i, px) in tile.iter_mut().enumerate() {
                *px = (*px & 0x00FF_FFFF) | (u32::from(alpha[i]) << 24);
            }
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(5, 6, 5, 0, 8));
    Ok(img)
}

/// Decode DXT4 (DXT5 with premultiplied alpha).
pub fn decode_dxt4(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let mut img = decode_dxt5(width, height, buf)?;
    img.un_premultiply();
    Ok(img)
}

/// Decode BC4 (RGTC single channel) as grayscale.
pub fn decode_bc4(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4Divide2, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 8) as usize..][..8];
            let red = decode_alpha_block(block);
            for (i, px) in tile.iter_mut().enumerate() {
                let c = u32::from(red[i]);
                *px = 0xFF00_0000 | (c << 16) | (c << 8) | c;
            }
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 8, 8, 0));
    Ok(img)
}

/// Decode BC5 (RGTC two channel) as red/green with zero blue.
pub fn decode_bc5(width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
    let (bw, bh) = validate_block_input(ExpandOp::Align4, width, height, buf)?;
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = [0u32; 16];
    for by in 0..bh {
        for bx in 0..bw {
            let block = &buf[((by * bw + bx) * 16) as usize..][..16];
            let red = decode_alpha_block(&block[0..8]);
            let green = decode_alpha_block(&block[8..16]);
            for (i, px) in tile.iter_mut().enumerate() {
                *px = 0xFF00_0000 | (u32::from(red[i]) << 16) | (u32::from(green[i]) << 8);
            }
            img.blit_tile(&tile, 4, 4, bx, by);
        }
    }
    img.set_sbit(Sbit::new(8, 8, 0, 0, 0));
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// One DXT1 block: c0 = red, c1 = blue, all pixels index 0.
    fn red_blue_block() -> [u8; 8] {
        [0x00, 0xF8, 0x1F, 0x00, 0, 0, 0, 0]
    }

    #[test]
    fn dxt1_solid_endpoint_block() {
        let img = decode_dxt1(4, 4, &red_blue_block()).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFF0000));
        assert_eq!(img.sbit(), Some(Sbit::new(5, 6, 5, 0, 0)));
    }

    #[test]
    fn dxt1_interpolated_palette() {
        // All pixels index 2: two-thirds red, one-third blue.
        let mut block = red_blue_block();
        block[4..8].copy_from_slice(&0xAAAA_AAAAu32.to_le_bytes());
        let img = decode_dxt1(4, 4, &block).unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFFAA0055));
    }

    #[test]
    fn dxt1_a1_transparent_fourth_entry() {
        // c0 <= c1 selects 3-color mode; index 3 is transparent.
        let mut block = [0u8; 8];
        block[0..2].copy_from_slice(&0x001Fu16.to_le_bytes());
        block[2..4].copy_from_slice(&0xF800u16.to_le_bytes());
        block[4..8].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        let img = decode_dxt1_a1(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0));
        // Plain DXT1 decodes the same entry as opaque black.
        let img = decode_dxt1(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFF000000));
    }

    #[test]
    fn dxt3_nibble_alpha_expansion() {
        let mut block = [0u8; 16];
        // Alpha nibbles 0x0 and 0xF alternating in the first row.
        block[0] = 0xF0;
        block[8..10].copy_from_slice(&0xFFFFu16.to_le_bytes());
        let img = decode_dxt3(4, 4, &block).unwrap();
        assert_eq!(img.pixel(0, 0).map(|px| px >> 24), Some(0x00));
        assert_eq!(img.pixel(1, 0).map(|px| px >> 24), Some(0xFF));
    }

    #[test]
    fn dxt5_alpha_code_table() {
        let mut block = [0u8; 16];
        block[0] = 0xFF; // a0
        block[1] = 0x00; // a1
        // All codes 0 -> a0 everywhere.
        block[8..10].copy_from_slice(&0xFFFFu16.to_le_bytes());
        let img = decode_dxt5(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px >> 24 == 0xFF));

        // a0 <= a1: code 6 is forced 0, code 7 forced 255.
        block[0] = 0x10;
        block[1] = 0x20;
        block[2..8].fill(0xFF); // all codes 7
        let img = decode_dxt5(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px >> 24 == 0xFF));
    }

    #[test]
    fn dxt2_reverses_premultiplication() {
        let mut block = [0u8; 16];
        // Alpha 0x8 (expands to 0x88) everywhere, color = mid gray.
        block[0..8].fill(0x88);
        block[8..10].copy_from_slice(&0x8410u16.to_le_bytes());
        let img2 = decode_dxt2(4, 4, &block).unwrap();
        let img3 = decode_dxt3(4, 4, &block).unwrap();
        let p2 = img2.pixel(0, 0).unwrap();
        let p3 = img3.pixel(0, 0).unwrap();
        assert_eq!(p2 >> 24, p3 >> 24);
        assert!((p2 >> 16) & 0xFF > (p3 >> 16) & 0xFF);
    }

    #[test]
    fn bc4_replicates_red_to_gray() {
        let mut block = [0u8; 8];
        block[0] = 0x42;
        block[1] = 0x42;
        let img = decode_bc4(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFF424242));
    }

    #[test]
    fn bc5_decodes_two_channels() {
        let mut block = [0u8; 16];
        block[0] = 0x10; // red endpoints
        block[1] = 0x10;
        block[8] = 0x20; // green endpoints
        block[9] = 0x20;
        let img = decode_bc5(4, 4, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFF102000));
    }

    #[test]
    fn npot_images_clip_edge_blocks() {
        // 5x3 DXT1 needs 2x1 blocks = 16 bytes.
        let mut buf = [0u8; 16];
        buf[0..8].copy_from_slice(&red_blue_block());
        buf[8..16].copy_from_slice(&red_blue_block());
        let img = decode_dxt1(5, 3, &buf).unwrap();
        assert_eq!(img.width(), 5);
        assert_eq!(img.height(), 3);
        assert_eq!(img.pixel(4, 2), Some(0xFFFF0000));
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            decode_dxt1(8, 8, &[0u8; 31]),
            Err(DecodeError::BufferTooSmall {
                expected: 32,
                actual: 31
            })
        ));
        assert!(decode_dxt5(4, 4, &[0u8; 15]).is_err());
        assert!(decode_dxt1(0, 4, &[]).is_err());
    }
}
