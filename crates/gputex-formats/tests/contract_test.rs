#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Cross-container contract tests for the `TextureFile` trait
//!
//! Every container is synthesized in memory and pushed through the same
//! checks: magic probing, deterministic cached decodes, monotonic mipmap
//! chains, byte-order transparency, and graceful failure on truncated
//! input.

use std::io::Cursor;

use gputex_formats::astc::ASTC_MAGIC;
use gputex_formats::ktx::{KTX_ENDIAN_MAGIC, KTX_IDENTIFIER};
use gputex_formats::ktx2::KTX2_IDENTIFIER;
use gputex_formats::stex::{STEX3_MAGIC, STEX4_DATA_FORMAT_PNG, STEX4_MAGIC};
use gputex_formats::{
    AstcFile, ContainerFormat, GodotStex, KhronosKtx, KhronosKtx2, PowerVr3, ReadSeek,
    TextureFile, TextureResult, XboxXpr, probe,
};
use proptest::prelude::*;

fn src(bytes: &[u8]) -> Box<dyn ReadSeek> {
    Box::new(Cursor::new(bytes.to_vec()))
}

/// Decode every advertised level of a parsed texture, ignoring failures.
fn drain<T: TextureFile>(tex: TextureResult<T>) {
    if let Ok(mut tex) = tex {
        let levels = tex.mipmap_count().max(0) as usize + 1;
        for level in 0..levels {
            let _ = tex.mipmap(level);
        }
    }
}

// --- File builders ---

fn push_u32(buf: &mut Vec<u8>, v: u32, big_endian: bool) {
    if big_endian {
        buf.extend_from_slice(&v.to_be_bytes());
    } else {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn dxt1_size(width: u32, height: u32) -> u32 {
    width.div_ceil(4) * height.div_ceil(4) * 8
}

fn dxt1_white_blocks(buf: &mut Vec<u8>, count: u32) {
    for _ in 0..count {
        buf.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
    }
}

/// KTX v1 file holding a solid-white DXT1 mipmap chain.
fn ktx_dxt1(width: u32, height: u32, levels: u32, big_endian: bool) -> Vec<u8> {
    let mut buf = KTX_IDENTIFIER.to_vec();
    push_u32(&mut buf, KTX_ENDIAN_MAGIC, big_endian);
    for v in [0, 1, 0, 0x83F0, 0, width, height, 0, 0, 1, levels, 0] {
        push_u32(&mut buf, v, big_endian);
    }
    let (mut w, mut h) = (width, height);
    for _ in 0..levels {
        let size = dxt1_size(w, h);
        push_u32(&mut buf, size, big_endian);
        dxt1_white_blocks(&mut buf, size / 8);
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    buf
}

fn ktx2_header(vk_format: u32, width: u32, height: u32, levels: u32) -> Vec<u8> {
    let mut buf = KTX2_IDENTIFIER.to_vec();
    for v in [vk_format, 1, width, height, 0, 0, 1, levels, 0, 0, 0, 0, 0] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf
}

fn ktx2_level_index(buf: &mut Vec<u8>, offset: u64, length: u64) {
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&length.to_le_bytes());
}

/// KTX2 file with a single 16x16 BC1 level (vkFormat 131).
fn ktx2_bc1_16x16(vk_format: u32) -> Vec<u8> {
    let mut buf = ktx2_header(vk_format, 16, 16, 1);
    ktx2_level_index(&mut buf, 104, 128);
    dxt1_white_blocks(&mut buf, 16);
    buf
}

fn stex3_header(width: u16, height: u16, format: u32) -> Vec<u8> {
    let mut buf = STEX3_MAGIC.to_vec();
    for v in [width, width, height, height] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&format.to_le_bytes());
    buf
}

fn stex4_header(
    width: u32,
    height: u32,
    data_format: u32,
    mipmap_count: u32,
    pixel_format: u32,
) -> Vec<u8> {
    let mut buf = STEX4_MAGIC.to_vec();
    for v in [
        1u32,
        width,
        height,
        0,
        0,
        0,
        0,
        0,
        data_format,
        width | (height << 16),
        mipmap_count,
        pixel_format,
    ] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// PowerVR 3.0.0 file holding one solid-white DXT1 level (format enum 7).
fn pvr3_dxt1(width: u32, height: u32, big_endian: bool) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, 0x0352_5650, big_endian);
    // The 64-bit pixel-format field transposes its two words when the
    // file does not match our byte order.
    let (pf_lo, pf_hi) = if big_endian { (0u32, 7u32) } else { (7, 0) };
    for v in [0, pf_lo, pf_hi, 0, 0, height, width, 1, 1, 1, 1, 0] {
        push_u32(&mut buf, v, big_endian);
    }
    dxt1_white_blocks(&mut buf, dxt1_size(width, height) / 8);
    buf
}

fn astc_file(block_x: u8, block_y: u8, width: u32, height: u32, data_len: usize) -> Vec<u8> {
    let mut buf = ASTC_MAGIC.to_vec();
    buf.push(block_x);
    buf.push(block_y);
    buf.push(1);
    for dim in [width, height, 1] {
        buf.extend_from_slice(&dim.to_le_bytes()[..3]);
    }
    buf.resize(16 + data_len, 0);
    buf
}

fn xpr0_file(
    pixel_format: u8,
    width_pow2: u8,
    height_pow2: u8,
    npot_w: u8,
    npot_h: u8,
    data: &[u8],
) -> Vec<u8> {
    let mut buf = b"XPR0".to_vec();
    buf.extend_from_slice(&(32 + data.len() as u32).to_le_bytes());
    buf.extend_from_slice(&32u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.push(pixel_format);
    buf.push(width_pow2);
    buf.push(height_pow2);
    buf.push(0);
    buf.push(npot_w);
    buf.push(npot_h);
    buf.extend_from_slice(&[0u8; 6]);
    buf.extend_from_slice(data);
    buf
}

// --- Probing ---

#[test]
fn probe_identifies_every_container() {
    let cases: [(Vec<u8>, ContainerFormat); 7] = [
        (ktx_dxt1(16, 16, 1, false), ContainerFormat::Ktx),
        (ktx2_bc1_16x16(131), ContainerFormat::Ktx2),
        (stex3_header(8, 8, 0x11), ContainerFormat::Stex3),
        (stex4_header(8, 8, 0, 1, 0x11), ContainerFormat::Stex4),
        (pvr3_dxt1(8, 8, false), ContainerFormat::Pvr),
        (astc_file(4, 4, 8, 8, 64), ContainerFormat::Astc),
        (
            xpr0_file(0x0C, 0x30, 0x03, 0, 0, &[0u8; 32]),
            ContainerFormat::Xpr,
        ),
    ];
    for (file, expected) in &cases {
        let detected = probe(&mut Cursor::new(file)).unwrap();
        assert_eq!(detected, Some(*expected));
    }
}

// --- Decode determinism ---

#[test]
fn level_zero_decode_is_deterministic() {
    fn check<T: TextureFile>(mut tex: T) {
        let first = tex.mipmap(0).expect("level 0 should decode").clone();
        let second = tex.mipmap(0).expect("repeated read should succeed");
        assert_eq!(&first, second);
    }
    check(KhronosKtx::new(src(&ktx_dxt1(16, 16, 1, false))).unwrap());
    check(KhronosKtx2::new(src(&ktx2_bc1_16x16(131))).unwrap());
    let mut stex = stex3_header(8, 8, 0x11);
    dxt1_white_blocks(&mut stex, 4);
    check(GodotStex::new(src(&stex)).unwrap());
    check(PowerVr3::new(src(&pvr3_dxt1(8, 8, false))).unwrap());
    check(AstcFile::new(src(&astc_file(4, 4, 8, 8, 64))).unwrap());
    let blocks = {
        let mut buf = Vec::new();
        dxt1_white_blocks(&mut buf, 4);
        buf
    };
    check(XboxXpr::new(src(&xpr0_file(0x0C, 0x30, 0x03, 0, 0, &blocks))).unwrap());
}

// --- Mipmap chains ---

#[test]
fn mipmap_chain_shrinks_monotonically() {
    let mut ktx = KhronosKtx::new(src(&ktx_dxt1(16, 16, 5, false))).unwrap();
    assert_eq!(ktx.mipmap_count(), 4);
    let mut prev = (u32::MAX, u32::MAX);
    for level in 0..5 {
        let img = ktx.mipmap(level).expect("all five levels should decode");
        let dims = (img.width(), img.height());
        assert!(dims.0 >= 1 && dims.1 >= 1);
        assert!(dims < prev, "level {level} did not shrink: {dims:?}");
        prev = dims;
    }
    assert_eq!(prev, (1, 1));
}

// --- Byte-order transparency ---

#[test]
fn ktx_byte_order_is_transparent() {
    let mut le = KhronosKtx::new(src(&ktx_dxt1(8, 8, 2, false))).unwrap();
    let mut be = KhronosKtx::new(src(&ktx_dxt1(8, 8, 2, true))).unwrap();
    assert_eq!(le.pixel_format(), be.pixel_format());
    assert_eq!(le.mipmap_count(), be.mipmap_count());
    for level in 0..2 {
        let a = le.mipmap(level).unwrap().clone();
        let b = be.mipmap(level).unwrap();
        assert_eq!(&a, b);
    }
}

#[test]
fn pvr_byte_order_is_transparent() {
    let mut le = PowerVr3::new(src(&pvr3_dxt1(8, 8, false))).unwrap();
    let mut be = PowerVr3::new(src(&pvr3_dxt1(8, 8, true))).unwrap();
    assert_eq!(le.pixel_format(), "DXT1");
    assert_eq!(le.pixel_format(), be.pixel_format());
    let a = le.image().unwrap().clone();
    let b = be.image().unwrap();
    assert_eq!(&a, b);
}

// --- Known-answer scenarios ---

#[test]
fn dxt1_ktx_decodes_every_pixel() {
    // 128 compressed bytes expand to 16x16 solid white.
    let file = ktx_dxt1(16, 16, 1, false);
    let mut ktx = KhronosKtx::new(src(&file)).unwrap();
    let img = ktx.image().unwrap();
    assert_eq!((img.width(), img.height()), (16, 16));
    assert_eq!(img.pixels().len(), 256);
    assert!(img.pixels().iter().all(|&px| px == 0xFFFF_FFFF));
}

#[test]
fn npot_pvrtc_stex_is_padded_with_rescale() {
    // PVRTC1 4bpp at 20x20 is stored power-of-two: 32x32, 512 bytes.
    let mut file = stex3_header(20, 20, 0x1B);
    file.extend_from_slice(&[0u8; 512]);
    let mut stex = GodotStex::new(src(&file)).unwrap();
    assert_eq!(stex.dimensions(), (32, 32));
    assert_eq!(stex.rescale_dimensions(), Some((20, 20)));
    let img = stex.image().unwrap();
    assert_eq!((img.width(), img.height()), (32, 32));
    assert_eq!(img.rescale_dimensions(), Some((20, 20)));
}

#[test]
fn stex4_delegates_png_payloads() {
    let mut png = Vec::new();
    let rgba = image::RgbaImage::from_pixel(5, 3, image::Rgba([0x40, 0x50, 0x60, 0xFF]));
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut file = stex4_header(5, 3, STEX4_DATA_FORMAT_PNG, 1, 0);
    file.extend_from_slice(&(png.len() as u32 + 4).to_le_bytes());
    file.extend_from_slice(b"PNG ");
    file.extend_from_slice(&png);

    let mut stex = GodotStex::new(src(&file)).unwrap();
    assert_eq!(stex.pixel_format(), "PNG");
    let img = stex.image().unwrap();
    assert_eq!((img.width(), img.height()), (5, 3));
    assert!(img.pixels().iter().all(|&px| px == 0xFF40_5060));
}

#[test]
fn astc_rounds_dimensions_up_to_whole_blocks() {
    // 40x40 at 8x8 blocks is a 5x5 grid: exactly 400 bytes of payload.
    let mut tex = AstcFile::new(src(&astc_file(8, 8, 40, 40, 400))).unwrap();
    let img = tex.image().unwrap();
    assert_eq!((img.width(), img.height()), (40, 40));

    let mut short = AstcFile::new(src(&astc_file(8, 8, 40, 40, 399))).unwrap();
    assert!(short.image().is_none());
}

#[test]
fn xpr_npot_fallback_scales_by_sixteen() {
    // Zero pow2 nibbles select the fallback bytes: (24 + 1) * 16 = 400.
    let blocks = {
        let mut buf = Vec::new();
        dxt1_white_blocks(&mut buf, 100 * 100);
        buf
    };
    let mut xpr = XboxXpr::new(src(&xpr0_file(0x0C, 0, 0, 24, 24, &blocks))).unwrap();
    assert_eq!(xpr.dimensions(), (400, 400));
    let img = xpr.image().unwrap();
    assert_eq!((img.width(), img.height()), (400, 400));
}

#[test]
fn undefined_vk_format_parses_but_never_decodes() {
    let mut ktx2 = KhronosKtx2::new(src(&ktx2_bc1_16x16(0))).unwrap();
    assert_eq!(ktx2.pixel_format(), "Unknown (0)");
    assert_eq!(ktx2.dimensions(), (16, 16));
    assert!(ktx2.image().is_none());
}

#[test]
fn parses_from_a_file_on_disk() {
    use std::io::Write;

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&ktx_dxt1(16, 16, 1, false)).unwrap();
    tmp.flush().unwrap();

    let file = std::fs::File::open(tmp.path()).unwrap();
    let mut ktx = KhronosKtx::new(Box::new(file)).unwrap();
    assert_eq!(ktx.pixel_format(), "GL_COMPRESSED_RGB_S3TC_DXT1_EXT");
    assert!(ktx.image().is_some());
}

// --- Truncation robustness ---

proptest! {
    #[test]
    fn truncated_files_fail_without_panicking(idx in any::<prop::sample::Index>()) {
        let ktx = ktx_dxt1(16, 16, 5, false);
        drain(KhronosKtx::new(src(&ktx[..idx.index(ktx.len())])));

        let ktx2 = ktx2_bc1_16x16(131);
        drain(KhronosKtx2::new(src(&ktx2[..idx.index(ktx2.len())])));

        let mut stex = stex3_header(8, 8, 0x11);
        dxt1_white_blocks(&mut stex, 4);
        drain(GodotStex::new(src(&stex[..idx.index(stex.len())])));

        let pvr = pvr3_dxt1(8, 8, false);
        drain(PowerVr3::new(src(&pvr[..idx.index(pvr.len())])));

        let astc = astc_file(4, 4, 8, 8, 64);
        drain(AstcFile::new(src(&astc[..idx.index(astc.len())])));

        let blocks = {
            let mut buf = Vec::new();
            dxt1_white_blocks(&mut buf, 4);
            buf
        };
        let xpr = xpr0_file(0x0C, 0x30, 0x03, 0, 0, &blocks);
        drain(XboxXpr::new(src(&xpr[..idx.index(xpr.len())])));
    }
}
