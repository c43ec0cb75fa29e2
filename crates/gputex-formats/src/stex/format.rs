//! Godot pixel format dispatch
//!
//! The format index comes from `Image::Format` in Godot. Index 0x25 means
//! ASTC 8x8 in Godot 3 files (a Sonic Colors Ultimate extension) but
//! ETC2 RA-as-RG in Godot 4, so every lookup is version-qualified.

use gputex_decode::size::{self, ExpandOp};
use gputex_decode::{DecodeResult, DecodedImage, PixelFormat};
use gputex_decode::{astc, bc7, etc, linear, pvrtc, s3tc};

pub const STEX_FORMAT_L8: u32 = 0x00;
pub const STEX_FORMAT_LA8: u32 = 0x01;
pub const STEX_FORMAT_R8: u32 = 0x02;
pub const STEX_FORMAT_RG8: u32 = 0x03;
pub const STEX_FORMAT_RGB8: u32 = 0x04;
pub const STEX_FORMAT_RGBA8: u32 = 0x05;
pub const STEX_FORMAT_RGBA4444: u32 = 0x06;
pub const STEX_FORMAT_RGB565: u32 = 0x07;
pub const STEX_FORMAT_RGBE9995: u32 = 0x10;
pub const STEX_FORMAT_DXT1: u32 = 0x11;
pub const STEX_FORMAT_DXT3: u32 = 0x12;
pub const STEX_FORMAT_DXT5: u32 = 0x13;
pub const STEX_FORMAT_RGTC_R: u32 = 0x14;
pub const STEX_FORMAT_RGTC_RG: u32 = 0x15;
pub const STEX_FORMAT_BPTC_RGBA: u32 = 0x16;
pub const STEX_FORMAT_PVRTC1_2: u32 = 0x19;
pub const STEX_FORMAT_PVRTC1_2A: u32 = 0x1A;
pub const STEX_FORMAT_PVRTC1_4: u32 = 0x1B;
pub const STEX_FORMAT_PVRTC1_4A: u32 = 0x1C;
pub const STEX_FORMAT_ETC: u32 = 0x1D;
pub const STEX_FORMAT_ETC2_R11: u32 = 0x1E;
pub const STEX_FORMAT_ETC2_R11S: u32 = 0x1F;
pub const STEX_FORMAT_ETC2_RG11: u32 = 0x20;
pub const STEX_FORMAT_ETC2_RG11S: u32 = 0x21;
pub const STEX_FORMAT_ETC2_RGB8: u32 = 0x22;
pub const STEX_FORMAT_ETC2_RGBA8: u32 = 0x23;
pub const STEX_FORMAT_ETC2_RGB8A1: u32 = 0x24;
/// Godot 3: ASTC 8x8 (Sonic Colors Ultimate).
pub const STEX_FORMAT_SCU_ASTC_8X8: u32 = 0x25;
/// Godot 4: ETC2 RGBA with R/A carrying an RG pair.
pub const STEX4_FORMAT_ETC2_RA_AS_RG: u32 = 0x25;
/// Godot 4: DXT5 with R/A carrying an RG pair.
pub const STEX4_FORMAT_DXT5_RA_AS_RG: u32 = 0x26;

/// STEX container generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StexVersion {
    /// Godot 3 (`GDST`)
    V3,
    /// Godot 4 (`GST2`)
    V4,
}

/// Printable format names, indexed by format value.
const FORMAT_NAMES: [&str; 0x26] = [
    "L8",
    "LA8",
    "R8",
    "RG8",
    "RGB8",
    "RGBA8",
    "RGBA4444",
    "RGB565",
    "RF",
    "RGF",
    "RGBF",
    "RGBAF",
    "RH",
    "RGH",
    "RGBH",
    "RGBAH",
    "RGBE9995",
    "DXT1",
    "DXT3",
    "DXT5",
    "RGTC_R",
    "RGTC_RG",
    "BPTC_RGBA",
    "BPTC_RGBF",
    "BPTC_RGBFU",
    "PVRTC1_2",
    "PVRTC1_2A",
    "PVRTC1_4",
    "PVRTC1_4A",
    "ETC",
    "ETC2_R11",
    "ETC2_R11S",
    "ETC2_RG11",
    "ETC2_RG11S",
    "ETC2_RGB8",
    "ETC2_RGBA8",
    "ETC2_RGB8A1",
    "ASTC_8x8",
];

/// Printable name for a format value, when known for the given version.
pub fn stex_format_name(version: StexVersion, format: u32) -> Option<&'static str> {
    match (version, format) {
        (StexVersion::V3, STEX_FORMAT_SCU_ASTC_8X8) => Some("ASTC_8x8"),
        (StexVersion::V4, STEX4_FORMAT_ETC2_RA_AS_RG) => Some("ETC2_RA_AS_RG"),
        (StexVersion::V4, STEX4_FORMAT_DXT5_RA_AS_RG) => Some("DXT5_RA_AS_RG"),
        _ => FORMAT_NAMES.get(format as usize).copied(),
    }
}

/// Size opcode for a format value.
fn expand_op(version: StexVersion, format: u32) -> Option<ExpandOp> {
    Some(match format {
        STEX_FORMAT_L8 | STEX_FORMAT_R8 => ExpandOp::None,
        STEX_FORMAT_LA8 | STEX_FORMAT_RG8 | STEX_FORMAT_RGBA4444 | STEX_FORMAT_RGB565 => {
            ExpandOp::Multiply2
        }
        STEX_FORMAT_RGB8 => ExpandOp::Multiply3,
        STEX_FORMAT_RGBA8 | STEX_FORMAT_RGBE9995 => ExpandOp::Multiply4,
        // 32-bit float RF..RGBAF
        0x08 => ExpandOp::Multiply4,
        0x09 => ExpandOp::Multiply8,
        0x0A => ExpandOp::Multiply12,
        0x0B => ExpandOp::Multiply16,
        // 16-bit half RH..RGBAH
        0x0C => ExpandOp::Multiply2,
        0x0D => ExpandOp::Multiply4,
        0x0E => ExpandOp::Multiply6,
        0x0F => ExpandOp::Multiply8,
        STEX_FORMAT_DXT1 | STEX_FORMAT_RGTC_R | STEX_FORMAT_ETC2_RGB8
        | STEX_FORMAT_ETC2_RGB8A1 => ExpandOp::Align4Divide2,
        STEX_FORMAT_DXT3 | STEX_FORMAT_DXT5 | STEX_FORMAT_RGTC_RG | STEX_FORMAT_BPTC_RGBA
        | 0x17 | 0x18 | STEX_FORMAT_ETC2_RGBA8 => ExpandOp::Align4,
        STEX_FORMAT_PVRTC1_2 | STEX_FORMAT_PVRTC1_2A => ExpandOp::Divide4,
        STEX_FORMAT_PVRTC1_4 | STEX_FORMAT_PVRTC1_4A | STEX_FORMAT_ETC | STEX_FORMAT_ETC2_R11
        | STEX_FORMAT_ETC2_R11S => ExpandOp::Divide2,
        STEX_FORMAT_ETC2_RG11 | STEX_FORMAT_ETC2_RG11S => ExpandOp::None,
        0x25 => match version {
            // 8x8 ASTC blocks at 2bpp.
            StexVersion::V3 => ExpandOp::Align8Divide4,
            StexVersion::V4 => ExpandOp::Align4,
        },
        STEX4_FORMAT_DXT5_RA_AS_RG if version == StexVersion::V4 => ExpandOp::Align4,
        _ => return None,
    })
}

/// Expected data size for one level at the given dimensions.
pub fn stex_expected_size(
    version: StexVersion,
    format: u32,
    width: u32,
    height: u32,
) -> Option<usize> {
    size::calc_image_size(expand_op(version, format)?, width, height)
}

/// Decode one level's payload. Float, half-float and BC6 payloads have
/// sizes but no decoder.
pub fn stex_decode(
    version: StexVersion,
    format: u32,
    width: u32,
    height: u32,
    buf: &[u8],
) -> DecodeResult<DecodedImage> {
    let unsupported = Err(gputex_decode::DecodeError::UnsupportedFormat("STEX"));
    match format {
        STEX_FORMAT_L8 => linear::from_linear8(PixelFormat::L8, width, height, buf, None),
        STEX_FORMAT_LA8 => linear::from_linear16(PixelFormat::L8A8, width, height, buf, None),
        STEX_FORMAT_R8 => linear::from_linear8(PixelFormat::R8, width, height, buf, None),
        STEX_FORMAT_RG8 => linear::from_linear16(PixelFormat::Gr88, width, height, buf, None),
        STEX_FORMAT_RGB8 => linear::from_linear24(PixelFormat::Bgr888, width, height, buf, None),
        STEX_FORMAT_RGBA8 => linear::from_linear32(PixelFormat::Abgr8888, width, height, buf, None),
        STEX_FORMAT_RGBA4444 => {
            linear::from_linear16(PixelFormat::Rgba4444, width, height, buf, None)
        }
        STEX_FORMAT_RGBE9995 => {
            linear::from_linear32(PixelFormat::Rgb9E5, width, height, buf, None)
        }
        STEX_FORMAT_DXT1 => s3tc::decode_dxt1(width, height, buf),
        STEX_FORMAT_DXT3 => s3tc::decode_dxt3(width, height, buf),
        STEX_FORMAT_DXT5 => s3tc::decode_dxt5(width, height, buf),
        STEX_FORMAT_RGTC_R => s3tc::decode_bc4(width, height, buf),
        STEX_FORMAT_RGTC_RG => s3tc::decode_bc5(width, height, buf),
        STEX_FORMAT_BPTC_RGBA => bc7::decode_bc7(width, height, buf),
        STEX_FORMAT_PVRTC1_2 | STEX_FORMAT_PVRTC1_2A => {
            pvrtc::decode_pvrtc_2bpp(width, height, buf)
        }
        STEX_FORMAT_PVRTC1_4 | STEX_FORMAT_PVRTC1_4A => {
            pvrtc::decode_pvrtc_4bpp(width, height, buf)
        }
        // Godot 4 stores ETC-family textures with R and B swapped.
        STEX_FORMAT_ETC => swap_rb_v4(version, etc::decode_etc1(width, height, buf)),
        STEX_FORMAT_ETC2_RGB8 => swap_rb_v4(version, etc::decode_etc2_rgb(width, height, buf)),
        STEX_FORMAT_ETC2_RGBA8 => swap_rb_v4(version, etc::decode_etc2_rgba(width, height, buf)),
        STEX_FORMAT_ETC2_RGB8A1 => {
            swap_rb_v4(version, etc::decode_etc2_rgb_a1(width, height, buf))
        }
        STEX_FORMAT_ETC2_R11 | STEX_FORMAT_ETC2_R11S => etc::decode_eac_r11(width, height, buf),
        STEX_FORMAT_ETC2_RG11 | STEX_FORMAT_ETC2_RG11S => etc::decode_eac_rg11(width, height, buf),
        0x25 => match version {
            StexVersion::V3 => astc::decode_astc(width, height, 8, 8, buf),
            StexVersion::V4 => swap_rb_v4(version, etc::decode_etc2_rgba(width, height, buf)),
        },
        STEX4_FORMAT_DXT5_RA_AS_RG if version == StexVersion::V4 => {
            let mut img = s3tc::decode_dxt5(width, height, buf)?;
            img.swap_rb();
            Ok(img)
        }
        _ => unsupported,
    }
}

fn swap_rb_v4(
    version: StexVersion,
    result: DecodeResult<DecodedImage>,
) -> DecodeResult<DecodedImage> {
    result.map(|mut img| {
        if version == StexVersion::V4 {
            img.swap_rb();
        }
        img
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_0x25_is_version_dependent() {
        assert_eq!(stex_format_name(StexVersion::V3, 0x25), Some("ASTC_8x8"));
        assert_eq!(
            stex_format_name(StexVersion::V4, 0x25),
            Some("ETC2_RA_AS_RG")
        );
        // 8x8 blocks at 2bpp vs 4x4 blocks at 8bpp.
        assert_eq!(stex_expected_size(StexVersion::V3, 0x25, 16, 16), Some(64));
        assert_eq!(stex_expected_size(StexVersion::V4, 0x25, 16, 16), Some(256));
    }

    #[test]
    fn dxt5_ra_as_rg_is_v4_only() {
        assert_eq!(stex_format_name(StexVersion::V3, 0x26), None);
        assert_eq!(stex_expected_size(StexVersion::V3, 0x26, 16, 16), None);
        assert_eq!(stex_expected_size(StexVersion::V4, 0x26, 16, 16), Some(256));
    }

    #[test]
    fn float_formats_have_sizes_but_no_decoder() {
        assert_eq!(stex_expected_size(StexVersion::V3, 0x0B, 4, 4), Some(256));
        assert!(stex_decode(StexVersion::V3, 0x0B, 4, 4, &[0u8; 256]).is_err());
    }
}
