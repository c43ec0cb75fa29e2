//! OpenGL pixel format dispatch for KTX v1
//!
//! KTX v1 identifies the payload by `glFormat` (uncompressed) or
//! `glInternalFormat` (compressed, `glFormat == 0`). Both are mapped here
//! onto a single dispatch enum that knows its expected data size and the
//! block decoder to use.

use gputex_decode::size::{self, ExpandOp};
use gputex_decode::{DecodeResult, DecodedImage, PixelFormat};
use gputex_decode::{astc, bc7, etc, linear, pvrtc, s3tc};

// Base formats (glFormat).
pub const GL_RGB: u32 = 0x1907;
pub const GL_RGBA: u32 = 0x1908;
pub const GL_LUMINANCE: u32 = 0x1909;

// Sized internal formats.
pub const GL_RGB8: u32 = 0x8051;
pub const GL_RGBA8: u32 = 0x8058;
pub const GL_R8: u32 = 0x8229;
pub const GL_RGB9_E5: u32 = 0x8C3D;

// S3TC.
pub const GL_RGB_S3TC: u32 = 0x83A0;
pub const GL_RGB4_S3TC: u32 = 0x83A1;
pub const GL_RGBA_DXT5_S3TC: u32 = 0x83A4;
pub const GL_RGBA4_DXT5_S3TC: u32 = 0x83A5;
pub const GL_COMPRESSED_RGB_S3TC_DXT1_EXT: u32 = 0x83F0;
pub const GL_COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
pub const GL_COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
pub const GL_COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;

// RGTC / LATC.
pub const GL_COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
pub const GL_COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
pub const GL_COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
pub const GL_COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;
pub const GL_COMPRESSED_LUMINANCE_LATC1_EXT: u32 = 0x8C70;
pub const GL_COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT: u32 = 0x8C71;
pub const GL_COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT: u32 = 0x8C72;
pub const GL_COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT: u32 = 0x8C73;

// BPTC (BC7).
pub const GL_COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
pub const GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;

// ETC1 / ETC2 / EAC.
pub const GL_ETC1_RGB8_OES: u32 = 0x8D64;
pub const GL_COMPRESSED_R11_EAC: u32 = 0x9270;
pub const GL_COMPRESSED_SIGNED_R11_EAC: u32 = 0x9271;
pub const GL_COMPRESSED_RG11_EAC: u32 = 0x9272;
pub const GL_COMPRESSED_SIGNED_RG11_EAC: u32 = 0x9273;
pub const GL_COMPRESSED_RGB8_ETC2: u32 = 0x9274;
pub const GL_COMPRESSED_SRGB8_ETC2: u32 = 0x9275;
pub const GL_COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9276;
pub const GL_COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2: u32 = 0x9277;
pub const GL_COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
pub const GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC: u32 = 0x9279;

// PVRTC (IMG extensions).
pub const GL_COMPRESSED_RGB_PVRTC_4BPPV1_IMG: u32 = 0x8C00;
pub const GL_COMPRESSED_RGB_PVRTC_2BPPV1_IMG: u32 = 0x8C01;
pub const GL_COMPRESSED_RGBA_PVRTC_4BPPV1_IMG: u32 = 0x8C02;
pub const GL_COMPRESSED_RGBA_PVRTC_2BPPV1_IMG: u32 = 0x8C03;
pub const GL_COMPRESSED_RGBA_PVRTC_2BPPV2_IMG: u32 = 0x9137;
pub const GL_COMPRESSED_RGBA_PVRTC_4BPPV2_IMG: u32 = 0x9138;

// ASTC (KHR extension). sRGB variants are the same values + 0x20.
pub const GL_COMPRESSED_RGBA_ASTC_4X4_KHR: u32 = 0x93B0;
pub const GL_COMPRESSED_RGBA_ASTC_12X12_KHR: u32 = 0x93BD;
pub const GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4_KHR: u32 = 0x93D0;
pub const GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12X12_KHR: u32 = 0x93DD;

/// ASTC footprints in GL enum order (4x4 .. 12x12).
const ASTC_FOOTPRINTS: [(u8, u8); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (8, 8),
    (10, 5),
    (10, 6),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

/// Resolved payload kind for a KTX v1 texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlDispatch {
    /// 24-bit RGB, rows 4-byte aligned (stored as B,G,R).
    Rgb24,
    /// 32-bit RGBA (stored as R,G,B,A bytes).
    Rgba32,
    /// 8-bit luminance, rows 4-byte aligned.
    L8,
    /// 8-bit red.
    R8,
    /// Shared-exponent RGB9_E5.
    Rgb9E5,
    Dxt1,
    Dxt1A1,
    Dxt3,
    Dxt5,
    Etc1,
    Etc2Rgb,
    Etc2RgbA1,
    Etc2Rgba,
    EacR11,
    EacRg11,
    Bc4,
    Bc5,
    /// LATC2: BC5 decode with R/G moved into luminance/alpha.
    Latc2,
    Bc7,
    Pvrtc {
        /// 2bpp when true, 4bpp otherwise
        is_2bpp: bool,
    },
    /// PVRTC-II is recognized but has no decoder.
    PvrtcII,
    Astc(u8, u8),
}

impl GlDispatch {
    /// Resolve the dispatch from the header's format fields.
    pub fn from_gl(gl_format: u32, gl_internal_format: u32) -> Option<Self> {
        match gl_format {
            GL_RGB => return Some(Self::Rgb24),
            GL_RGBA => return Some(Self::Rgba32),
            GL_LUMINANCE => return Some(Self::L8),
            GL_RGB9_E5 => return Some(Self::Rgb9E5),
            _ => {}
        }
        match gl_internal_format {
            GL_RGB8 => Some(Self::Rgb24),
            GL_RGBA8 => Some(Self::Rgba32),
            GL_R8 => Some(Self::R8),
            GL_RGB9_E5 => Some(Self::Rgb9E5),
            GL_RGB_S3TC | GL_RGB4_S3TC | GL_COMPRESSED_RGB_S3TC_DXT1_EXT => Some(Self::Dxt1),
            GL_COMPRESSED_RGBA_S3TC_DXT1_EXT => Some(Self::Dxt1A1),
            GL_COMPRESSED_RGBA_S3TC_DXT3_EXT => Some(Self::Dxt3),
            GL_RGBA_DXT5_S3TC | GL_RGBA4_DXT5_S3TC | GL_COMPRESSED_RGBA_S3TC_DXT5_EXT => {
                Some(Self::Dxt5)
            }
            GL_ETC1_RGB8_OES => Some(Self::Etc1),
            GL_COMPRESSED_RGB8_ETC2 | GL_COMPRESSED_SRGB8_ETC2 => Some(Self::Etc2Rgb),
            GL_COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2
            | GL_COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2 => Some(Self::Etc2RgbA1),
            GL_COMPRESSED_RGBA8_ETC2_EAC | GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC => {
                Some(Self::Etc2Rgba)
            }
            GL_COMPRESSED_R11_EAC | GL_COMPRESSED_SIGNED_R11_EAC => Some(Self::EacR11),
            GL_COMPRESSED_RG11_EAC | GL_COMPRESSED_SIGNED_RG11_EAC => Some(Self::EacRg11),
            GL_COMPRESSED_RED_RGTC1
            | GL_COMPRESSED_SIGNED_RED_RGTC1
            | GL_COMPRESSED_LUMINANCE_LATC1_EXT
            | GL_COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT => Some(Self::Bc4),
            GL_COMPRESSED_RG_RGTC2 | GL_COMPRESSED_SIGNED_RG_RGTC2 => Some(Self::Bc5),
            GL_COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT
            | GL_COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT => Some(Self::Latc2),
            GL_COMPRESSED_RGBA_BPTC_UNORM | GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM => Some(Self::Bc7),
            GL_COMPRESSED_RGB_PVRTC_2BPPV1_IMG | GL_COMPRESSED_RGBA_PVRTC_2BPPV1_IMG => {
                Some(Self::Pvrtc { is_2bpp: true })
            }
            GL_COMPRESSED_RGB_PVRTC_4BPPV1_IMG | GL_COMPRESSED_RGBA_PVRTC_4BPPV1_IMG => {
                Some(Self::Pvrtc { is_2bpp: false })
            }
            GL_COMPRESSED_RGBA_PVRTC_2BPPV2_IMG | GL_COMPRESSED_RGBA_PVRTC_4BPPV2_IMG => {
                Some(Self::PvrtcII)
            }
            GL_COMPRESSED_RGBA_ASTC_4X4_KHR..=GL_COMPRESSED_RGBA_ASTC_12X12_KHR => {
                let (bx, by) =
                    ASTC_FOOTPRINTS[(gl_internal_format - GL_COMPRESSED_RGBA_ASTC_4X4_KHR) as usize];
                Some(Self::Astc(bx, by))
            }
            GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4_KHR..=GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12X12_KHR => {
                let (bx, by) = ASTC_FOOTPRINTS
                    [(gl_internal_format - GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4X4_KHR) as usize];
                Some(Self::Astc(bx, by))
            }
            _ => None,
        }
    }

    /// Expected data size for one level at the given dimensions.
    pub fn expected_size(self, width: u32, height: u32) -> Option<usize> {
        match self {
            Self::Rgb24 => size::calc_image_size_linear(3, 4, width, height),
            Self::Rgba32 | Self::Rgb9E5 => size::calc_image_size(ExpandOp::Multiply4, width, height),
            Self::L8 => size::calc_image_size_linear(1, 4, width, height),
            Self::R8 => size::calc_image_size(ExpandOp::None, width, height),
            Self::Dxt1
            | Self::Dxt1A1
            | Self::Etc1
            | Self::Etc2Rgb
            | Self::Etc2RgbA1
            | Self::EacR11
            | Self::Bc4 => size::calc_image_size(ExpandOp::Align4Divide2, width, height),
            Self::Dxt3
            | Self::Dxt5
            | Self::Etc2Rgba
            | Self::EacRg11
            | Self::Bc5
            | Self::Latc2
            | Self::Bc7 => size::calc_image_size(ExpandOp::Align4, width, height),
            Self::Pvrtc { is_2bpp } => size::calc_image_size_pvrtc_pot(is_2bpp, width, height),
            // Same size formula as PVRTC-I; there is no decoder.
            Self::PvrtcII => size::calc_image_size_pvrtc_pot(true, width, height),
            Self::Astc(bx, by) => size::calc_image_size_astc(width, height, bx, by),
        }
    }

    /// True when `decode` can actually produce an image.
    pub fn is_decodable(self) -> bool {
        !matches!(self, Self::PvrtcII)
    }

    /// Decode one level's payload.
    pub fn decode(self, width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
        match self {
            Self::Rgb24 => {
                let stride = size::align(4, width * 3) as usize;
                linear::from_linear24(PixelFormat::Bgr888, width, height, buf, Some(stride))
            }
            Self::Rgba32 => linear::from_linear32(PixelFormat::Abgr8888, width, height, buf, None),
            Self::L8 => {
                let stride = size::align(4, width) as usize;
                linear::from_linear8(PixelFormat::L8, width, height, buf, Some(stride))
            }
            Self::R8 => linear::from_linear8(PixelFormat::R8, width, height, buf, None),
            Self::Rgb9E5 => linear::from_linear32(PixelFormat::Rgb9E5, width, height, buf, None),
            Self::Dxt1 => s3tc::decode_dxt1(width, height, buf),
            Self::Dxt1A1 => s3tc::decode_dxt1_a1(width, height, buf),
            Self::Dxt3 => s3tc::decode_dxt3(width, height, buf),
            Self::Dxt5 => s3tc::decode_dxt5(width, height, buf),
            Self::Etc1 => etc::decode_etc1(width, height, buf),
            Self::Etc2Rgb => etc::decode_etc2_rgb(width, height, buf),
            Self::Etc2RgbA1 => etc::decode_etc2_rgb_a1(width, height, buf),
            Self::Etc2Rgba => etc::decode_etc2_rgba(width, height, buf),
            Self::EacR11 => etc::decode_eac_r11(width, height, buf),
            Self::EacRg11 => etc::decode_eac_rg11(width, height, buf),
            Self::Bc4 => s3tc::decode_bc4(width, height, buf),
            Self::Bc5 => s3tc::decode_bc5(width, height, buf),
            Self::Latc2 => {
                let mut img = s3tc::decode_bc5(width, height, buf)?;
                rg_to_la(&mut img);
                Ok(img)
            }
            Self::Bc7 => bc7::decode_bc7(width, height, buf),
            Self::Pvrtc { is_2bpp } => {
                if is_2bpp {
                    pvrtc::decode_pvrtc_2bpp(width, height, buf)
                } else {
                    pvrtc::decode_pvrtc_4bpp(width, height, buf)
                }
            }
            Self::PvrtcII => Err(gputex_decode::DecodeError::UnsupportedFormat("PVRTC-II")),
            Self::Astc(bx, by) => astc::decode_astc(width, height, bx, by, buf),
        }
    }
}

/// Move BC5's red/green channels into luminance/alpha (LATC2 semantics).
fn rg_to_la(img: &mut DecodedImage) {
    for px in img.pixels_mut() {
        let l = (*px >> 16) & 0xFF;
        let a = (*px >> 8) & 0xFF;
        *px = (a << 24) | (l << 16) | (l << 8) | l;
    }
    img.set_sbit(gputex_decode::Sbit::new(8, 8, 8, 8, 8));
}

/// Printable name for a `glInternalFormat` value, when known.
pub fn gl_internal_format_name(value: u32) -> Option<&'static str> {
    Some(match value {
        GL_RGB => "GL_RGB",
        GL_RGBA => "GL_RGBA",
        GL_LUMINANCE => "GL_LUMINANCE",
        GL_RGB8 => "GL_RGB8",
        GL_RGBA8 => "GL_RGBA8",
        GL_R8 => "GL_R8",
        GL_RGB9_E5 => "GL_RGB9_E5",
        GL_RGB_S3TC => "GL_RGB_S3TC",
        GL_RGB4_S3TC => "GL_RGB4_S3TC",
        GL_RGBA_DXT5_S3TC => "GL_RGBA_DXT5_S3TC",
        GL_RGBA4_DXT5_S3TC => "GL_RGBA4_DXT5_S3TC",
        GL_COMPRESSED_RGB_S3TC_DXT1_EXT => "GL_COMPRESSED_RGB_S3TC_DXT1_EXT",
        GL_COMPRESSED_RGBA_S3TC_DXT1_EXT => "GL_COMPRESSED_RGBA_S3TC_DXT1_EXT",
        GL_COMPRESSED_RGBA_S3TC_DXT3_EXT => "GL_COMPRESSED_RGBA_S3TC_DXT3_EXT",
        GL_COMPRESSED_RGBA_S3TC_DXT5_EXT => "GL_COMPRESSED_RGBA_S3TC_DXT5_EXT",
        GL_ETC1_RGB8_OES => "GL_ETC1_RGB8_OES",
        GL_COMPRESSED_R11_EAC => "GL_COMPRESSED_R11_EAC",
        GL_COMPRESSED_SIGNED_R11_EAC => "GL_COMPRESSED_SIGNED_R11_EAC",
        GL_COMPRESSED_RG11_EAC => "GL_COMPRESSED_RG11_EAC",
        GL_COMPRESSED_SIGNED_RG11_EAC => "GL_COMPRESSED_SIGNED_RG11_EAC",
        GL_COMPRESSED_RGB8_ETC2 => "GL_COMPRESSED_RGB8_ETC2",
        GL_COMPRESSED_SRGB8_ETC2 => "GL_COMPRESSED_SRGB8_ETC2",
        GL_COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2 => {
            "GL_COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2"
        }
        GL_COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2 => {
            "GL_COMPRESSED_SRGB8_PUNCHTHROUGH_ALPHA1_ETC2"
        }
        GL_COMPRESSED_RGBA8_ETC2_EAC => "GL_COMPRESSED_RGBA8_ETC2_EAC",
        GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC => "GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC",
        GL_COMPRESSED_RED_RGTC1 => "GL_COMPRESSED_RED_RGTC1",
        GL_COMPRESSED_SIGNED_RED_RGTC1 => "GL_COMPRESSED_SIGNED_RED_RGTC1",
        GL_COMPRESSED_RG_RGTC2 => "GL_COMPRESSED_RG_RGTC2",
        GL_COMPRESSED_SIGNED_RG_RGTC2 => "GL_COMPRESSED_SIGNED_RG_RGTC2",
        GL_COMPRESSED_LUMINANCE_LATC1_EXT => "GL_COMPRESSED_LUMINANCE_LATC1_EXT",
        GL_COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT => "GL_COMPRESSED_SIGNED_LUMINANCE_LATC1_EXT",
        GL_COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT => "GL_COMPRESSED_LUMINANCE_ALPHA_LATC2_EXT",
        GL_COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT => {
            "GL_COMPRESSED_SIGNED_LUMINANCE_ALPHA_LATC2_EXT"
        }
        GL_COMPRESSED_RGBA_BPTC_UNORM => "GL_COMPRESSED_RGBA_BPTC_UNORM",
        GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM => "GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM",
        GL_COMPRESSED_RGB_PVRTC_4BPPV1_IMG => "GL_COMPRESSED_RGB_PVRTC_4BPPV1_IMG",
        GL_COMPRESSED_RGB_PVRTC_2BPPV1_IMG => "GL_COMPRESSED_RGB_PVRTC_2BPPV1_IMG",
        GL_COMPRESSED_RGBA_PVRTC_4BPPV1_IMG => "GL_COMPRESSED_RGBA_PVRTC_4BPPV1_IMG",
        GL_COMPRESSED_RGBA_PVRTC_2BPPV1_IMG => "GL_COMPRESSED_RGBA_PVRTC_2BPPV1_IMG",
        GL_COMPRESSED_RGBA_PVRTC_2BPPV2_IMG => "GL_COMPRESSED_RGBA_PVRTC_2BPPV2_IMG",
        GL_COMPRESSED_RGBA_PVRTC_4BPPV2_IMG => "GL_COMPRESSED_RGBA_PVRTC_4BPPV2_IMG",
        0x93B0 => "GL_COMPRESSED_RGBA_ASTC_4x4_KHR",
        0x93B1 => "GL_COMPRESSED_RGBA_ASTC_5x4_KHR",
        0x93B2 => "GL_COMPRESSED_RGBA_ASTC_5x5_KHR",
        0x93B3 => "GL_COMPRESSED_RGBA_ASTC_6x5_KHR",
        0x93B4 => "GL_COMPRESSED_RGBA_ASTC_6x6_KHR",
        0x93B5 => "GL_COMPRESSED_RGBA_ASTC_8x5_KHR",
        0x93B6 => "GL_COMPRESSED_RGBA_ASTC_8x6_KHR",
        0x93B7 => "GL_COMPRESSED_RGBA_ASTC_8x8_KHR",
        0x93B8 => "GL_COMPRESSED_RGBA_ASTC_10x5_KHR",
        0x93B9 => "GL_COMPRESSED_RGBA_ASTC_10x6_KHR",
        0x93BA => "GL_COMPRESSED_RGBA_ASTC_10x8_KHR",
        0x93BB => "GL_COMPRESSED_RGBA_ASTC_10x10_KHR",
        0x93BC => "GL_COMPRESSED_RGBA_ASTC_12x10_KHR",
        0x93BD => "GL_COMPRESSED_RGBA_ASTC_12x12_KHR",
        0x93D0 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4x4_KHR",
        0x93D1 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_5x4_KHR",
        0x93D2 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_5x5_KHR",
        0x93D3 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_6x5_KHR",
        0x93D4 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_6x6_KHR",
        0x93D5 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x5_KHR",
        0x93D6 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x6_KHR",
        0x93D7 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x8_KHR",
        0x93D8 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x5_KHR",
        0x93D9 => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x6_KHR",
        0x93DA => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x8_KHR",
        0x93DB => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_10x10_KHR",
        0x93DC => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12x10_KHR",
        0x93DD => "GL_COMPRESSED_SRGB8_ALPHA8_ASTC_12x12_KHR",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dxt1_expected_size() {
        assert_eq!(GlDispatch::Dxt1.expected_size(16, 16), Some(128));
    }

    #[test]
    fn base_format_wins_over_internal() {
        let d = GlDispatch::from_gl(GL_RGBA, GL_COMPRESSED_RGBA_S3TC_DXT1_EXT);
        assert_eq!(d, Some(GlDispatch::Rgba32));
    }

    #[test]
    fn astc_enum_range_maps_footprints() {
        assert_eq!(
            GlDispatch::from_gl(0, 0x93B7),
            Some(GlDispatch::Astc(8, 8))
        );
        assert_eq!(
            GlDispatch::from_gl(0, 0x93DD),
            Some(GlDispatch::Astc(12, 12))
        );
    }

    #[test]
    fn unknown_internal_format_is_none() {
        assert_eq!(GlDispatch::from_gl(0, 0xDEAD), None);
        assert_eq!(gl_internal_format_name(0xDEAD), None);
    }
}
