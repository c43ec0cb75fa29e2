//! Vulkan pixel format dispatch for KTX2
//!
//! KTX2 identifies the payload with a single `vkFormat` field. UNORM, UINT,
//! SNORM and SRGB variants of the same layout collapse onto one dispatch
//! entry; sRGB transfer functions are not applied.

use gputex_decode::size::{self, ExpandOp};
use gputex_decode::{DecodeResult, DecodedImage, PixelFormat};
use gputex_decode::{astc, bc7, etc, linear, pvrtc, s3tc};

pub const VK_FORMAT_UNDEFINED: u32 = 0;

pub const VK_FORMAT_R8_UNORM: u32 = 9;
pub const VK_FORMAT_R8_UINT: u32 = 13;
pub const VK_FORMAT_R8_SRGB: u32 = 15;

pub const VK_FORMAT_R8G8B8_UNORM: u32 = 23;
pub const VK_FORMAT_R8G8B8_UINT: u32 = 27;
pub const VK_FORMAT_R8G8B8_SRGB: u32 = 29;
pub const VK_FORMAT_B8G8R8_UNORM: u32 = 30;
pub const VK_FORMAT_B8G8R8_UINT: u32 = 34;
pub const VK_FORMAT_B8G8R8_SRGB: u32 = 36;

pub const VK_FORMAT_R8G8B8A8_UNORM: u32 = 37;
pub const VK_FORMAT_R8G8B8A8_UINT: u32 = 41;
pub const VK_FORMAT_R8G8B8A8_SRGB: u32 = 43;
pub const VK_FORMAT_B8G8R8A8_UNORM: u32 = 44;
pub const VK_FORMAT_B8G8R8A8_UINT: u32 = 48;
pub const VK_FORMAT_B8G8R8A8_SRGB: u32 = 50;

pub const VK_FORMAT_E5B9G9R9_UFLOAT_PACK32: u32 = 123;

pub const VK_FORMAT_BC1_RGB_UNORM_BLOCK: u32 = 131;
pub const VK_FORMAT_BC1_RGB_SRGB_BLOCK: u32 = 132;
pub const VK_FORMAT_BC1_RGBA_UNORM_BLOCK: u32 = 133;
pub const VK_FORMAT_BC1_RGBA_SRGB_BLOCK: u32 = 134;
pub const VK_FORMAT_BC2_UNORM_BLOCK: u32 = 135;
pub const VK_FORMAT_BC2_SRGB_BLOCK: u32 = 136;
pub const VK_FORMAT_BC3_UNORM_BLOCK: u32 = 137;
pub const VK_FORMAT_BC3_SRGB_BLOCK: u32 = 138;
pub const VK_FORMAT_BC7_UNORM_BLOCK: u32 = 145;
pub const VK_FORMAT_BC7_SRGB_BLOCK: u32 = 146;

pub const VK_FORMAT_ETC2_R8G8B8_UNORM_BLOCK: u32 = 147;
pub const VK_FORMAT_ETC2_R8G8B8_SRGB_BLOCK: u32 = 148;
pub const VK_FORMAT_ETC2_R8G8B8A1_UNORM_BLOCK: u32 = 149;
pub const VK_FORMAT_ETC2_R8G8B8A1_SRGB_BLOCK: u32 = 150;
pub const VK_FORMAT_ETC2_R8G8B8A8_UNORM_BLOCK: u32 = 151;
pub const VK_FORMAT_ETC2_R8G8B8A8_SRGB_BLOCK: u32 = 152;
pub const VK_FORMAT_EAC_R11_UNORM_BLOCK: u32 = 153;
pub const VK_FORMAT_EAC_R11_SNORM_BLOCK: u32 = 154;
pub const VK_FORMAT_EAC_R11G11_UNORM_BLOCK: u32 = 155;
pub const VK_FORMAT_EAC_R11G11_SNORM_BLOCK: u32 = 156;

pub const VK_FORMAT_ASTC_4X4_UNORM_BLOCK: u32 = 157;
pub const VK_FORMAT_ASTC_12X12_SRGB_BLOCK: u32 = 184;

pub const VK_FORMAT_PVRTC1_2BPP_UNORM_BLOCK_IMG: u32 = 1_000_054_000;
pub const VK_FORMAT_PVRTC1_4BPP_UNORM_BLOCK_IMG: u32 = 1_000_054_001;
pub const VK_FORMAT_PVRTC2_2BPP_UNORM_BLOCK_IMG: u32 = 1_000_054_002;
pub const VK_FORMAT_PVRTC2_4BPP_UNORM_BLOCK_IMG: u32 = 1_000_054_003;
pub const VK_FORMAT_PVRTC1_2BPP_SRGB_BLOCK_IMG: u32 = 1_000_054_004;
pub const VK_FORMAT_PVRTC1_4BPP_SRGB_BLOCK_IMG: u32 = 1_000_054_005;
pub const VK_FORMAT_PVRTC2_2BPP_SRGB_BLOCK_IMG: u32 = 1_000_054_006;
pub const VK_FORMAT_PVRTC2_4BPP_SRGB_BLOCK_IMG: u32 = 1_000_054_007;

/// ASTC footprints in VkFormat enum order (4x4 .. 12x12, UNORM/SRGB pairs).
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

/// Resolved payload kind for a KTX2 texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VkDispatch {
    /// 24-bit RGB, rows 4-byte aligned (stored as R,G,B).
    Rgb24,
    /// 24-bit RGB, rows 4-byte aligned, R/B swapped (stored as B,G,R).
    Bgr24,
    /// 32-bit RGBA (stored as R,G,B,A bytes).
    Rgba32,
    /// 32-bit RGBA, R/B swapped (stored as B,G,R,A bytes).
    Bgra32,
    /// 8-bit red, rows 4-byte aligned.
    R8,
    /// Shared-exponent RGB9_E5.
    Rgb9E5,
    Dxt1,
    Dxt1A1,
    Dxt3,
    Dxt5,
    Bc7,
    Etc2Rgb,
    Etc2RgbA1,
    Etc2Rgba,
    EacR11,
    EacRg11,
    Pvrtc {
        /// 2bpp when true, 4bpp otherwise
        is_2bpp: bool,
    },
    /// PVRTC-II is recognized but has no decoder.
    PvrtcII,
    Astc(u8, u8),
}

impl VkDispatch {
    /// Resolve the dispatch from the header's `vkFormat` field.
    pub fn from_vk(vk_format: u32) -> Option<Self> {
        match vk_format {
            VK_FORMAT_R8G8B8_UNORM | VK_FORMAT_R8G8B8_UINT | VK_FORMAT_R8G8B8_SRGB => {
                Some(Self::Rgb24)
            }
            VK_FORMAT_B8G8R8_UNORM | VK_FORMAT_B8G8R8_UINT | VK_FORMAT_B8G8R8_SRGB => {
                Some(Self::Bgr24)
            }
            VK_FORMAT_R8G8B8A8_UNORM | VK_FORMAT_R8G8B8A8_UINT | VK_FORMAT_R8G8B8A8_SRGB => {
                Some(Self::Rgba32)
            }
            VK_FORMAT_B8G8R8A8_UNORM | VK_FORMAT_B8G8R8A8_UINT | VK_FORMAT_B8G8R8A8_SRGB => {
                Some(Self::Bgra32)
            }
            VK_FORMAT_R8_UNORM | VK_FORMAT_R8_UINT | VK_FORMAT_R8_SRGB => Some(Self::R8),
            VK_FORMAT_E5B9G9R9_UFLOAT_PACK32 => Some(Self::Rgb9E5),
            VK_FORMAT_BC1_RGB_UNORM_BLOCK | VK_FORMAT_BC1_RGB_SRGB_BLOCK => Some(Self::Dxt1),
            VK_FORMAT_BC1_RGBA_UNORM_BLOCK | VK_FORMAT_BC1_RGBA_SRGB_BLOCK => Some(Self::Dxt1A1),
            VK_FORMAT_BC2_UNORM_BLOCK | VK_FORMAT_BC2_SRGB_BLOCK => Some(Self::Dxt3),
            VK_FORMAT_BC3_UNORM_BLOCK | VK_FORMAT_BC3_SRGB_BLOCK => Some(Self::Dxt5),
            VK_FORMAT_BC7_UNORM_BLOCK | VK_FORMAT_BC7_SRGB_BLOCK => Some(Self::Bc7),
            VK_FORMAT_ETC2_R8G8B8_UNORM_BLOCK | VK_FORMAT_ETC2_R8G8B8_SRGB_BLOCK => {
                Some(Self::Etc2Rgb)
            }
            VK_FORMAT_ETC2_R8G8B8A1_UNORM_BLOCK | VK_FORMAT_ETC2_R8G8B8A1_SRGB_BLOCK => {
                Some(Self::Etc2RgbA1)
            }
            VK_FORMAT_ETC2_R8G8B8A8_UNORM_BLOCK | VK_FORMAT_ETC2_R8G8B8A8_SRGB_BLOCK => {
                Some(Self::Etc2Rgba)
            }
            VK_FORMAT_EAC_R11_UNORM_BLOCK | VK_FORMAT_EAC_R11_SNORM_BLOCK => Some(Self::EacR11),
            VK_FORMAT_EAC_R11G11_UNORM_BLOCK | VK_FORMAT_EAC_R11G11_SNORM_BLOCK => {
                Some(Self::EacRg11)
            }
            VK_FORMAT_ASTC_4X4_UNORM_BLOCK..=VK_FORMAT_ASTC_12X12_SRGB_BLOCK => {
                let (bx, by) =
                    ASTC_FOOTPRINTS[((vk_format - VK_FORMAT_ASTC_4X4_UNORM_BLOCK) / 2) as usize];
                Some(Self::Astc(bx, by))
            }
            VK_FORMAT_PVRTC1_2BPP_UNORM_BLOCK_IMG | VK_FORMAT_PVRTC1_2BPP_SRGB_BLOCK_IMG => {
                Some(Self::Pvrtc { is_2bpp: true })
            }
            VK_FORMAT_PVRTC1_4BPP_UNORM_BLOCK_IMG | VK_FORMAT_PVRTC1_4BPP_SRGB_BLOCK_IMG => {
                Some(Self::Pvrtc { is_2bpp: false })
            }
            VK_FORMAT_PVRTC2_2BPP_UNORM_BLOCK_IMG
            | VK_FORMAT_PVRTC2_2BPP_SRGB_BLOCK_IMG
            | VK_FORMAT_PVRTC2_4BPP_UNORM_BLOCK_IMG
            | VK_FORMAT_PVRTC2_4BPP_SRGB_BLOCK_IMG => Some(Self::PvrtcII),
            _ => None,
        }
    }

    /// Expected data size for one level at the given dimensions.
    pub fn expected_size(self, width: u32, height: u32) -> Option<usize> {
        match self {
            Self::Rgb24 | Self::Bgr24 => size::calc_image_size_linear(3, 4, width, height),
            Self::Rgba32 | Self::Bgra32 | Self::Rgb9E5 => {
                size::calc_image_size(ExpandOp::Multiply4, width, height)
            }
            Self::R8 => size::calc_image_size_linear(1, 4, width, height),
            Self::Dxt1 | Self::Dxt1A1 | Self::Etc2Rgb | Self::Etc2RgbA1 | Self::EacR11 => {
                size::calc_image_size(ExpandOp::Align4Divide2, width, height)
            }
            Self::Dxt3 | Self::Dxt5 | Self::Bc7 | Self::Etc2Rgba | Self::EacRg11 => {
                size::calc_image_size(ExpandOp::Align4, width, height)
            }
            Self::Pvrtc { is_2bpp } => size::calc_image_size_pvrtc_pot(is_2bpp, width, height),
            // Same size formula as PVRTC-I; there is no decoder.
            Self::PvrtcII => size::calc_image_size_pvrtc_pot(true, width, height),
            Self::Astc(bx, by) => size::calc_image_size_astc(width, height, bx, by),
        }
    }

    /// Decode one level's payload.
    pub fn decode(self, width: u32, height: u32, buf: &[u8]) -> DecodeResult<DecodedImage> {
        match self {
            Self::Rgb24 => {
                let stride = size::align(4, width * 3) as usize;
                linear::from_linear24(PixelFormat::Bgr888, width, height, buf, Some(stride))
            }
            Self::Bgr24 => {
                let stride = size::align(4, width * 3) as usize;
                linear::from_linear24(PixelFormat::Rgb888, width, height, buf, Some(stride))
            }
            Self::Rgba32 => linear::from_linear32(PixelFormat::Abgr8888, width, height, buf, None),
            Self::Bgra32 => linear::from_linear32(PixelFormat::Argb8888, width, height, buf, None),
            Self::R8 => {
                let stride = size::align(4, width) as usize;
                linear::from_linear8(PixelFormat::R8, width, height, buf, Some(stride))
            }
            Self::Rgb9E5 => linear::from_linear32(PixelFormat::Rgb9E5, width, height, buf, None),
            Self::Dxt1 => s3tc::decode_dxt1(width, height, buf),
            Self::Dxt1A1 => s3tc::decode_dxt1_a1(width, height, buf),
            Self::Dxt3 => s3tc::decode_dxt3(width, height, buf),
            Self::Dxt5 => s3tc::decode_dxt5(width, height, buf),
            Self::Bc7 => bc7::decode_bc7(width, height, buf),
            Self::Etc2Rgb => etc::decode_etc2_rgb(width, height, buf),
            Self::Etc2RgbA1 => etc::decode_etc2_rgb_a1(width, height, buf),
            Self::Etc2Rgba => etc::decode_etc2_rgba(width, height, buf),
            Self::EacR11 => etc::decode_eac_r11(width, height, buf),
            Self::EacRg11 => etc::decode_eac_rg11(width, height, buf),
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

/// Printable name for a `vkFormat` value, when known.
pub fn vk_format_name(value: u32) -> Option<&'static str> {
    Some(match value {
        VK_FORMAT_R8_UNORM => "VK_FORMAT_R8_UNORM",
        VK_FORMAT_R8_UINT => "VK_FORMAT_R8_UINT",
        VK_FORMAT_R8_SRGB => "VK_FORMAT_R8_SRGB",
        VK_FORMAT_R8G8B8_UNORM => "VK_FORMAT_R8G8B8_UNORM",
        VK_FORMAT_R8G8B8_UINT => "VK_FORMAT_R8G8B8_UINT",
        VK_FORMAT_R8G8B8_SRGB => "VK_FORMAT_R8G8B8_SRGB",
        VK_FORMAT_B8G8R8_UNORM => "VK_FORMAT_B8G8R8_UNORM",
        VK_FORMAT_B8G8R8_UINT => "VK_FORMAT_B8G8R8_UINT",
        VK_FORMAT_B8G8R8_SRGB => "VK_FORMAT_B8G8R8_SRGB",
        VK_FORMAT_R8G8B8A8_UNORM => "VK_FORMAT_R8G8B8A8_UNORM",
        VK_FORMAT_R8G8B8A8_UINT => "VK_FORMAT_R8G8B8A8_UINT",
        VK_FORMAT_R8G8B8A8_SRGB => "VK_FORMAT_R8G8B8A8_SRGB",
        VK_FORMAT_B8G8R8A8_UNORM => "VK_FORMAT_B8G8R8A8_UNORM",
        VK_FORMAT_B8G8R8A8_UINT => "VK_FORMAT_B8G8R8A8_UINT",
        VK_FORMAT_B8G8R8A8_SRGB => "VK_FORMAT_B8G8R8A8_SRGB",
        VK_FORMAT_E5B9G9R9_UFLOAT_PACK32 => "VK_FORMAT_E5B9G9R9_UFLOAT_PACK32",
        VK_FORMAT_BC1_RGB_UNORM_BLOCK => "VK_FORMAT_BC1_RGB_UNORM_BLOCK",
        VK_FORMAT_BC1_RGB_SRGB_BLOCK => "VK_FORMAT_BC1_RGB_SRGB_BLOCK",
        VK_FORMAT_BC1_RGBA_UNORM_BLOCK => "VK_FORMAT_BC1_RGBA_UNORM_BLOCK",
        VK_FORMAT_BC1_RGBA_SRGB_BLOCK => "VK_FORMAT_BC1_RGBA_SRGB_BLOCK",
        VK_FORMAT_BC2_UNORM_BLOCK => "VK_FORMAT_BC2_UNORM_BLOCK",
        VK_FORMAT_BC2_SRGB_BLOCK => "VK_FORMAT_BC2_SRGB_BLOCK",
        VK_FORMAT_BC3_UNORM_BLOCK => "VK_FORMAT_BC3_UNORM_BLOCK",
        VK_FORMAT_BC3_SRGB_BLOCK => "VK_FORMAT_BC3_SRGB_BLOCK",
        VK_FORMAT_BC7_UNORM_BLOCK => "VK_FORMAT_BC7_UNORM_BLOCK",
        VK_FORMAT_BC7_SRGB_BLOCK => "VK_FORMAT_BC7_SRGB_BLOCK",
        VK_FORMAT_ETC2_R8G8B8_UNORM_BLOCK => "VK_FORMAT_ETC2_R8G8B8_UNORM_BLOCK",
        VK_FORMAT_ETC2_R8G8B8_SRGB_BLOCK => "VK_FORMAT_ETC2_R8G8B8_SRGB_BLOCK",
        VK_FORMAT_ETC2_R8G8B8A1_UNORM_BLOCK => "VK_FORMAT_ETC2_R8G8B8A1_UNORM_BLOCK",
        VK_FORMAT_ETC2_R8G8B8A1_SRGB_BLOCK => "VK_FORMAT_ETC2_R8G8B8A1_SRGB_BLOCK",
        VK_FORMAT_ETC2_R8G8B8A8_UNORM_BLOCK => "VK_FORMAT_ETC2_R8G8B8A8_UNORM_BLOCK",
        VK_FORMAT_ETC2_R8G8B8A8_SRGB_BLOCK => "VK_FORMAT_ETC2_R8G8B8A8_SRGB_BLOCK",
        VK_FORMAT_EAC_R11_UNORM_BLOCK => "VK_FORMAT_EAC_R11_UNORM_BLOCK",
        VK_FORMAT_EAC_R11_SNORM_BLOCK => "VK_FORMAT_EAC_R11_SNORM_BLOCK",
        VK_FORMAT_EAC_R11G11_UNORM_BLOCK => "VK_FORMAT_EAC_R11G11_UNORM_BLOCK",
        VK_FORMAT_EAC_R11G11_SNORM_BLOCK => "VK_FORMAT_EAC_R11G11_SNORM_BLOCK",
        157 => "VK_FORMAT_ASTC_4x4_UNORM_BLOCK",
        158 => "VK_FORMAT_ASTC_4x4_SRGB_BLOCK",
        159 => "VK_FORMAT_ASTC_5x4_UNORM_BLOCK",
        160 => "VK_FORMAT_ASTC_5x4_SRGB_BLOCK",
        161 => "VK_FORMAT_ASTC_5x5_UNORM_BLOCK",
        162 => "VK_FORMAT_ASTC_5x5_SRGB_BLOCK",
        163 => "VK_FORMAT_ASTC_6x5_UNORM_BLOCK",
        164 => "VK_FORMAT_ASTC_6x5_SRGB_BLOCK",
        165 => "VK_FORMAT_ASTC_6x6_UNORM_BLOCK",
        166 => "VK_FORMAT_ASTC_6x6_SRGB_BLOCK",
        167 => "VK_FORMAT_ASTC_8x5_UNORM_BLOCK",
        168 => "VK_FORMAT_ASTC_8x5_SRGB_BLOCK",
        169 => "VK_FORMAT_ASTC_8x6_UNORM_BLOCK",
        170 => "VK_FORMAT_ASTC_8x6_SRGB_BLOCK",
        171 => "VK_FORMAT_ASTC_8x8_UNORM_BLOCK",
        172 => "VK_FORMAT_ASTC_8x8_SRGB_BLOCK",
        173 => "VK_FORMAT_ASTC_10x5_UNORM_BLOCK",
        174 => "VK_FORMAT_ASTC_10x5_SRGB_BLOCK",
        175 => "VK_FORMAT_ASTC_10x6_UNORM_BLOCK",
        176 => "VK_FORMAT_ASTC_10x6_SRGB_BLOCK",
        177 => "VK_FORMAT_ASTC_10x8_UNORM_BLOCK",
        178 => "VK_FORMAT_ASTC_10x8_SRGB_BLOCK",
        179 => "VK_FORMAT_ASTC_10x10_UNORM_BLOCK",
        180 => "VK_FORMAT_ASTC_10x10_SRGB_BLOCK",
        181 => "VK_FORMAT_ASTC_12x10_UNORM_BLOCK",
        182 => "VK_FORMAT_ASTC_12x10_SRGB_BLOCK",
        183 => "VK_FORMAT_ASTC_12x12_UNORM_BLOCK",
        184 => "VK_FORMAT_ASTC_12x12_SRGB_BLOCK",
        VK_FORMAT_PVRTC1_2BPP_UNORM_BLOCK_IMG => "VK_FORMAT_PVRTC1_2BPP_UNORM_BLOCK_IMG",
        VK_FORMAT_PVRTC1_4BPP_UNORM_BLOCK_IMG => "VK_FORMAT_PVRTC1_4BPP_UNORM_BLOCK_IMG",
        VK_FORMAT_PVRTC2_2BPP_UNORM_BLOCK_IMG => "VK_FORMAT_PVRTC2_2BPP_UNORM_BLOCK_IMG",
        VK_FORMAT_PVRTC2_4BPP_UNORM_BLOCK_IMG => "VK_FORMAT_PVRTC2_4BPP_UNORM_BLOCK_IMG",
        VK_FORMAT_PVRTC1_2BPP_SRGB_BLOCK_IMG => "VK_FORMAT_PVRTC1_2BPP_SRGB_BLOCK_IMG",
        VK_FORMAT_PVRTC1_4BPP_SRGB_BLOCK_IMG => "VK_FORMAT_PVRTC1_4BPP_SRGB_BLOCK_IMG",
        VK_FORMAT_PVRTC2_2BPP_SRGB_BLOCK_IMG => "VK_FORMAT_PVRTC2_2BPP_SRGB_BLOCK_IMG",
        VK_FORMAT_PVRTC2_4BPP_SRGB_BLOCK_IMG => "VK_FORMAT_PVRTC2_4BPP_SRGB_BLOCK_IMG",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unorm_and_srgb_share_dispatch() {
        assert_eq!(
            VkDispatch::from_vk(VK_FORMAT_BC3_UNORM_BLOCK),
            VkDispatch::from_vk(VK_FORMAT_BC3_SRGB_BLOCK)
        );
    }

    #[test]
    fn astc_enum_range_maps_footprints() {
        assert_eq!(VkDispatch::from_vk(157), Some(VkDispatch::Astc(4, 4)));
        assert_eq!(VkDispatch::from_vk(158), Some(VkDispatch::Astc(4, 4)));
        assert_eq!(VkDispatch::from_vk(184), Some(VkDispatch::Astc(12, 12)));
    }

    #[test]
    fn undefined_format_is_none() {
        assert_eq!(VkDispatch::from_vk(VK_FORMAT_UNDEFINED), None);
        assert_eq!(vk_format_name(VK_FORMAT_UNDEFINED), None);
    }

    #[test]
    fn bc1_expected_size() {
        assert_eq!(
            VkDispatch::Dxt1.expected_size(16, 16),
            Some(128)
        );
    }
}
