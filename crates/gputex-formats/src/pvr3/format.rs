//! PowerVR3 pixel format tables and decode dispatch

use gputex_decode::size::{self, ExpandOp};
use gputex_decode::{DecodeError, DecodeResult, DecodedImage, PixelFormat};
use gputex_decode::{astc, etc, linear, pvrtc, s3tc};
use gputex_decode::bc7;

/// Unsigned byte, normalized.
pub const PVR3_CHTYPE_UBYTE_NORM: u32 = 0;
/// Unsigned byte.
pub const PVR3_CHTYPE_UBYTE: u32 = 2;
/// Unsigned short, normalized.
pub const PVR3_CHTYPE_USHORT_NORM: u32 = 4;
/// Unsigned short.
pub const PVR3_CHTYPE_USHORT: u32 = 6;
/// IEEE float.
pub const PVR3_CHTYPE_FLOAT: u32 = 12;

// Compressed pixel formats, used when the channel-depth word is zero.
pub const PVR3_PXF_PVRTC_2BPP_RGB: u32 = 0;
pub const PVR3_PXF_PVRTC_2BPP_RGBA: u32 = 1;
pub const PVR3_PXF_PVRTC_4BPP_RGB: u32 = 2;
pub const PVR3_PXF_PVRTC_4BPP_RGBA: u32 = 3;
pub const PVR3_PXF_PVRTCII_2BPP: u32 = 4;
pub const PVR3_PXF_PVRTCII_4BPP: u32 = 5;
pub const PVR3_PXF_ETC1: u32 = 6;
pub const PVR3_PXF_DXT1: u32 = 7;
pub const PVR3_PXF_DXT2: u32 = 8;
pub const PVR3_PXF_DXT3: u32 = 9;
pub const PVR3_PXF_DXT4: u32 = 10;
pub const PVR3_PXF_DXT5: u32 = 11;
pub const PVR3_PXF_BC4: u32 = 12;
pub const PVR3_PXF_BC5: u32 = 13;
pub const PVR3_PXF_BC6: u32 = 14;
pub const PVR3_PXF_BC7: u32 = 15;
pub const PVR3_PXF_R9G9B9E5: u32 = 19;
pub const PVR3_PXF_ETC2_RGB: u32 = 22;
pub const PVR3_PXF_ETC2_RGBA: u32 = 23;
pub const PVR3_PXF_ETC2_RGB_A1: u32 = 24;
pub const PVR3_PXF_EAC_R11: u32 = 25;
pub const PVR3_PXF_EAC_RG11: u32 = 26;
pub const PVR3_PXF_ASTC_4X4: u32 = 27;
pub const PVR3_PXF_ASTC_12X12: u32 = 40;

/// Display names for the compressed formats, indexed by enum value.
/// 2D ASTC stops at 12x12; the 3D footprints exist but never decode.
static PVR3_PXF_NAMES: [&str; 51] = [
    "PVRTC 2bpp RGB",
    "PVRTC 2bpp RGBA",
    "PVRTC 4bpp RGB",
    "PVRTC 4bpp RGBA",
    "PVRTC-II 2bpp",
    "PVRTC-II 4bpp",
    "ETC1",
    "DXT1",
    "DXT2",
    "DXT3",
    "DXT4",
    "DXT5",
    "BC4",
    "BC5",
    "BC6",
    "BC7",
    "UYVY",
    "YUY2",
    "BW1bpp",
    "R9G9B9E5 Shared Exponent",
    "RGBG8888",
    "GRGB8888",
    "ETC2 RGB",
    "ETC2 RGBA",
    "ETC2 RGB A1",
    "EAC R11",
    "EAC RG11",
    "ASTC_4x4",
    "ASTC_5x4",
    "ASTC_5x5",
    "ASTC_6x5",
    "ASTC_6x6",
    "ASTC_8x5",
    "ASTC_8x6",
    "ASTC_8x8",
    "ASTC_10x5",
    "ASTC_10x6",
    "ASTC_10x8",
    "ASTC_10x10",
    "ASTC_12x10",
    "ASTC_12x12",
    "ASTC_3x3x3",
    "ASTC_4x3x3",
    "ASTC_4x4x3",
    "ASTC_4x4x4",
    "ASTC_5x4x4",
    "ASTC_5x5x4",
    "ASTC_5x5x5",
    "ASTC_6x5x5",
    "ASTC_6x6x5",
    "ASTC_6x6x6",
];

/// 2D ASTC block footprints, indexed from [`PVR3_PXF_ASTC_4X4`].
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

/// Uncompressed format lookup entry.
///
/// `fourcc` holds the channel letters in file order (low byte first), so a
/// texture that prints as "RGBA8888" stores `b"rgba"` here even though it
/// decodes through [`PixelFormat::Abgr8888`].
#[derive(Debug, Clone, Copy)]
pub struct FmtEntry {
    /// Channel FourCC, low byte first
    pub fourcc: u32,
    /// Per-channel depths, paired byte-for-byte with the FourCC
    pub channel_depth: u32,
    /// Matching linear pixel format
    pub format: PixelFormat,
    /// Total bits per pixel
    pub bits: u8,
}

const fn cc(s: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*s)
}

const fn entry(fourcc: &[u8; 4], channel_depth: u32, format: PixelFormat, bits: u8) -> FmtEntry {
    FmtEntry {
        fourcc: cc(fourcc),
        channel_depth,
        format,
        bits,
    }
}

/// Unsigned-byte uncompressed formats.
static FMT_TBL_U8: [FmtEntry; 19] = [
    entry(b"a\0\0\0", 0x0000_0008, PixelFormat::A8, 8),
    entry(b"l\0\0\0", 0x0000_0008, PixelFormat::L8, 8),
    entry(b"la\0\0", 0x0000_0808, PixelFormat::A8L8, 16),
    entry(b"rg\0\0", 0x0000_0808, PixelFormat::Gr88, 16),
    entry(b"rgb\0", 0x0008_0808, PixelFormat::Bgr888, 24),
    entry(b"rgba", 0x0808_0808, PixelFormat::Abgr8888, 32),
    entry(b"abgr", 0x0808_0808, PixelFormat::Rgba8888, 32),
    entry(b"rgb\0", 0x0005_0605, PixelFormat::Bgr565, 16),
    entry(b"rgba", 0x0404_0404, PixelFormat::Abgr4444, 16),
    entry(b"rgba", 0x0105_0505, PixelFormat::Abgr1555, 16),
    entry(b"bgr\0", 0x0008_0808, PixelFormat::Rgb888, 24),
    entry(b"bgra", 0x0808_0808, PixelFormat::Argb8888, 32),
    // Layouts produced by the legacy v1/v2 format translation.
    entry(b"bgr\0", 0x0005_0605, PixelFormat::Rgb565, 16),
    entry(b"bgr\0", 0x0005_0505, PixelFormat::Rgb555, 16),
    entry(b"bgra", 0x0404_0404, PixelFormat::Argb4444, 16),
    entry(b"bgra", 0x0105_0505, PixelFormat::Argb1555, 16),
    entry(b"abgr", 0x0404_0404, PixelFormat::Rgba4444, 16),
    entry(b"abgr", 0x0505_0501, PixelFormat::Rgba5551, 16),
    entry(b"argb", 0x0808_0808, PixelFormat::Bgra8888, 32),
];

/// Unsigned-short uncompressed formats.
static FMT_TBL_U16: [FmtEntry; 1] = [entry(b"rg\0\0", 0x0000_1010, PixelFormat::G16R16, 32)];

/// Find the linear decode entry for an uncompressed pixel format, gated on
/// the channel data type.
pub fn lookup_uncompressed(
    channel_type: u32,
    pixel_format: u32,
    channel_depth: u32,
) -> Option<&'static FmtEntry> {
    let table: &[FmtEntry] = match channel_type {
        PVR3_CHTYPE_UBYTE_NORM | PVR3_CHTYPE_UBYTE => &FMT_TBL_U8,
        PVR3_CHTYPE_USHORT_NORM | PVR3_CHTYPE_USHORT => &FMT_TBL_U16,
        _ => return None,
    };
    table
        .iter()
        .find(|e| e.fourcc == pixel_format && e.channel_depth == channel_depth)
}

/// Build the display name for a PowerVR3 pixel format.
///
/// Uncompressed formats print their channel letters in file order followed
/// by the per-channel depths, e.g. `b"rgba"` / `0x08080808` is "RGBA8888".
pub fn pvr3_pixel_format_name(pixel_format: u32, channel_depth: u32) -> String {
    if channel_depth == 0 {
        return PVR3_PXF_NAMES.get(pixel_format as usize).map_or_else(
            || format!("Unknown (Compressed: {pixel_format:#010X})"),
            |&name| String::from(name),
        );
    }

    let mut letters = String::with_capacity(4);
    let mut depths = String::with_capacity(8);
    let mut pf = pixel_format;
    let mut cd = channel_depth;
    for _ in 0..4 {
        let ch = (pf & 0xFF) as u8;
        if ch == 0 {
            break;
        }
        letters.push(ch.to_ascii_uppercase() as char);
        depths.push_str(&(cd & 0xFF).to_string());
        pf >>= 8;
        cd >>= 8;
    }
    if letters.is_empty() {
        return String::from("Unknown");
    }
    letters + &depths
}

/// Translate a legacy (PVR v1/v2) pixel format byte into the v3
/// FourCC + channel-depth representation.
///
/// Returns `(pixel_format, channel_depth, channel_type)` in v3 terms, or
/// `None` for formats with no v3 equivalent (YUV packings, 1bpp mono).
pub fn translate_legacy_format(format: u8) -> Option<(u32, u32, u32)> {
    let norm = PVR3_CHTYPE_UBYTE_NORM;
    Some(match format {
        // MGL formats
        0x00 => (cc(b"bgra"), 0x0404_0404, norm), // ARGB4444
        0x01 => (cc(b"bgra"), 0x0105_0505, norm), // ARGB1555
        0x02 => (cc(b"bgr\0"), 0x0005_0605, norm), // RGB565
        0x03 => (cc(b"bgr\0"), 0x0005_0505, norm), // RGB555
        0x04 => (cc(b"bgr\0"), 0x0008_0808, norm), // RGB888
        0x05 => (cc(b"bgra"), 0x0808_0808, norm), // ARGB8888
        // 0x06 (ARGB8332) has no linear conversion; left untranslated.
        0x07 | 0x16 => (cc(b"l\0\0\0"), 0x0000_0008, norm), // I8
        0x08 | 0x17 => (cc(b"la\0\0"), 0x0000_0808, norm), // AI88
        0x0C | 0x18 => (PVR3_PXF_PVRTC_2BPP_RGBA, 0, norm),
        0x0D | 0x19 => (PVR3_PXF_PVRTC_4BPP_RGBA, 0, norm),
        // OGL formats
        0x10 => (cc(b"abgr"), 0x0404_0404, norm), // RGBA4444
        0x11 => (cc(b"abgr"), 0x0505_0501, norm), // RGBA5551
        0x12 => (cc(b"abgr"), 0x0808_0808, norm), // RGBA8888
        0x13 => (cc(b"bgr\0"), 0x0005_0605, norm), // RGB565
        0x14 => (cc(b"bgr\0"), 0x0005_0505, norm), // RGB555
        0x15 => (cc(b"bgr\0"), 0x0008_0808, norm), // RGB888
        0x1A => (cc(b"argb"), 0x0808_0808, norm), // BGRA8888
        0x1B => (cc(b"a\0\0\0"), 0x0000_0008, norm), // A8
        // D3D block formats
        0x20 => (PVR3_PXF_DXT1, 0, norm),
        0x21 => (PVR3_PXF_DXT2, 0, norm),
        0x22 => (PVR3_PXF_DXT3, 0, norm),
        0x23 => (PVR3_PXF_DXT4, 0, norm),
        0x24 => (PVR3_PXF_DXT5, 0, norm),
        0x36 => (PVR3_PXF_ETC1, 0, norm),
        _ => return None,
    })
}

fn is_ubyte(channel_type: u32) -> bool {
    matches!(channel_type, PVR3_CHTYPE_UBYTE_NORM | PVR3_CHTYPE_UBYTE)
}

fn astc_footprint(pixel_format: u32) -> Option<(u8, u8)> {
    if (PVR3_PXF_ASTC_4X4..=PVR3_PXF_ASTC_12X12).contains(&pixel_format) {
        Some(ASTC_FOOTPRINTS[(pixel_format - PVR3_PXF_ASTC_4X4) as usize])
    } else {
        None
    }
}

/// Expected payload size for the base image of a PowerVR3 texture.
///
/// Returns `None` when the format is unknown or the channel data type does
/// not fit the pixel format.
pub fn pvr3_expected_size(
    pixel_format: u32,
    channel_depth: u32,
    channel_type: u32,
    width: u32,
    height: u32,
) -> Option<usize> {
    if channel_depth != 0 {
        let entry = lookup_uncompressed(channel_type, pixel_format, channel_depth)?;
        let bytespp = (u32::from(entry.bits) + 7) / 8;
        return size::calc_image_size_linear(bytespp, 1, width, height);
    }

    match pixel_format {
        PVR3_PXF_PVRTC_2BPP_RGB | PVR3_PXF_PVRTC_2BPP_RGBA | PVR3_PXF_PVRTCII_2BPP
            if is_ubyte(channel_type) =>
        {
            size::calc_image_size_pvrtc_pot(true, width, height)
        }
        PVR3_PXF_PVRTC_4BPP_RGB | PVR3_PXF_PVRTC_4BPP_RGBA | PVR3_PXF_PVRTCII_4BPP
            if is_ubyte(channel_type) =>
        {
            size::calc_image_size_pvrtc_pot(false, width, height)
        }
        PVR3_PXF_ETC1
        | PVR3_PXF_DXT1
        | PVR3_PXF_BC4
        | PVR3_PXF_ETC2_RGB
        | PVR3_PXF_ETC2_RGB_A1
        | PVR3_PXF_EAC_R11
            if is_ubyte(channel_type) =>
        {
            size::calc_image_size(ExpandOp::Divide2, width, height)
        }
        PVR3_PXF_DXT2 | PVR3_PXF_DXT3 | PVR3_PXF_DXT4 | PVR3_PXF_DXT5 | PVR3_PXF_BC5
        | PVR3_PXF_BC6 | PVR3_PXF_BC7 | PVR3_PXF_ETC2_RGBA | PVR3_PXF_EAC_RG11
            if is_ubyte(channel_type) =>
        {
            size::calc_image_size(ExpandOp::None, width, height)
        }
        PVR3_PXF_R9G9B9E5 if channel_type == PVR3_CHTYPE_FLOAT => {
            size::calc_image_size(ExpandOp::Multiply4, width, height)
        }
        _ if is_ubyte(channel_type) => {
            let (bx, by) = astc_footprint(pixel_format)?;
            size::calc_image_size_astc(width, height, bx, by)
        }
        _ => None,
    }
}

/// Decode one PowerVR3 image payload.
pub fn pvr3_decode(
    pixel_format: u32,
    channel_depth: u32,
    channel_type: u32,
    width: u32,
    height: u32,
    buf: &[u8],
) -> DecodeResult<DecodedImage> {
    if channel_depth != 0 {
        let entry = lookup_uncompressed(channel_type, pixel_format, channel_depth)
            .ok_or(DecodeError::UnsupportedFormat("unrecognized channel layout"))?;
        return match entry.bits {
            8 => linear::from_linear8(entry.format, width, height, buf, None),
            15 | 16 => linear::from_linear16(entry.format, width, height, buf, None),
            24 => linear::from_linear24(entry.format, width, height, buf, None),
            32 => linear::from_linear32(entry.format, width, height, buf, None),
            _ => Err(DecodeError::UnsupportedFormat("unsupported bit depth")),
        };
    }

    match pixel_format {
        PVR3_PXF_PVRTC_2BPP_RGB | PVR3_PXF_PVRTC_2BPP_RGBA => {
            pvrtc::decode_pvrtc_2bpp(width, height, buf)
        }
        PVR3_PXF_PVRTC_4BPP_RGB | PVR3_PXF_PVRTC_4BPP_RGBA => {
            pvrtc::decode_pvrtc_4bpp(width, height, buf)
        }
        PVR3_PXF_PVRTCII_2BPP | PVR3_PXF_PVRTCII_4BPP => {
            Err(DecodeError::UnsupportedFormat("PVRTC-II"))
        }
        PVR3_PXF_ETC1 => etc::decode_etc1(width, height, buf),
        PVR3_PXF_ETC2_RGB => etc::decode_etc2_rgb(width, height, buf),
        PVR3_PXF_ETC2_RGB_A1 => etc::decode_etc2_rgb_a1(width, height, buf),
        PVR3_PXF_ETC2_RGBA => etc::decode_etc2_rgba(width, height, buf),
        PVR3_PXF_EAC_R11 => etc::decode_eac_r11(width, height, buf),
        PVR3_PXF_EAC_RG11 => etc::decode_eac_rg11(width, height, buf),
        PVR3_PXF_DXT1 => s3tc::decode_dxt1(width, height, buf),
        PVR3_PXF_DXT2 => s3tc::decode_dxt2(width, height, buf),
        PVR3_PXF_DXT3 => s3tc::decode_dxt3(width, height, buf),
        PVR3_PXF_DXT4 => s3tc::decode_dxt4(width, height, buf),
        PVR3_PXF_DXT5 => s3tc::decode_dxt5(width, height, buf),
        PVR3_PXF_BC4 => s3tc::decode_bc4(width, height, buf),
        PVR3_PXF_BC5 => s3tc::decode_bc5(width, height, buf),
        PVR3_PXF_BC7 => bc7::decode_bc7(width, height, buf),
        PVR3_PXF_R9G9B9E5 => linear::from_linear32(PixelFormat::Rgb9E5, width, height, buf, None),
        _ => {
            let (bx, by) = astc_footprint(pixel_format)
                .ok_or(DecodeError::UnsupportedFormat("unrecognized pixel format"))?;
            astc::decode_astc(width, height, bx, by, buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn uncompressed_names_follow_channel_order() {
        assert_eq!(
            pvr3_pixel_format_name(cc(b"rgba"), 0x0808_0808),
            "RGBA8888"
        );
        assert_eq!(pvr3_pixel_format_name(cc(b"rgb\0"), 0x0005_0605), "RGB565");
        assert_eq!(pvr3_pixel_format_name(cc(b"la\0\0"), 0x0000_0808), "LA88");
        assert_eq!(pvr3_pixel_format_name(0, 0x0808_0808), "Unknown");
    }

    #[test]
    fn compressed_names_come_from_the_table() {
        assert_eq!(pvr3_pixel_format_name(PVR3_PXF_DXT5, 0), "DXT5");
        assert_eq!(pvr3_pixel_format_name(PVR3_PXF_ASTC_4X4, 0), "ASTC_4x4");
        assert_eq!(
            pvr3_pixel_format_name(999, 0),
            "Unknown (Compressed: 0x000003E7)"
        );
    }

    #[test]
    fn channel_type_gates_the_lookup() {
        // R9G9B9E5 only makes sense with float channels.
        assert_eq!(
            pvr3_expected_size(PVR3_PXF_R9G9B9E5, 0, PVR3_CHTYPE_UBYTE_NORM, 4, 4),
            None
        );
        assert_eq!(
            pvr3_expected_size(PVR3_PXF_R9G9B9E5, 0, PVR3_CHTYPE_FLOAT, 4, 4),
            Some(64)
        );
        // G16R16 lives in the unsigned-short table.
        assert!(lookup_uncompressed(PVR3_CHTYPE_UBYTE_NORM, cc(b"rg\0\0"), 0x0000_1010).is_none());
        assert!(lookup_uncompressed(PVR3_CHTYPE_USHORT_NORM, cc(b"rg\0\0"), 0x0000_1010).is_some());
    }

    #[test]
    fn pvrtc_sizes_use_the_power_of_two_formula() {
        assert_eq!(
            pvr3_expected_size(PVR3_PXF_PVRTC_4BPP_RGBA, 0, PVR3_CHTYPE_UBYTE_NORM, 32, 32),
            Some(512)
        );
        assert_eq!(
            pvr3_expected_size(PVR3_PXF_PVRTC_2BPP_RGB, 0, PVR3_CHTYPE_UBYTE_NORM, 32, 32),
            Some(256)
        );
    }

    #[test]
    fn legacy_translation_round_trips_through_the_lookup() {
        // OGL RGBA8888
        let (pf, cd, ct) = translate_legacy_format(0x12).unwrap();
        let entry = lookup_uncompressed(ct, pf, cd).unwrap();
        assert_eq!(entry.format, PixelFormat::Rgba8888);
        // MGL ARGB4444
        let (pf, cd, ct) = translate_legacy_format(0x00).unwrap();
        let entry = lookup_uncompressed(ct, pf, cd).unwrap();
        assert_eq!(entry.format, PixelFormat::Argb4444);
        // D3D DXT1 maps onto the compressed enum.
        assert_eq!(
            translate_legacy_format(0x20),
            Some((PVR3_PXF_DXT1, 0, PVR3_CHTYPE_UBYTE_NORM))
        );
        assert_eq!(translate_legacy_format(0x0A), None);
    }

    #[test]
    fn pvrtc_ii_is_recognized_but_never_decodes() {
        assert!(
            pvr3_expected_size(PVR3_PXF_PVRTCII_4BPP, 0, PVR3_CHTYPE_UBYTE_NORM, 16, 16).is_some()
        );
        assert!(pvr3_decode(PVR3_PXF_PVRTCII_4BPP, 0, PVR3_CHTYPE_UBYTE_NORM, 16, 16, &[0; 128]).is_err());
    }
}
