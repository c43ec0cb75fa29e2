//! Microsoft Xbox XPR0 texture file
//!
//! XPR0 is the standalone-texture flavor of the Xbox packed-resource
//! format; XPR1/XPR2 are multi-resource archives and are rejected.
//! Dimensions are usually stored as power-of-two exponents packed into
//! two nibbles; a few titles use the non-power-of-two fallback bytes
//! instead, where the stored value n means `(n + 1) * 16` pixels.
//!
//! Most uncompressed modes are swizzled: the GPU interleaves the x/y
//! coordinate bits for cache locality, so the linear decode is followed
//! by an unswizzle pass that inverts the bit interleave.

use std::io::SeekFrom;

use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};
use gputex_decode::swizzle::{fill_pattern, generate_swizzle_masks};
use gputex_decode::{DecodeResult, DecodedImage, PixelFormat, linear, s3tc};
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{MAX_TEXTURE_DIMENSION, TextureFile};

/// XPR0 magic, compared big-endian on disk.
pub const XPR0_MAGIC: [u8; 4] = *b"XPR0";

/// XPR0 files are small; anything larger is not a standalone texture.
const XPR0_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// XPR0 header (32 bytes)
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = b"XPR0")]
pub struct Xpr0Header {
    /// Total file size as recorded in the header
    pub file_size: u32,
    /// Offset of the texture data
    pub data_offset: u32,
    /// Resource flags
    pub flags: u32,
    /// D3D lock field, unused here
    pub lock: u32,
    /// Pixel format byte (`mode table index`)
    pub pixel_format: u8,
    /// Width exponent in the high nibble; 0 selects the NPOT fallback
    pub width_pow2: u8,
    /// Height exponent in the low nibble; 0 selects the NPOT fallback
    pub height_pow2: u8,
    /// Stored mipmap level count
    pub mipmap_levels: u8,
    /// NPOT width fallback: width is `(n + 1) * 16`
    pub width_npot: u8,
    /// NPOT height fallback: height is `(n + 1) * 16`
    pub height_npot: u8,
    reserved: [u8; 6],
}

impl Xpr0Header {
    /// Total size of the serialized header.
    pub const SIZE: u64 = 32;
}

/// Read an XPR0 header. XPR1/XPR2 archives are recognized and rejected
/// with a distinct error.
pub fn read_xpr0_header<R: Read + Seek>(reader: &mut R) -> BinResult<Xpr0Header> {
    let start = reader.stream_position()?;
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if matches!(&magic, b"XPR1" | b"XPR2") {
        return Err(binrw::Error::Custom {
            pos: start,
            err: Box::new(TextureError::Unsupported("XPR archive")),
        });
    }
    reader.seek(binrw::io::SeekFrom::Start(start))?;
    Xpr0Header::read_le(reader).map_err(|err| match err {
        binrw::Error::BadMagic { pos, .. } => binrw::Error::Custom {
            pos,
            err: Box::new(TextureError::InvalidMagic(magic)),
        },
        other => other,
    })
}

/// One entry of the pixel-format mode table.
#[derive(Debug, Clone, Copy)]
struct XprMode {
    /// Bits per pixel; 0 marks an undecodable entry
    bpp: u8,
    format: Option<PixelFormat>,
    /// DXTn variant (1, 2 or 4); 0 for linear formats
    dxtn: u8,
    /// Stored with interleaved coordinate bits
    swizzled: bool,
}

const fn lin(bpp: u8, format: PixelFormat, swizzled: bool) -> XprMode {
    XprMode {
        bpp,
        format: Some(format),
        dxtn: 0,
        swizzled,
    }
}

const fn dxt(bpp: u8, dxtn: u8) -> XprMode {
    XprMode {
        bpp,
        format: None,
        dxtn,
        swizzled: false,
    }
}

const fn und(swizzled: bool) -> XprMode {
    XprMode {
        bpp: 0,
        format: None,
        dxtn: 0,
        swizzled,
    }
}

/// Mode table indexed by the pixel format byte. Unimplemented layouts
/// (palette, YUV, depth/stencil, bump formats) keep their slots so the
/// indices stay aligned with the hardware enum.
static MODE_TBL: [XprMode; 0x42] = [
    lin(8, PixelFormat::L8, true),        // 0x00: L8
    und(true),                            // 0x01: AL8
    lin(16, PixelFormat::Argb1555, true), // 0x02: ARGB1555
    lin(16, PixelFormat::Rgb555, true),   // 0x03: RGB555
    lin(16, PixelFormat::Argb4444, true), // 0x04: ARGB4444
    lin(16, PixelFormat::Rgb565, true),   // 0x05: RGB565
    lin(32, PixelFormat::Argb8888, true), // 0x06: ARGB8888
    lin(32, PixelFormat::Xrgb8888, true), // 0x07: xRGB8888
    und(false),                           // 0x08
    und(false),                           // 0x09
    und(false),                           // 0x0A
    und(true),                            // 0x0B: P8
    dxt(4, 1),                            // 0x0C: DXT1
    und(false),                           // 0x0D
    dxt(8, 2),                            // 0x0E: DXT2
    dxt(8, 4),                            // 0x0F: DXT4
    lin(16, PixelFormat::Argb1555, false), // 0x10: Linear ARGB1555
    lin(16, PixelFormat::Rgb565, false),  // 0x11: Linear RGB565
    lin(32, PixelFormat::Argb8888, false), // 0x12: Linear ARGB8888
    lin(8, PixelFormat::L8, false),       // 0x13: Linear L8
    und(false),                           // 0x14
    und(false),                           // 0x15
    und(false),                           // 0x16: Linear R8B8
    und(false),                           // 0x17: Linear G8B8
    und(false),                           // 0x18
    lin(8, PixelFormat::A8, true),        // 0x19: A8
    lin(16, PixelFormat::A8L8, true),     // 0x1A: A8L8
    und(false),                           // 0x1B: Linear AL8
    lin(16, PixelFormat::Rgb555, false),  // 0x1C: Linear RGB555
    lin(16, PixelFormat::Argb4444, false), // 0x1D: Linear ARGB4444
    lin(32, PixelFormat::Xrgb8888, false), // 0x1E: Linear xRGB8888
    lin(8, PixelFormat::A8, false),       // 0x1F: Linear A8
    lin(16, PixelFormat::A8L8, false),    // 0x20: Linear A8L8
    und(false),                           // 0x21
    und(false),                           // 0x22
    und(false),                           // 0x23
    und(true),                            // 0x24: YUY2
    und(true),                            // 0x25: UYVY
    und(false),                           // 0x26
    und(true),                            // 0x27: L6V5U5
    und(true),                            // 0x28: V8U8
    und(true),                            // 0x29: R8B8
    und(true),                            // 0x2A: D24S8
    und(true),                            // 0x2B: F24S8
    und(true),                            // 0x2C: D16
    und(true),                            // 0x2D: F16
    und(false),                           // 0x2E: Linear D24S8
    und(false),                           // 0x2F: Linear F24S8
    und(false),                           // 0x30: Linear D16
    und(false),                           // 0x31: Linear F16
    lin(16, PixelFormat::L16, true),      // 0x32: L16
    und(true),                            // 0x33: V16U16
    und(false),                           // 0x34
    lin(16, PixelFormat::L16, false),     // 0x35: Linear L16
    und(false),                           // 0x36: Linear V16U16
    und(false),                           // 0x37: Linear L6V5U5
    lin(16, PixelFormat::Rgba5551, true), // 0x38: RGBA5551
    lin(16, PixelFormat::Rgba4444, true), // 0x39: RGBA4444
    lin(32, PixelFormat::Abgr8888, true), // 0x3A: QWVU8888
    lin(32, PixelFormat::Bgra8888, true), // 0x3B: BGRA8888
    lin(32, PixelFormat::Rgba8888, true), // 0x3C: RGBA8888
    lin(16, PixelFormat::Rgba5551, false), // 0x3D: Linear RGBA5551
    lin(16, PixelFormat::Rgba4444, false), // 0x3E: Linear RGBA4444
    lin(32, PixelFormat::Abgr8888, false), // 0x3F: Linear ABGR8888
    lin(32, PixelFormat::Bgra8888, false), // 0x40: Linear BGRA8888
    lin(32, PixelFormat::Rgba8888, false), // 0x41: Linear RGBA8888
];

/// Display names for the pixel format byte.
static PXFMT_NAMES: [Option<&str>; 0x65] = [
    Some("L8"),
    Some("AL8"),
    Some("ARGB1555"),
    Some("RGB555"),
    Some("ARGB4444"),
    Some("RGB565"),
    Some("ARGB8888"),
    Some("xRGB8888"),
    None,
    None,
    None,
    Some("P8"),
    Some("DXT1"),
    None,
    Some("DXT2"),
    Some("DXT4"),
    Some("Linear ARGB1555"),
    Some("Linear RGB565"),
    Some("Linear ARGB8888"),
    Some("Linear L8"),
    None,
    None,
    Some("Linear R8B8"),
    Some("Linear G8B8"),
    None,
    Some("A8"),
    Some("A8L8"),
    Some("Linear AL8"),
    Some("Linear RGB555"),
    Some("Linear ARGB4444"),
    Some("Linear xRGB8888"),
    Some("Linear A8"),
    Some("Linear A8L8"),
    None,
    None,
    None,
    Some("YUY2"),
    Some("UYVY"),
    None,
    Some("L6V5U5"),
    Some("V8U8"),
    Some("R8B8"),
    Some("D24S8"),
    Some("F24S8"),
    Some("D16"),
    Some("F16"),
    Some("Linear D24S8"),
    Some("Linear F24S8"),
    Some("Linear D16"),
    Some("Linear F16"),
    Some("L16"),
    Some("V16U16"),
    None,
    Some("Linear L16"),
    Some("Linear V16U16"),
    Some("Linear L6V5U5"),
    Some("RGBA5551"),
    Some("RGBA4444"),
    Some("QWVU8888"),
    Some("BGRA8888"),
    Some("RGBA8888"),
    Some("Linear RGBA5551"),
    Some("Linear RGBA4444"),
    Some("Linear ABGR8888"),
    Some("Linear BGRA8888"),
    Some("Linear RGBA8888"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("Vertex Data"),
    Some("Index16"),
];

/// Invert the coordinate-bit interleave of a decoded ARGB image.
fn unswizzle(img: &DecodedImage) -> DecodeResult<DecodedImage> {
    let (width, height) = (img.width(), img.height());
    let (mask_x, mask_y) = generate_swizzle_masks(width, height);
    let src = img.pixels();
    let mut dst = vec![0u32; src.len()];
    for y in 0..height {
        let row_mask = fill_pattern(mask_y, y);
        for x in 0..width {
            let offset = (fill_pattern(mask_x, x) | row_mask) as usize;
            dst[(y * width + x) as usize] = src[offset];
        }
    }
    let mut out = DecodedImage::from_pixels(width, height, dst)?;
    if let Some(sbit) = img.sbit() {
        out.set_sbit(sbit);
    }
    Ok(out)
}

/// Xbox XPR0 texture file
pub struct XboxXpr {
    reader: Box<dyn ReadSeek>,
    header: Xpr0Header,
    file_size: u64,
    width: u32,
    height: u32,
    pixel_format: String,
    cache: Option<DecodedImage>,
}

impl XboxXpr {
    /// Parse an XPR0 file from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > XPR0_MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: XPR0_MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        let header = read_xpr0_header(&mut reader)?;

        let width = Self::dimension(header.width_pow2 >> 4, header.width_npot);
        let height = Self::dimension(header.height_pow2 & 0x0F, header.height_npot);
        if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
            return Err(TextureError::InvalidDimensions { width, height });
        }

        let pixel_format = PXFMT_NAMES
            .get(header.pixel_format as usize)
            .copied()
            .flatten()
            .map_or_else(
                || format!("Unknown ({:#04X})", header.pixel_format),
                String::from,
            );
        debug!(
            width,
            height,
            pixel_format,
            data_offset = header.data_offset,
            "parsed XPR0 header"
        );
        Ok(Self {
            reader,
            header,
            file_size,
            width,
            height,
            pixel_format,
            cache: None,
        })
    }

    /// Resolve one axis: a pow2 exponent nibble, or the NPOT fallback
    /// byte when the nibble is zero.
    fn dimension(pow2_nibble: u8, npot: u8) -> u32 {
        if pow2_nibble == 0 {
            (u32::from(npot) + 1) * 16
        } else {
            1u32 << pow2_nibble
        }
    }

    /// Underlying header.
    #[must_use]
    pub fn header(&self) -> &Xpr0Header {
        &self.header
    }

    fn decode(&mut self) -> TextureResult<DecodedImage> {
        let mode = *MODE_TBL
            .get(self.header.pixel_format as usize)
            .filter(|m| m.bpp != 0)
            .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;

        let area = u64::from(self.width) * u64::from(self.height);
        let expected = (area * u64::from(mode.bpp) / 8) as usize;
        let data_offset = u64::from(self.header.data_offset);
        let available = self.file_size.saturating_sub(data_offset) as usize;
        if data_offset < Xpr0Header::SIZE || expected > available {
            return Err(TextureError::TruncatedData {
                expected,
                available,
            });
        }
        self.reader.seek(SeekFrom::Start(data_offset))?;
        let mut buf = vec![0u8; expected];
        self.reader.read_exact(&mut buf)?;

        let img = match mode.dxtn {
            // Assume punch-through alpha; opaque DXT1 decodes the same.
            1 => s3tc::decode_dxt1_a1(self.width, self.height, &buf)?,
            2 => s3tc::decode_dxt2(self.width, self.height, &buf)?,
            4 => s3tc::decode_dxt4(self.width, self.height, &buf)?,
            _ => {
                let format = mode
                    .format
                    .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
                match mode.bpp {
                    8 => linear::from_linear8(format, self.width, self.height, &buf, None)?,
                    16 => linear::from_linear16(format, self.width, self.height, &buf, None)?,
                    32 => linear::from_linear32(format, self.width, self.height, &buf, None)?,
                    _ => {
                        return Err(TextureError::UnsupportedPixelFormat(
                            self.pixel_format.clone(),
                        ));
                    }
                }
            }
        };

        // Unswizzling needs whole 4px tiles; otherwise return as-is.
        if mode.swizzled && self.width % 4 == 0 && self.height % 4 == 0 {
            return Ok(unswizzle(&img)?);
        }
        Ok(img)
    }
}

impl TextureFile for XboxXpr {
    fn format_name(&self) -> &'static str {
        "Microsoft Xbox XPR0"
    }

    fn pixel_format(&self) -> &str {
        &self.pixel_format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn mipmap_count(&self) -> i32 {
        // Only the base image is exposed.
        -1
    }

    fn mipmap(&mut self, level: usize) -> Option<&DecodedImage> {
        if level != 0 {
            return None;
        }
        if self.cache.is_none() {
            match self.decode() {
                Ok(img) => self.cache = Some(img),
                Err(err) => {
                    warn!(%err, "XPR0 decode failed");
                    return None;
                }
            }
        }
        self.cache.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn xpr0_file(
        pixel_format: u8,
        width_pow2: u8,
        height_pow2: u8,
        npot: (u8, u8),
        data: &[u8],
    ) -> Vec<u8> {
        let mut buf = XPR0_MAGIC.to_vec();
        buf.extend_from_slice(&((32 + data.len()) as u32).to_le_bytes());
        buf.extend_from_slice(&32u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.push(pixel_format);
        buf.push(width_pow2);
        buf.push(height_pow2);
        buf.push(0);
        buf.push(npot.0);
        buf.push(npot.1);
        buf.resize(32, 0);
        buf.extend_from_slice(data);
        buf
    }

    #[test]
    fn npot_fallback_dimensions() {
        // Zero exponents select the fallback bytes: (24 + 1) * 16 = 400.
        let file = xpr0_file(0x0C, 0x00, 0x00, (24, 24), &[0u8; 400 * 400 / 2]);
        let xpr = XboxXpr::new(Box::new(Cursor::new(file))).unwrap();
        assert_eq!(xpr.dimensions(), (400, 400));
        assert_eq!(xpr.pixel_format(), "DXT1");
        assert_eq!(xpr.mipmap_count(), -1);
    }

    #[test]
    fn pow2_nibbles_set_dimensions() {
        let data: Vec<u8> = [0xFFu8, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0].repeat(8);
        let mut xpr =
            XboxXpr::new(Box::new(Cursor::new(xpr0_file(0x0C, 0x30, 0x04, (0, 0), &data))))
                .unwrap();
        assert_eq!(xpr.dimensions(), (8, 16));
        let img = xpr.image().unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFF_FFFF));
    }

    #[test]
    fn rejects_xpr_archives() {
        let mut file = xpr0_file(0x0C, 0x30, 0x30, (0, 0), &[0u8; 32]);
        file[..4].copy_from_slice(b"XPR1");
        assert!(matches!(
            XboxXpr::new(Box::new(Cursor::new(file))),
            Err(TextureError::BinRw(_))
        ));
    }

    #[test]
    fn swizzled_argb8888_is_unswizzled() {
        // 4x4 swizzled ARGB8888: swizzled order interleaves x/y bits, so
        // linear index yx (bits y1 x1 y0 x0) holds pixel (x, y).
        let mut data = vec![0u8; 4 * 4 * 4];
        for y in 0u32..4 {
            for x in 0u32..4 {
                let sw = ((y & 1) << 1 | (x & 1) | (y & 2) << 2 | (x & 2) << 1) as usize;
                let argb: u32 = 0xFF00_0000 | (x << 16) | y;
                data[sw * 4..sw * 4 + 4].copy_from_slice(&argb.to_le_bytes());
            }
        }
        let mut xpr =
            XboxXpr::new(Box::new(Cursor::new(xpr0_file(0x06, 0x20, 0x02, (0, 0), &data))))
                .unwrap();
        let img = xpr.image().unwrap();
        for y in 0u32..4 {
            for x in 0u32..4 {
                assert_eq!(img.pixel(x, y), Some(0xFF00_0000 | (x << 16) | y));
            }
        }
    }

    #[test]
    fn swizzled_image_below_tile_size_returns_as_is() {
        // 2x4 swizzled L8: width is not a multiple of 4, so the decoded
        // image comes back without the unswizzle pass.
        let file = xpr0_file(0x00, 0x10, 0x02, (0, 0), &[0x80; 8]);
        let mut xpr = XboxXpr::new(Box::new(Cursor::new(file))).unwrap();
        assert_eq!(xpr.dimensions(), (2, 4));
        let img = xpr.image().unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFF80_8080));
    }

    #[test]
    fn undecodable_mode_keeps_its_name() {
        let file = xpr0_file(0x24, 0x40, 0x04, (0, 0), &[0u8; 1024]);
        let mut xpr = XboxXpr::new(Box::new(Cursor::new(file))).unwrap();
        assert_eq!(xpr.pixel_format(), "YUY2");
        assert!(xpr.image().is_none());
    }

    #[test]
    fn truncated_payload_fails_decode() {
        let file = xpr0_file(0x12, 0x40, 0x04, (0, 0), &[0u8; 512]);
        let mut xpr = XboxXpr::new(Box::new(Cursor::new(file))).unwrap();
        // 16x16 ARGB8888 needs 1024 bytes.
        assert!(xpr.image().is_none());
    }

    #[test]
    fn unknown_format_byte_reports_unknown() {
        let file = xpr0_file(0x70, 0x40, 0x04, (0, 0), &[0u8; 1024]);
        let xpr = XboxXpr::new(Box::new(Cursor::new(file))).unwrap();
        assert_eq!(xpr.pixel_format(), "Unknown (0x70)");
    }
}
