//! PowerVR header structures and parsing
//!
//! PowerVR 3.0.0 has no separate magic: the version field doubles as the
//! magic and as an endianness indicator. Legacy (pre-3.0) files are
//! detected by their header size, plus a trailing `PVR!` magic for v2.

use binrw::io::{Read, Seek, SeekFrom};
use binrw::{BinRead, BinResult};

use crate::error::TextureError;

/// `PVR\x03`, as read from a file matching our byte order.
pub const PVR3_VERSION: u32 = 0x0352_5650;
/// The version field of a byteswapped file.
pub const PVR3_VERSION_SWAPPED: u32 = 0x5056_5203;

/// Legacy magic, stored at offset 0x2C of a v2 header.
pub const PVR_LEGACY_MAGIC: [u8; 4] = *b"PVR!";

/// Serialized size of a legacy v1 header.
pub const PVR_LEGACY_V1_SIZE: u32 = 0x2C;
/// Serialized size of a legacy v2 header.
pub const PVR_LEGACY_V2_SIZE: u32 = 0x34;

/// PowerVR 3.0.0 header (52 bytes, either endianness)
///
/// The on-disk `pixel_format` field is a 64-bit value whose low word holds
/// the FourCC (or compressed-format enum) and whose high word holds the
/// per-channel depths, so the two words swap places in byteswapped files.
#[derive(Debug, Clone)]
pub struct Pvr3Header {
    /// Version magic, normalized to [`PVR3_VERSION`]
    pub version: u32,
    /// Flags (premultiplied alpha)
    pub flags: u32,
    /// Channel FourCC, or a compressed-format enum when `channel_depth` is 0
    pub pixel_format: u32,
    /// Per-channel bit depths, low byte first; 0 for compressed formats
    pub channel_depth: u32,
    /// Color space (0 = linear, 1 = sRGB)
    pub color_space: u32,
    /// Channel data type (`PVR3_CHTYPE_*`)
    pub channel_type: u32,
    /// Height in pixels
    pub height: u32,
    /// Width in pixels
    pub width: u32,
    /// Depth in pixels (1 for 2D textures)
    pub depth: u32,
    /// Number of array surfaces
    pub num_surfaces: u32,
    /// Number of cubemap faces
    pub num_faces: u32,
    /// Total number of mipmap levels, including the base image
    pub mipmap_count: u32,
    /// Size of the metadata block that follows the header
    pub metadata_size: u32,
}

impl Pvr3Header {
    /// Total size of the serialized header.
    pub const SIZE: u64 = 52;
}

/// Legacy (PVR v1/v2) header. Always little-endian; v1 ends after the
/// alpha mask, v2 appends the magic and a surface count.
#[derive(Debug, Clone, BinRead)]
#[br(little)]
pub struct PvrLegacyHeader {
    /// Header size in bytes, which is how v1 and v2 are told apart
    pub header_size: u32,
    /// Height in pixels
    pub height: u32,
    /// Width in pixels
    pub width: u32,
    /// Number of mipmap levels *excluding* the base image
    pub mipmap_count: u32,
    /// Pixel format byte in the low 8 bits, flags above
    pub pixel_format_and_flags: u32,
    /// Texture data size in bytes
    pub data_size: u32,
    /// Bits per pixel
    pub bit_count: u32,
    /// Red channel mask
    pub r_bit_mask: u32,
    /// Green channel mask
    pub g_bit_mask: u32,
    /// Blue channel mask
    pub b_bit_mask: u32,
    /// Alpha channel mask
    pub a_bit_mask: u32,
}

/// Detected PVR header variant.
#[derive(Debug, Clone)]
pub enum PvrHeader {
    /// PowerVR 3.0.0
    V3 {
        /// Parsed header, with the pixel-format words in native order
        header: Pvr3Header,
        /// The file does not match our byte order
        big_endian: bool,
    },
    /// Legacy v1 (no magic) or v2 (`PVR!` at offset 0x2C)
    Legacy {
        /// Parsed legacy header
        header: PvrLegacyHeader,
        /// Surface count (v2 only; 1 for v1)
        num_surfaces: u32,
        /// Legacy version, 1 or 2
        version: u8,
    },
}

fn read_words<R: Read, const N: usize>(reader: &mut R, big_endian: bool) -> BinResult<[u32; N]> {
    let mut raw = [0u8; 4];
    let mut out = [0u32; N];
    for word in &mut out {
        reader.read_exact(&mut raw)?;
        *word = if big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        };
    }
    Ok(out)
}

fn read_pvr3_rest<R: Read>(reader: &mut R, big_endian: bool) -> BinResult<Pvr3Header> {
    let w: [u32; 12] = read_words(reader, big_endian)?;
    // The pixel-format FourCC is the low word of a 64-bit field, so it
    // trades places with the channel depths in a byteswapped file.
    let (pixel_format, channel_depth) = if big_endian { (w[2], w[1]) } else { (w[1], w[2]) };
    Ok(Pvr3Header {
        version: PVR3_VERSION,
        flags: w[0],
        pixel_format,
        channel_depth,
        color_space: w[3],
        channel_type: w[4],
        height: w[5],
        width: w[6],
        depth: w[7],
        num_surfaces: w[8],
        num_faces: w[9],
        mipmap_count: w[10],
        metadata_size: w[11],
    })
}

/// Read a PVR header of any supported vintage, detecting the variant from
/// the first field.
pub fn read_pvr_header<R: Read + Seek>(reader: &mut R) -> BinResult<PvrHeader> {
    let start = reader.stream_position()?;
    let mut first = [0u8; 4];
    reader.read_exact(&mut first)?;

    match u32::from_le_bytes(first) {
        PVR3_VERSION => Ok(PvrHeader::V3 {
            header: read_pvr3_rest(reader, false)?,
            big_endian: false,
        }),
        PVR3_VERSION_SWAPPED => Ok(PvrHeader::V3 {
            header: read_pvr3_rest(reader, true)?,
            big_endian: true,
        }),
        PVR_LEGACY_V1_SIZE | PVR_LEGACY_V2_SIZE => {
            reader.seek(SeekFrom::Start(start))?;
            let header = PvrLegacyHeader::read_le(reader)?;
            if header.header_size == PVR_LEGACY_V1_SIZE {
                return Ok(PvrHeader::Legacy {
                    header,
                    num_surfaces: 1,
                    version: 1,
                });
            }
            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic)?;
            if magic != PVR_LEGACY_MAGIC {
                return Err(binrw::Error::Custom {
                    pos: start + 0x2C,
                    err: Box::new(TextureError::InvalidMagic(magic)),
                });
            }
            let [num_surfaces] = read_words(reader, false)?;
            Ok(PvrHeader::Legacy {
                header,
                num_surfaces,
                version: 2,
            })
        }
        _ => Err(binrw::Error::Custom {
            pos: start,
            err: Box::new(TextureError::InvalidMagic(first)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn v3_words() -> [u32; 12] {
        // flags, pixel_format, channel_depth, color_space, channel_type,
        // height, width, depth, surfaces, faces, mipmaps, metadata
        [
            0,
            u32::from_le_bytes(*b"rgba"),
            0x0808_0808,
            0,
            0,
            32,
            64,
            1,
            1,
            1,
            1,
            0,
        ]
    }

    #[test]
    fn parses_little_endian_v3() {
        let mut buf = PVR3_VERSION.to_le_bytes().to_vec();
        for w in v3_words() {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        let PvrHeader::V3 { header, big_endian } =
            read_pvr_header(&mut Cursor::new(&buf)).unwrap()
        else {
            panic!("expected v3");
        };
        assert!(!big_endian);
        assert_eq!(header.width, 64);
        assert_eq!(header.height, 32);
        assert_eq!(header.pixel_format, u32::from_le_bytes(*b"rgba"));
        assert_eq!(header.channel_depth, 0x0808_0808);
    }

    #[test]
    fn parses_byteswapped_v3() {
        // A big-endian writer stores the version bytes in reverse and the
        // 64-bit pixel-format field with its words transposed.
        let mut buf = PVR3_VERSION.to_be_bytes().to_vec();
        let w = v3_words();
        buf.extend_from_slice(&w[0].to_be_bytes());
        buf.extend_from_slice(&w[2].to_be_bytes());
        buf.extend_from_slice(&w[1].to_be_bytes());
        for v in &w[3..] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        let PvrHeader::V3 { header, big_endian } =
            read_pvr_header(&mut Cursor::new(&buf)).unwrap()
        else {
            panic!("expected v3");
        };
        assert!(big_endian);
        assert_eq!(header.width, 64);
        assert_eq!(header.pixel_format, u32::from_le_bytes(*b"rgba"));
        assert_eq!(header.channel_depth, 0x0808_0808);
    }

    #[test]
    fn detects_legacy_v2_by_size_and_magic() {
        let mut buf = Vec::new();
        for w in [0x34u32, 16, 16, 3, 0x12, 1024, 32, 0, 0, 0, 0] {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        buf.extend_from_slice(&PVR_LEGACY_MAGIC);
        buf.extend_from_slice(&1u32.to_le_bytes());
        let PvrHeader::Legacy {
            header,
            num_surfaces,
            version,
        } = read_pvr_header(&mut Cursor::new(&buf)).unwrap()
        else {
            panic!("expected legacy");
        };
        assert_eq!(version, 2);
        assert_eq!(num_surfaces, 1);
        assert_eq!(header.mipmap_count, 3);
    }

    #[test]
    fn rejects_v2_size_without_magic() {
        let mut buf = Vec::new();
        for w in [0x34u32, 16, 16, 3, 0x12, 1024, 32, 0, 0, 0, 0, 0, 1] {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        assert!(read_pvr_header(&mut Cursor::new(&buf)).is_err());
    }

    #[test]
    fn rejects_unknown_first_word() {
        let buf = [0u8; 52];
        assert!(read_pvr_header(&mut Cursor::new(&buf)).is_err());
    }
}
