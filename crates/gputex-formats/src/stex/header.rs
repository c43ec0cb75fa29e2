//! Godot STEX header structures and parsing

use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};

use crate::error::TextureError;

/// Godot 3 magic, as stored on disk
pub const STEX3_MAGIC: [u8; 4] = *b"GDST";
/// Godot 4 magic, as stored on disk
pub const STEX4_MAGIC: [u8; 4] = *b"GST2";

/// Highest Godot 4 format version this parser understands.
pub const STEX4_FORMAT_VERSION: u32 = 1;

/// Pixel format bits within the v3 `format` field / v4 `pixel_format` field.
pub const STEX_FORMAT_MASK: u32 = 0x000F_FFFF;
/// v3: an embedded lossless (PNG/WebP) payload follows the header.
pub const STEX_FORMAT_FLAG_LOSSLESS: u32 = 1 << 20;
/// v3: an embedded lossy (WebP) payload follows the header.
pub const STEX_FORMAT_FLAG_LOSSY: u32 = 1 << 21;
/// v3: the texture data contains a mipmap chain.
pub const STEX_FORMAT_FLAG_HAS_MIPMAPS: u32 = 1 << 23;

/// Godot 4 `data_format` values.
pub const STEX4_DATA_FORMAT_IMAGE: u32 = 0;
pub const STEX4_DATA_FORMAT_PNG: u32 = 1;
pub const STEX4_DATA_FORMAT_WEBP: u32 = 2;
pub const STEX4_DATA_FORMAT_BASIS_UNIVERSAL: u32 = 3;

/// Godot 3 header (20 bytes incl. magic, little-endian)
#[derive(Debug, Clone, BinRead)]
#[br(little)]
pub struct Stex3Header {
    /// Width in pixels
    pub width: u16,
    /// Display width when the stored image is padded
    pub width_rescale: u16,
    /// Height in pixels
    pub height: u16,
    /// Display height when the stored image is padded
    pub height_rescale: u16,
    /// Texture flags (mipmaps, repeat, filter, ...)
    pub flags: u32,
    /// Pixel format in the low 20 bits, storage flags above
    pub format: u32,
}

impl Stex3Header {
    /// Total size of the serialized header, including the magic.
    pub const SIZE: u64 = 20;
}

/// Godot 4 header (52 bytes incl. magic, little-endian)
#[derive(Debug, Clone, BinRead)]
#[br(little)]
pub struct Stex4Header {
    /// Format version (currently 1)
    pub version: u32,
    /// Display width
    pub width: u32,
    /// Display height
    pub height: u32,
    /// Storage flags
    pub format_flags: u32,
    /// Mipmap limit
    pub mipmap_limit: u32,
    reserved: [u32; 3],
    /// How the texel data is stored (raw image, PNG, WebP, Basis)
    pub data_format: u32,
    /// Stored image width
    pub img_width: u16,
    /// Stored image height
    pub img_height: u16,
    /// Number of stored levels, including the base image
    pub mipmap_count: u32,
    /// Pixel format in the low 20 bits
    pub pixel_format: u32,
}

impl Stex4Header {
    /// Total size of the serialized header, including the magic.
    pub const SIZE: u64 = 52;
}

/// Sub-header in front of an embedded PNG/WebP payload.
#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
pub struct StexEmbedHeader {
    /// Payload size in bytes, including the FourCC
    pub size: u32,
    /// Payload FourCC (`PNG ` or `WEBP`)
    pub fourcc: [u8; 4],
}

impl StexEmbedHeader {
    /// Total size of the serialized sub-header.
    pub const SIZE: u64 = 8;
}

/// Version-tagged STEX header.
#[derive(Debug, Clone)]
pub enum StexHeader {
    V3(Stex3Header),
    V4(Stex4Header),
}

impl BinRead for StexHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        match magic {
            STEX3_MAGIC => Ok(Self::V3(Stex3Header::read_le(reader)?)),
            STEX4_MAGIC => {
                let header = Stex4Header::read_le(reader)?;
                if header.version > STEX4_FORMAT_VERSION {
                    return Err(binrw::Error::Custom {
                        pos: 4,
                        err: Box::new(TextureError::UnsupportedVersion(header.version)),
                    });
                }
                Ok(Self::V4(header))
            }
            _ => Err(binrw::Error::Custom {
                pos: 0,
                err: Box::new(TextureError::InvalidMagic(magic)),
            }),
        }
    }
}

impl StexHeader {
    /// Byte offset where texture (or embed-header) data begins.
    pub fn data_start(&self) -> u64 {
        match self {
            Self::V3(_) => Stex3Header::SIZE,
            Self::V4(_) => Stex4Header::SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_v3_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&STEX3_MAGIC);
        for v in [64u16, 64, 32, 32] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(&(0x11 | STEX_FORMAT_FLAG_HAS_MIPMAPS).to_le_bytes());

        let hdr = StexHeader::read_le(&mut Cursor::new(&buf)).unwrap();
        let StexHeader::V3(v3) = hdr else {
            panic!("expected v3");
        };
        assert_eq!(v3.width, 64);
        assert_eq!(v3.height, 32);
        assert_eq!(v3.format & STEX_FORMAT_MASK, 0x11);
        assert_ne!(v3.format & STEX_FORMAT_FLAG_HAS_MIPMAPS, 0);
    }

    #[test]
    fn rejects_future_v4_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&STEX4_MAGIC);
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.resize(52, 0);
        assert!(StexHeader::read_le(&mut Cursor::new(&buf)).is_err());
    }

    #[test]
    fn rejects_unknown_magic() {
        let buf = *b"NOPE\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";
        assert!(StexHeader::read_le(&mut Cursor::new(&buf)).is_err());
    }
}
