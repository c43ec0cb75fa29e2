//! KTX2 header structures and parsing

use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};

use crate::error::TextureError;

/// KTX2 file identifier
pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, b'K', b'T', b'X', b' ', b'2', b'0', 0xBB, b'\r', b'\n', 0x1A, b'\n',
];

/// KTX2 header (80 bytes, always little-endian)
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = b"\xABKTX 20\xBB\r\n\x1A\n")]
pub struct Ktx2Header {
    /// Vulkan format of the texel data (`VK_FORMAT_*`)
    pub vk_format: u32,
    /// Size of one data type element in bytes
    pub type_size: u32,
    /// Width in pixels
    pub pixel_width: u32,
    /// Height in pixels (0 for 1D textures)
    pub pixel_height: u32,
    /// Depth in pixels (0 for 2D textures)
    pub pixel_depth: u32,
    /// Number of array layers (0 for non-arrays)
    pub layer_count: u32,
    /// Number of cubemap faces (1 or 6)
    pub face_count: u32,
    /// Number of mipmap levels (0 means "generate at load time")
    pub level_count: u32,
    /// Supercompression scheme (0 = none)
    pub supercompression_scheme: u32,
    /// Data format descriptor offset
    pub dfd_byte_offset: u32,
    /// Data format descriptor length
    pub dfd_byte_length: u32,
    /// Key/value data offset
    pub kvd_byte_offset: u32,
    /// Key/value data length
    pub kvd_byte_length: u32,
    /// Supercompression global data offset
    pub sgd_byte_offset: u64,
    /// Supercompression global data length
    pub sgd_byte_length: u64,
}

impl Ktx2Header {
    /// Total size of the serialized header.
    pub const SIZE: u64 = 80;
}

/// One entry in the level index that directly follows the header.
#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
pub struct Ktx2LevelIndex {
    /// Absolute byte offset of the level's data
    pub byte_offset: u64,
    /// Byte length of the (possibly supercompressed) level data
    pub byte_length: u64,
    /// Byte length after supercompression is undone
    pub uncompressed_byte_length: u64,
}

/// Map a `binrw` magic mismatch onto this crate's error type.
fn magic_error(err: binrw::Error, buf: &[u8]) -> binrw::Error {
    match err {
        binrw::Error::BadMagic { pos, .. } => {
            let mut magic = [0u8; 4];
            let n = buf.len().min(4);
            magic[..n].copy_from_slice(&buf[..n]);
            binrw::Error::Custom {
                pos,
                err: Box::new(TextureError::InvalidMagic(magic)),
            }
        }
        other => other,
    }
}

/// Read a KTX2 header, translating an identifier mismatch into
/// [`TextureError::InvalidMagic`].
pub fn read_ktx2_header<R: Read + Seek>(reader: &mut R) -> BinResult<Ktx2Header> {
    let start = reader.stream_position()?;
    let mut first = [0u8; 4];
    reader.read_exact(&mut first)?;
    reader.seek(binrw::io::SeekFrom::Start(start))?;
    Ktx2Header::read_le(reader).map_err(|e| magic_error(e, &first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(vk_format: u32, width: u32, height: u32, levels: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(80);
        buf.extend_from_slice(&KTX2_IDENTIFIER);
        for v in [vk_format, 1, width, height, 0, 0, 1, levels, 0, 0, 0, 0, 0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf
    }

    #[test]
    fn parses_header_fields() {
        let buf = header_bytes(137, 256, 128, 9);
        let hdr = read_ktx2_header(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(hdr.vk_format, 137);
        assert_eq!(hdr.pixel_width, 256);
        assert_eq!(hdr.pixel_height, 128);
        assert_eq!(hdr.level_count, 9);
        assert_eq!(hdr.supercompression_scheme, 0);
    }

    #[test]
    fn rejects_ktx1_identifier() {
        let mut buf = header_bytes(137, 256, 128, 9);
        buf[5] = b'1';
        buf[6] = b'1';
        let err = read_ktx2_header(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(
            err,
            binrw::Error::Custom { .. }
        ));
    }
}
