//! KTX v1 header structures and parsing

use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};

use crate::error::TextureError;

/// KTX v1 file identifier
pub const KTX_IDENTIFIER: [u8; 12] = [
    0xAB, b'K', b'T', b'X', b' ', b'1', b'1', 0xBB, b'\r', b'\n', 0x1A, b'\n',
];

/// Endianness sentinel as written by a same-endian producer
pub const KTX_ENDIAN_MAGIC: u32 = 0x0403_0201;

/// KTX v1 header (64 bytes)
///
/// All fields after the identifier use the endianness declared by the
/// sentinel; `read_options` resolves that and stores native values.
#[derive(Debug, Clone)]
pub struct KtxHeader {
    /// Endianness sentinel (`0x04030201` read in file order)
    pub endianness: u32,
    /// GL type of the texel data (0 for compressed formats)
    pub gl_type: u32,
    /// Size of the GL type in bytes
    pub gl_type_size: u32,
    /// GL format (0 for compressed formats)
    pub gl_format: u32,
    /// GL internal format (the authoritative format for compressed data)
    pub gl_internal_format: u32,
    /// GL base internal format
    pub gl_base_internal_format: u32,
    /// Width in pixels
    pub pixel_width: u32,
    /// Height in pixels (0 for 1D textures)
    pub pixel_height: u32,
    /// Depth in pixels (0 for 2D textures)
    pub pixel_depth: u32,
    /// Number of array elements (0 for non-arrays)
    pub number_of_array_elements: u32,
    /// Number of cubemap faces (1 or 6)
    pub number_of_faces: u32,
    /// Number of mipmap levels (0 means "generate at load time")
    pub number_of_mipmap_levels: u32,
    /// Byte length of the key/value data block
    pub bytes_of_key_value_data: u32,
}

impl KtxHeader {
    /// Total size of the serialized header.
    pub const SIZE: u64 = 64;

    /// True when the data payload is opposite-endian to the host.
    #[must_use]
    pub fn is_byteswap_needed(&self) -> bool {
        self.endianness != KTX_ENDIAN_MAGIC
    }

    /// Endianness of all multi-byte values in the file.
    #[must_use]
    pub fn data_endian(&self) -> binrw::Endian {
        if self.endianness == KTX_ENDIAN_MAGIC {
            binrw::Endian::Little
        } else {
            binrw::Endian::Big
        }
    }
}

impl BinRead for KtxHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut identifier = [0u8; 12];
        reader.read_exact(&mut identifier)?;
        if identifier != KTX_IDENTIFIER {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&identifier[..4]);
            return Err(binrw::Error::Custom {
                pos: 0,
                err: Box::new(TextureError::InvalidMagic(magic)),
            });
        }

        // The sentinel reads as 0x04030201 in the file's own endianness.
        let endianness = u32::read_options(reader, binrw::Endian::Little, ())?;
        let endian = match endianness {
            KTX_ENDIAN_MAGIC => binrw::Endian::Little,
            0x0102_0304 => binrw::Endian::Big,
            other => {
                return Err(binrw::Error::Custom {
                    pos: 12,
                    err: Box::new(TextureError::UnsupportedVersion(other)),
                });
            }
        };

        let mut fields = [0u32; 12];
        for field in &mut fields {
            *field = u32::read_options(reader, endian, ())?;
        }

        Ok(Self {
            endianness,
            gl_type: fields[0],
            gl_type_size: fields[1],
            gl_format: fields[2],
            gl_internal_format: fields[3],
            gl_base_internal_format: fields[4],
            pixel_width: fields[5],
            pixel_height: fields[6],
            pixel_depth: fields[7],
            number_of_array_elements: fields[8],
            number_of_faces: fields[9],
            number_of_mipmap_levels: fields[10],
            bytes_of_key_value_data: fields[11],
        })
    }
}
