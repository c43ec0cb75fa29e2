//! ASTC texture file
//!
//! The `.astc` container is a bare 16-byte header followed by the block
//! data, unpadded. Dimensions are 24-bit little-endian and there is no
//! mipmap concept at all, so [`TextureFile::mipmap_count`] reports -1.

use std::io::SeekFrom;

use binrw::io::{Read, Seek};
use binrw::{BinRead, BinResult};
use gputex_decode::size::calc_image_size_astc;
use gputex_decode::{DecodedImage, astc};
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{MAX_FILE_SIZE, MAX_TEXTURE_DIMENSION, TextureFile};

/// ASTC file magic, as stored on disk.
pub const ASTC_MAGIC: [u8; 4] = 0x5CA1_AB13u32.to_le_bytes();

fn u24(b: [u8; 3]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], 0])
}

/// ASTC file header (16 bytes)
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = b"\x13\xAB\xA1\x5C")]
pub struct AstcHeader {
    /// Block width in texels
    pub block_x: u8,
    /// Block height in texels
    pub block_y: u8,
    /// Block depth in texels (1 for 2D textures)
    pub block_z: u8,
    /// Width in pixels (24-bit)
    #[br(map = u24)]
    pub width: u32,
    /// Height in pixels (24-bit)
    #[br(map = u24)]
    pub height: u32,
    /// Depth in pixels (24-bit)
    #[br(map = u24)]
    pub depth: u32,
}

impl AstcHeader {
    /// Total size of the serialized header.
    pub const SIZE: u64 = 16;
}

/// Read an ASTC header, translating a magic mismatch into
/// [`TextureError::InvalidMagic`].
pub fn read_astc_header<R: Read + Seek>(reader: &mut R) -> BinResult<AstcHeader> {
    let start = reader.stream_position()?;
    let mut first = [0u8; 4];
    reader.read_exact(&mut first)?;
    reader.seek(binrw::io::SeekFrom::Start(start))?;
    AstcHeader::read_le(reader).map_err(|err| match err {
        binrw::Error::BadMagic { pos, .. } => binrw::Error::Custom {
            pos,
            err: Box::new(TextureError::InvalidMagic(first)),
        },
        other => other,
    })
}

/// ASTC texture file
pub struct AstcFile {
    reader: Box<dyn ReadSeek>,
    header: AstcHeader,
    file_size: u64,
    pixel_format: String,
    cache: Option<DecodedImage>,
}

impl AstcFile {
    /// Parse an ASTC file from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        let header = read_astc_header(&mut reader)?;

        if header.width == 0
            || header.width > MAX_TEXTURE_DIMENSION
            || header.height == 0
            || header.height > MAX_TEXTURE_DIMENSION
        {
            return Err(TextureError::InvalidDimensions {
                width: header.width,
                height: header.height,
            });
        }
        // 3D block footprints are valid ASTC but have no decoder here.
        if header.block_z > 1 || header.depth > 1 {
            return Err(TextureError::Unsupported("3D ASTC texture"));
        }

        let pixel_format = format!("ASTC_{}x{}", header.block_x, header.block_y);
        debug!(
            width = header.width,
            height = header.height,
            block_x = header.block_x,
            block_y = header.block_y,
            "parsed ASTC header"
        );
        Ok(Self {
            reader,
            header,
            file_size,
            pixel_format,
            cache: None,
        })
    }

    /// Underlying header.
    #[must_use]
    pub fn header(&self) -> &AstcHeader {
        &self.header
    }

    fn decode(&mut self) -> TextureResult<DecodedImage> {
        let h = &self.header;
        let expected = calc_image_size_astc(h.width, h.height, h.block_x, h.block_y)
            .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
        let available = self.file_size.saturating_sub(AstcHeader::SIZE) as usize;
        if expected > available {
            return Err(TextureError::TruncatedData {
                expected,
                available,
            });
        }
        self.reader.seek(SeekFrom::Start(AstcHeader::SIZE))?;
        let mut buf = vec![0u8; expected];
        self.reader.read_exact(&mut buf)?;
        Ok(astc::decode_astc(
            h.width, h.height, h.block_x, h.block_y, &buf,
        )?)
    }
}

impl TextureFile for AstcFile {
    fn format_name(&self) -> &'static str {
        "ASTC"
    }

    fn pixel_format(&self) -> &str {
        &self.pixel_format
    }

    fn width(&self) -> u32 {
        self.header.width
    }

    fn height(&self) -> u32 {
        self.header.height
    }

    fn mipmap_count(&self) -> i32 {
        // The container has no mipmap concept.
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
                    warn!(%err, "ASTC decode failed");
                    return None;
                }
            }
        }
        self.cache.as_ref()
    }
}
