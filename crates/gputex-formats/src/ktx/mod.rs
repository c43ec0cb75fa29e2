//! Khronos KTX v1 texture container
//!
//! KTX v1 stores a 64-byte header, an optional key/value data block, then
//! each mipmap level prefixed by a `u32` image size. The endianness of every
//! multi-byte value is declared by a sentinel in the header, so a KTX file
//! written on either endianness parses everywhere.
//!
//! The `KTXorientation` key is honored: GL texture coordinates put the
//! origin at the bottom-left, so textures without orientation metadata are
//! flipped vertically for display.

mod gl_format;
mod header;

pub use gl_format::{GlDispatch, gl_internal_format_name};
pub use header::{KTX_ENDIAN_MAGIC, KTX_IDENTIFIER, KtxHeader};

use std::io::SeekFrom;

use binrw::BinRead;
use gputex_decode::size::align;
use gputex_decode::{DecodedImage, FlipOp};
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{
    MAX_FILE_SIZE, MAX_METADATA_SIZE, MAX_TEXTURE_DIMENSION, MipmapDescriptor, TextureFile,
};

/// Orientation values mapped to flip operations (the R component of the
/// value string is ignored).
const ORIENTATION_TABLE: [(&[u8; 7], Option<FlipOp>); 4] = [
    (b"S=r,T=d", None),
    (b"S=r,T=u", Some(FlipOp::Vertical)),
    (b"S=l,T=d", Some(FlipOp::Horizontal)),
    (b"S=l,T=u", Some(FlipOp::Both)),
];

/// Khronos KTX v1 texture file
pub struct KhronosKtx {
    reader: Box<dyn ReadSeek>,
    header: KtxHeader,
    file_size: u64,
    tex_data_start: u64,
    flip: Option<FlipOp>,
    dispatch: Option<GlDispatch>,
    pixel_format: String,
    key_values: Vec<(String, String)>,
    mipmaps: Option<Vec<MipmapDescriptor>>,
    cache: Vec<Option<DecodedImage>>,
}

impl KhronosKtx {
    /// Parse a KTX v1 file from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        let header = KtxHeader::read_le(&mut reader)?;

        // `pixel_height == 0` is a 1D texture and stays legal.
        if header.pixel_width == 0
            || header.pixel_width > MAX_TEXTURE_DIMENSION
            || header.pixel_height > MAX_TEXTURE_DIMENSION
        {
            return Err(TextureError::InvalidDimensions {
                width: header.pixel_width,
                height: header.pixel_height,
            });
        }
        if header.bytes_of_key_value_data > MAX_METADATA_SIZE {
            return Err(TextureError::MetadataTooLarge {
                size: header.bytes_of_key_value_data,
                max: MAX_METADATA_SIZE,
            });
        }

        let tex_data_start = align(
            4,
            (KtxHeader::SIZE as u32).wrapping_add(header.bytes_of_key_value_data),
        ) as u64;

        let dispatch = GlDispatch::from_gl(header.gl_format, header.gl_internal_format);
        let pixel_format = gl_internal_format_name(header.gl_internal_format)
            .map_or_else(
                || format!("Unknown (0x{:04X})", header.gl_internal_format),
                String::from,
            );
        debug!(
            gl_format = header.gl_format,
            gl_internal_format = header.gl_internal_format,
            width = header.pixel_width,
            height = header.pixel_height,
            "parsed KTX header"
        );

        let mut ktx = Self {
            reader,
            header,
            file_size,
            tex_data_start,
            // GL's origin is bottom-left; flip for display by default.
            flip: Some(FlipOp::Vertical),
            dispatch,
            pixel_format,
            key_values: Vec::new(),
            mipmaps: None,
            cache: Vec::new(),
        };
        ktx.load_key_value_data()?;
        Ok(ktx)
    }

    /// Parsed key/value metadata pairs, in file order.
    #[must_use]
    pub fn key_values(&self) -> &[(String, String)] {
        &self.key_values
    }

    /// Underlying header.
    #[must_use]
    pub fn header(&self) -> &KtxHeader {
        &self.header
    }

    fn load_key_value_data(&mut self) -> TextureResult<()> {
        let kvd_len = self.header.bytes_of_key_value_data as usize;
        // Minimum useful entry: u32 size + empty key + NUL.
        if kvd_len < 5 {
            return Ok(());
        }
        self.reader.seek(SeekFrom::Start(KtxHeader::SIZE))?;
        let mut buf = vec![0u8; kvd_len];
        self.reader.read_exact(&mut buf)?;

        let endian_le = !self.header.is_byteswap_needed();
        let mut has_orientation = false;
        let mut p = 0usize;
        while p + 4 <= kvd_len {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[p..p + 4]);
            let sz = if endian_le {
                u32::from_le_bytes(raw)
            } else {
                u32::from_be_bytes(raw)
            } as usize;
            if sz < 2 {
                // Needs at least an empty key and its NUL terminator.
                break;
            }
            if p + 4 + sz > kvd_len {
                warn!("key/value entry extends past the metadata block");
                break;
            }
            p += 4;
            let entry = &buf[p..p + sz];
            let Some(key_len) = entry.iter().position(|&b| b == 0) else {
                break;
            };
            let value = &entry[key_len + 1..];
            // The value must end with exactly one trailing NUL.
            let Some(value_len) = value.iter().position(|&b| b == 0) else {
                break;
            };
            if value_len != value.len().saturating_sub(1) {
                break;
            }
            let key = String::from_utf8_lossy(&entry[..key_len]).into_owned();
            let value_bytes = &value[..value_len];

            // Specification says case-sensitive, but "KTXOrientation" exists
            // in the wild; only the first instance counts.
            if !has_orientation && key.eq_ignore_ascii_case("KTXorientation") {
                has_orientation = true;
                for (pattern, op) in &ORIENTATION_TABLE {
                    if value_bytes.len() >= 7 && &value_bytes[..7] == *pattern {
                        self.flip = *op;
                        break;
                    }
                }
            }
            self.key_values
                .push((key, String::from_utf8_lossy(value_bytes).into_owned()));

            p += align(4, sz as u32) as usize;
        }
        Ok(())
    }

    /// Walk the level index, validating each stored image size against the
    /// computed expectation. Stops at the first inconsistent level.
    fn build_mipmaps(&mut self) -> TextureResult<&[MipmapDescriptor]> {
        if self.mipmaps.is_none() {
            let dispatch = self
                .dispatch
                .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
            let num_levels = self.header.number_of_mipmap_levels.max(1);
            let endian_le = !self.header.is_byteswap_needed();
            let arrays = self.header.number_of_array_elements;

            let mut descriptors = Vec::with_capacity(num_levels as usize);
            let mut offset = self.tex_data_start;
            let mut width = self.header.pixel_width;
            let mut height = self.header.pixel_height.max(1);
            for _ in 0..num_levels {
                let Some(expected) = dispatch.expected_size(width, height) else {
                    break;
                };
                if offset + 4 + expected as u64 > self.file_size {
                    warn!(offset, expected, "mipmap level does not fit in the file");
                    break;
                }
                self.reader.seek(SeekFrom::Start(offset))?;
                let mut raw = [0u8; 4];
                self.reader.read_exact(&mut raw)?;
                let stored = if endian_le {
                    u32::from_le_bytes(raw)
                } else {
                    u32::from_be_bytes(raw)
                };
                // Multi-element arrays store the combined size.
                let per_element = if arrays > 1 { stored / arrays } else { stored };
                if per_element as usize != expected {
                    warn!(stored, expected, "image size field mismatch");
                    break;
                }
                descriptors.push(MipmapDescriptor {
                    byte_offset: offset + 4,
                    byte_length: expected,
                    width,
                    height,
                });
                offset += 4 + u64::from(align(4, stored));
                if width == 1 && height == 1 {
                    break;
                }
                width = (width / 2).max(1);
                height = (height / 2).max(1);
            }
            self.cache = vec![None; descriptors.len()];
            self.mipmaps = Some(descriptors);
        }
        Ok(self.mipmaps.as_deref().unwrap_or(&[]))
    }

    fn decode_level(&mut self, level: usize) -> TextureResult<DecodedImage> {
        let desc = *self
            .build_mipmaps()?
            .get(level)
            .ok_or(TextureError::Unsupported("mipmap level out of range"))?;
        let dispatch = self
            .dispatch
            .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
        self.reader.seek(SeekFrom::Start(desc.byte_offset))?;
        let mut buf = vec![0u8; desc.byte_length];
        self.reader.read_exact(&mut buf)?;
        let mut img = dispatch.decode(desc.width, desc.height, &buf)?;
        if let Some(op) = self.flip {
            img = img.flip(op);
        }
        Ok(img)
    }
}

impl TextureFile for KhronosKtx {
    fn format_name(&self) -> &'static str {
        "Khronos KTX"
    }

    fn pixel_format(&self) -> &str {
        &self.pixel_format
    }

    fn width(&self) -> u32 {
        self.header.pixel_width
    }

    fn height(&self) -> u32 {
        self.header.pixel_height.max(1)
    }

    fn mipmap_count(&self) -> i32 {
        self.header.number_of_mipmap_levels.max(1) as i32 - 1
    }

    fn mipmap(&mut self, level: usize) -> Option<&DecodedImage> {
        if self.cache.get(level).is_some_and(Option::is_some) {
            return self.cache[level].as_ref();
        }
        match self.decode_level(level) {
            Ok(img) => {
                self.cache[level] = Some(img);
                self.cache[level].as_ref()
            }
            Err(err) => {
                warn!(level, %err, "mipmap decode failed");
                None
            }
        }
    }
}
