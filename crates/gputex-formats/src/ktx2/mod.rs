//! Khronos KTX2 texture container
//!
//! KTX2 replaces KTX v1's GL enums with a single Vulkan `vkFormat` and is
//! little-endian throughout. An explicit level index follows the 80-byte
//! header, so mipmap levels can live anywhere in the file.
//!
//! Supercompressed payloads (BasisLZ, Zstandard, ZLIB) and
//! `VK_FORMAT_UNDEFINED` textures parse but never decode.

mod header;
mod vk_format;

pub use header::{KTX2_IDENTIFIER, Ktx2Header, Ktx2LevelIndex, read_ktx2_header};
pub use vk_format::{VkDispatch, vk_format_name};

use std::io::SeekFrom;

use binrw::BinRead;
use gputex_decode::size::align;
use gputex_decode::{DecodedImage, FlipOp};
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{
    MAX_FILE_SIZE, MAX_METADATA_SIZE, MAX_TEXTURE_DIMENSION, TextureFile,
};

/// Khronos KTX2 texture file
pub struct KhronosKtx2 {
    reader: Box<dyn ReadSeek>,
    header: Ktx2Header,
    file_size: u64,
    levels: Vec<Ktx2LevelIndex>,
    flip: Option<FlipOp>,
    /// Channel swizzle from the `KTXswizzle` key, applied after decoding.
    swizzle: Option<String>,
    dispatch: Option<VkDispatch>,
    pixel_format: String,
    key_values: Vec<(String, String)>,
    cache: Vec<Option<DecodedImage>>,
}

impl KhronosKtx2 {
    /// Parse a KTX2 file from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        let header = read_ktx2_header(&mut reader)?;

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

        // Level index sits directly after the header.
        let num_levels = header.level_count.max(1) as usize;
        let mut levels = Vec::with_capacity(num_levels);
        for _ in 0..num_levels {
            levels.push(Ktx2LevelIndex::read_le(&mut reader)?);
        }

        let dispatch = VkDispatch::from_vk(header.vk_format);
        let pixel_format = vk_format_name(header.vk_format).map_or_else(
            || format!("Unknown ({})", header.vk_format),
            String::from,
        );
        debug!(
            vk_format = header.vk_format,
            width = header.pixel_width,
            height = header.pixel_height,
            levels = header.level_count,
            supercompression = header.supercompression_scheme,
            "parsed KTX2 header"
        );

        let mut ktx2 = Self {
            reader,
            header,
            file_size,
            levels,
            // GL-style origin; flip for display unless metadata says otherwise.
            flip: Some(FlipOp::Vertical),
            swizzle: None,
            dispatch,
            pixel_format,
            key_values: Vec::new(),
            cache: vec![None; num_levels],
        };
        ktx2.load_key_value_data()?;
        Ok(ktx2)
    }

    /// Parsed key/value metadata pairs, in file order.
    #[must_use]
    pub fn key_values(&self) -> &[(String, String)] {
        &self.key_values
    }

    /// Underlying header.
    #[must_use]
    pub fn header(&self) -> &Ktx2Header {
        &self.header
    }

    fn load_key_value_data(&mut self) -> TextureResult<()> {
        // The key/value block cannot overlap the header.
        if u64::from(self.header.kvd_byte_offset) < Ktx2Header::SIZE
            || self.header.kvd_byte_length == 0
        {
            return Ok(());
        }
        if self.header.kvd_byte_length > MAX_METADATA_SIZE {
            return Err(TextureError::MetadataTooLarge {
                size: self.header.kvd_byte_length,
                max: MAX_METADATA_SIZE,
            });
        }
        let kvd_len = self.header.kvd_byte_length as usize;
        self.reader
            .seek(SeekFrom::Start(u64::from(self.header.kvd_byte_offset)))?;
        let mut buf = vec![0u8; kvd_len];
        self.reader.read_exact(&mut buf)?;

        let mut has_orientation = false;
        let mut p = 0usize;
        while p + 4 <= kvd_len {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[p..p + 4]);
            let sz = u32::from_le_bytes(raw) as usize;
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

            // Only the first instance counts. Case-insensitive because
            // "KTXOrientation" exists in the wild.
            if !has_orientation && key.eq_ignore_ascii_case("KTXorientation") {
                has_orientation = true;
                // KTX2 uses one character per dimension: X is r/l, Y is d/u.
                let mut flip = None;
                if value_bytes.first() == Some(&b'l') {
                    flip = Some(FlipOp::Horizontal);
                }
                if !value_bytes.is_empty() && value_bytes.get(1) == Some(&b'u') {
                    flip = match flip {
                        Some(FlipOp::Horizontal) => Some(FlipOp::Both),
                        _ => Some(FlipOp::Vertical),
                    };
                }
                self.flip = flip;
            } else if self.swizzle.is_none() && key == "KTXswizzle" {
                let spec = String::from_utf8_lossy(value_bytes).into_owned();
                if spec.len() == 4
                    && spec
                        .bytes()
                        .all(|c| matches!(c, b'r' | b'g' | b'b' | b'a' | b'0' | b'1'))
                {
                    // Identity swizzles are a no-op.
                    if spec != "rgba" {
                        self.swizzle = Some(spec);
                    }
                } else {
                    warn!(spec, "ignoring malformed KTXswizzle value");
                }
            }
            self.key_values
                .push((key, String::from_utf8_lossy(value_bytes).into_owned()));

            p += align(4, sz as u32) as usize;
        }
        Ok(())
    }

    /// Width and height of one mipmap level.
    fn level_dimensions(&self, level: usize) -> (u32, u32) {
        let width = (self.header.pixel_width >> level).max(1);
        let height = (self.header.pixel_height >> level).max(1);
        (width, height)
    }

    fn decode_level(&mut self, level: usize) -> TextureResult<DecodedImage> {
        if self.header.supercompression_scheme != 0 {
            return Err(TextureError::Unsupported("supercompressed payload"));
        }
        let dispatch = self
            .dispatch
            .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
        let info = *self
            .levels
            .get(level)
            .ok_or(TextureError::Unsupported("mipmap level out of range"))?;

        // Texture data cannot start inside the header or level index.
        if info.byte_offset < Ktx2Header::SIZE {
            return Err(TextureError::Unsupported("level data overlaps the header"));
        }

        let (width, height) = self.level_dimensions(level);
        let expected = dispatch
            .expected_size(width, height)
            .ok_or_else(|| TextureError::UnsupportedPixelFormat(self.pixel_format.clone()))?;
        if (info.byte_length as usize) < expected
            || info.byte_offset + expected as u64 > self.file_size
        {
            return Err(TextureError::TruncatedData {
                expected,
                available: info.byte_length as usize,
            });
        }

        self.reader.seek(SeekFrom::Start(info.byte_offset))?;
        let mut buf = vec![0u8; expected];
        self.reader.read_exact(&mut buf)?;
        let mut img = dispatch.decode(width, height, &buf)?;
        if let Some(op) = self.flip {
            img = img.flip(op);
        }
        if let Some(spec) = &self.swizzle {
            img.swizzle(spec)?;
        }
        Ok(img)
    }
}

impl TextureFile for KhronosKtx2 {
    fn format_name(&self) -> &'static str {
        "Khronos KTX2"
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
        self.header.level_count.max(1) as i32 - 1
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
