//! Godot STEX texture container
//!
//! Covers both Godot 3 (`GDST`) and Godot 4 (`GST2`) stream textures. The
//! payload is either raw texel data in one of Godot's `Image::Format`
//! layouts or an embedded PNG/WebP file behind a small FourCC sub-header.
//!
//! Godot never writes a mipmap count for v3 raw data; the chain is
//! reconstructed by halving dimensions until the file runs out, stopping as
//! soon as either axis would reach zero.

mod format;
mod header;

pub use format::{StexVersion, stex_decode, stex_expected_size, stex_format_name};
pub use header::{
    STEX3_MAGIC, STEX4_DATA_FORMAT_BASIS_UNIVERSAL, STEX4_DATA_FORMAT_IMAGE,
    STEX4_DATA_FORMAT_PNG, STEX4_DATA_FORMAT_WEBP, STEX4_MAGIC,
    STEX_FORMAT_FLAG_HAS_MIPMAPS, STEX_FORMAT_FLAG_LOSSLESS, STEX_FORMAT_FLAG_LOSSY,
    STEX_FORMAT_MASK, Stex3Header, Stex4Header, StexEmbedHeader, StexHeader,
};

use std::io::SeekFrom;

use binrw::BinRead;
use gputex_decode::DecodedImage;
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{
    MAX_EMBEDDED_SIZE, MAX_FILE_SIZE, MAX_TEXTURE_DIMENSION, MipmapDescriptor, TextureFile,
};

use format::{STEX_FORMAT_PVRTC1_2, STEX_FORMAT_PVRTC1_4A};

/// Godot STEX texture file
pub struct GodotStex {
    reader: Box<dyn ReadSeek>,
    header: StexHeader,
    file_size: u64,
    embed: Option<StexEmbedHeader>,
    /// Physical (stored) dimensions, PoT-padded for NPOT PVRTC.
    width: u32,
    height: u32,
    rescale: Option<(u32, u32)>,
    /// Pixel format value with storage flags masked off.
    format: u32,
    pixel_format: String,
    mipmaps: Option<Vec<MipmapDescriptor>>,
    cache: Vec<Option<DecodedImage>>,
}

impl GodotStex {
    /// Parse a STEX file from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;
        let header = StexHeader::read_le(&mut reader)?;

        let (mut width, mut height, mut rescale, format_flags, embed_expected) = match &header {
            StexHeader::V3(v3) => {
                let rescale = (v3.width_rescale != v3.width || v3.height_rescale != v3.height)
                    .then_some((u32::from(v3.width_rescale), u32::from(v3.height_rescale)));
                let has_embed =
                    v3.format & (STEX_FORMAT_FLAG_LOSSLESS | STEX_FORMAT_FLAG_LOSSY) != 0;
                (
                    u32::from(v3.width),
                    u32::from(v3.height),
                    rescale,
                    v3.format,
                    has_embed,
                )
            }
            StexHeader::V4(v4) => {
                let rescale = (v4.width != u32::from(v4.img_width)
                    || v4.height != u32::from(v4.img_height))
                .then_some((v4.width, v4.height));
                let has_embed = matches!(
                    v4.data_format,
                    STEX4_DATA_FORMAT_PNG | STEX4_DATA_FORMAT_WEBP
                );
                (
                    u32::from(v4.img_width),
                    u32::from(v4.img_height),
                    rescale,
                    v4.pixel_format,
                    has_embed,
                )
            }
        };

        // `height == 0` is a 1D texture and stays legal.
        if width == 0 || width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
            return Err(TextureError::InvalidDimensions { width, height });
        }
        if let Some((rw, rh)) = rescale {
            if rw > MAX_TEXTURE_DIMENSION || rh > MAX_TEXTURE_DIMENSION {
                return Err(TextureError::InvalidDimensions {
                    width: rw,
                    height: rh,
                });
            }
        }

        let version = match &header {
            StexHeader::V3(_) => StexVersion::V3,
            StexHeader::V4(_) => StexVersion::V4,
        };
        let format = format_flags & STEX_FORMAT_MASK;

        // Godot 3 writes NPOT PVRTC textures without rescale parameters.
        if (STEX_FORMAT_PVRTC1_2..=STEX_FORMAT_PVRTC1_4A).contains(&format)
            && rescale.is_none()
            && (!width.is_power_of_two() || !height.max(1).is_power_of_two())
        {
            rescale = Some((width, height));
            width = width.next_power_of_two();
            height = height.next_power_of_two();
        }

        let embed = if embed_expected {
            // Godot 3 stores a mipmap count in front of the sub-header.
            let embed_offset = match &header {
                StexHeader::V3(_) => header.data_start() + 4,
                StexHeader::V4(_) => header.data_start(),
            };
            reader.seek(SeekFrom::Start(embed_offset))?;
            let embed = StexEmbedHeader::read_le(&mut reader)?;
            if embed.size <= 4 || u64::from(embed.size) >= MAX_EMBEDDED_SIZE {
                return Err(TextureError::Unsupported("embedded payload size"));
            }
            Some(embed)
        } else {
            None
        };

        let pixel_format = match (&embed, &header) {
            // The format table does not apply to embedded payloads.
            (Some(e), _) => match &e.fourcc {
                b"PNG " => "PNG".to_string(),
                b"WEBP" => "WebP".to_string(),
                other => format!("Unknown ({})", String::from_utf8_lossy(other)),
            },
            (None, _) => stex_format_name(version, format)
                .map_or_else(|| format!("Unknown ({format})"), String::from),
        };
        debug!(
            ?version,
            format,
            width,
            height,
            embedded = embed.is_some(),
            "parsed STEX header"
        );

        let mut stex = Self {
            reader,
            header,
            file_size,
            embed,
            width,
            height,
            rescale,
            format,
            pixel_format,
            mipmaps: None,
            cache: Vec::new(),
        };
        // Walk the chain up front so mipmap_count() has an answer; an
        // unsupported or truncated payload only fails decoding.
        if let Err(err) = stex.build_mipmaps() {
            debug!(%err, "mipmap chain walk failed");
        }
        Ok(stex)
    }

    /// Underlying version-tagged header.
    #[must_use]
    pub fn header(&self) -> &StexHeader {
        &self.header
    }

    /// Container generation.
    #[must_use]
    pub fn version(&self) -> StexVersion {
        match &self.header {
            StexHeader::V3(_) => StexVersion::V3,
            StexHeader::V4(_) => StexVersion::V4,
        }
    }

    fn build_mipmaps(&mut self) -> TextureResult<&[MipmapDescriptor]> {
        if self.mipmaps.is_none() {
            let version = self.version();
            let mut addr = self.header.data_start();
            let mut width = self.width;
            let mut height = self.height.max(1);
            let mut descriptors = Vec::new();

            if let Some(embed) = &self.embed {
                // One image, sized by the sub-header (size includes the FourCC).
                let data_len = (embed.size - 4) as usize;
                let data_addr = match &self.header {
                    StexHeader::V3(_) => addr + 4 + StexEmbedHeader::SIZE,
                    StexHeader::V4(_) => addr + StexEmbedHeader::SIZE,
                };
                if data_addr + data_len as u64 > self.file_size {
                    return Err(TextureError::TruncatedData {
                        expected: data_len,
                        available: self.file_size.saturating_sub(data_addr) as usize,
                    });
                }
                descriptors.push(MipmapDescriptor {
                    byte_offset: data_addr,
                    byte_length: data_len,
                    width,
                    height,
                });
            } else {
                let expected = stex_expected_size(version, self.format, width, height)
                    .ok_or_else(|| {
                        TextureError::UnsupportedPixelFormat(self.pixel_format.clone())
                    })?;
                if addr + expected as u64 > self.file_size {
                    return Err(TextureError::TruncatedData {
                        expected,
                        available: self.file_size.saturating_sub(addr) as usize,
                    });
                }
                descriptors.push(MipmapDescriptor {
                    byte_offset: addr,
                    byte_length: expected,
                    width,
                    height,
                });
                addr += expected as u64;

                let max_levels = match &self.header {
                    StexHeader::V3(v3) => {
                        if v3.format & STEX_FORMAT_FLAG_HAS_MIPMAPS != 0 && height > 1 {
                            usize::MAX
                        } else {
                            1
                        }
                    }
                    StexHeader::V4(v4) => {
                        if height > 1 {
                            v4.mipmap_count.max(1) as usize
                        } else {
                            1
                        }
                    }
                };

                while descriptors.len() < max_levels && addr < self.file_size {
                    width /= 2;
                    height /= 2;
                    if width == 0 || height == 0 {
                        break;
                    }
                    let Some(expected) = stex_expected_size(version, self.format, width, height)
                    else {
                        break;
                    };
                    if addr + expected as u64 > self.file_size {
                        warn!(addr, expected, "mipmap level does not fit in the file");
                        break;
                    }
                    descriptors.push(MipmapDescriptor {
                        byte_offset: addr,
                        byte_length: expected,
                        width,
                        height,
                    });
                    addr += expected as u64;
                }
            }

            self.cache = vec![None; descriptors.len()];
            self.mipmaps = Some(descriptors);
        }
        Ok(self.mipmaps.as_deref().unwrap_or(&[]))
    }

    fn decode_embedded(&mut self, desc: MipmapDescriptor) -> TextureResult<DecodedImage> {
        let embed = self
            .embed
            .ok_or(TextureError::Unsupported("no embedded payload"))?;
        let image_format = match &embed.fourcc {
            b"PNG " => image::ImageFormat::Png,
            b"WEBP" => image::ImageFormat::WebP,
            _ => return Err(TextureError::Unsupported("embedded payload format")),
        };
        // v4 cross-checks the FourCC against the header's data format.
        if let StexHeader::V4(v4) = &self.header {
            let matches_header = matches!(
                (v4.data_format, &embed.fourcc),
                (STEX4_DATA_FORMAT_PNG, b"PNG ") | (STEX4_DATA_FORMAT_WEBP, b"WEBP")
            );
            if !matches_header {
                return Err(TextureError::Unsupported(
                    "embedded FourCC contradicts the data format",
                ));
            }
        }

        self.reader.seek(SeekFrom::Start(desc.byte_offset))?;
        let mut buf = vec![0u8; desc.byte_length];
        self.reader.read_exact(&mut buf)?;

        let decoded = image::load_from_memory_with_format(&buf, image_format)?.to_rgba8();
        let (w, h) = decoded.dimensions();
        let mut pixels = Vec::with_capacity(w as usize * h as usize);
        for px in decoded.pixels() {
            let [r, g, b, a] = px.0;
            pixels.push(
                (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b),
            );
        }
        Ok(DecodedImage::from_pixels(w, h, pixels)?)
    }

    fn decode_level(&mut self, level: usize) -> TextureResult<DecodedImage> {
        let desc = *self
            .build_mipmaps()?
            .get(level)
            .ok_or(TextureError::Unsupported("mipmap level out of range"))?;
        if self.embed.is_some() {
            return self.decode_embedded(desc);
        }

        self.reader.seek(SeekFrom::Start(desc.byte_offset))?;
        let mut buf = vec![0u8; desc.byte_length];
        self.reader.read_exact(&mut buf)?;
        let mut img = stex_decode(self.version(), self.format, desc.width, desc.height, &buf)?;
        if level == 0 {
            if let Some((rw, rh)) = self.rescale {
                img.set_rescale_dimensions(rw, rh);
            }
        }
        Ok(img)
    }
}

impl TextureFile for GodotStex {
    fn format_name(&self) -> &'static str {
        "Godot STEX"
    }

    fn pixel_format(&self) -> &str {
        &self.pixel_format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height.max(1)
    }

    fn rescale_dimensions(&self) -> Option<(u32, u32)> {
        self.rescale
    }

    fn mipmap_count(&self) -> i32 {
        match &self.header {
            StexHeader::V3(v3) => {
                if self.embed.is_some() || v3.format & STEX_FORMAT_FLAG_HAS_MIPMAPS == 0 {
                    return 0;
                }
                // The chain length is data-driven.
                self.mipmaps
                    .as_ref()
                    .map_or(0, |m| m.len() as i32 - 1)
            }
            StexHeader::V4(v4) => {
                if self.embed.is_some() {
                    0
                } else {
                    v4.mipmap_count.max(1) as i32 - 1
                }
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn v3_header(width: u16, height: u16, format: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&STEX3_MAGIC);
        for v in [width, width, height, height] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&format.to_le_bytes());
        buf
    }

    fn v4_header(
        width: u32,
        height: u32,
        data_format: u32,
        mipmap_count: u32,
        pixel_format: u32,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&STEX4_MAGIC);
        for v in [
            1u32,
            width,
            height,
            0,
            0,
            0,
            0,
            0,
            data_format,
            u32::from(width as u16) | (u32::from(height as u16) << 16),
            mipmap_count,
            pixel_format,
        ] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Solid white DXT1 blocks.
    fn dxt1_blocks(count: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        for _ in 0..count {
            buf.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
        }
        buf
    }

    #[test]
    fn v3_dxt1_mipmap_chain_is_data_driven() {
        // 8x8 base + 4x4 + 2x2 + 1x1; the walk ends once either axis
        // would halve to zero.
        let mut buf = v3_header(8, 8, 0x11 | STEX_FORMAT_FLAG_HAS_MIPMAPS);
        buf.extend_from_slice(&dxt1_blocks(4)); // 8x8
        buf.extend_from_slice(&dxt1_blocks(1)); // 4x4
        buf.extend_from_slice(&dxt1_blocks(1)); // 2x2
        buf.extend_from_slice(&dxt1_blocks(1)); // 1x1

        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.pixel_format(), "DXT1");
        assert_eq!(stex.mipmap_count(), 3);
        let img = stex.image().unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
        assert!(stex.mipmap(1).is_some());
        assert!(stex.mipmap(3).is_some());
        assert!(stex.mipmap(4).is_none());
    }

    #[test]
    fn v4_mipmap_count_bounds_the_chain() {
        // File has room for three levels but the header only admits two.
        let mut buf = v4_header(8, 8, 0, 2, 0x11);
        buf.extend_from_slice(&dxt1_blocks(4));
        buf.extend_from_slice(&dxt1_blocks(1));
        buf.extend_from_slice(&dxt1_blocks(1));

        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.mipmap_count(), 1);
        assert!(stex.mipmap(0).is_some());
        assert!(stex.mipmap(1).is_some());
        assert!(stex.mipmap(2).is_none());
    }

    #[test]
    fn npot_pvrtc_is_padded_with_rescale_dimensions() {
        // PVRTC1 4bpp at 20x20: stored as 32x32 (512 bytes).
        let mut buf = v3_header(20, 20, 0x1B);
        buf.extend_from_slice(&vec![0u8; 512]);

        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.dimensions(), (32, 32));
        assert_eq!(stex.rescale_dimensions(), Some((20, 20)));
        let img = stex.image().unwrap();
        assert_eq!((img.width(), img.height()), (32, 32));
        assert_eq!(img.rescale_dimensions(), Some((20, 20)));
    }

    #[test]
    fn v4_png_payload_is_delegated() {
        let mut png = Vec::new();
        let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([0x10, 0x20, 0x30, 0xFF]));
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut buf = v4_header(3, 2, STEX4_DATA_FORMAT_PNG, 1, 0);
        buf.extend_from_slice(&(png.len() as u32 + 4).to_le_bytes());
        buf.extend_from_slice(b"PNG ");
        buf.extend_from_slice(&png);

        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.pixel_format(), "PNG");
        assert_eq!(stex.mipmap_count(), 0);
        let img = stex.image().unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert!(img.pixels().iter().all(|&px| px == 0xFF10_2030));
    }

    #[test]
    fn v4_fourcc_data_format_mismatch_fails_decode() {
        let mut buf = v4_header(2, 2, STEX4_DATA_FORMAT_PNG, 1, 0);
        buf.extend_from_slice(&12u32.to_le_bytes());
        buf.extend_from_slice(b"WEBP");
        buf.extend_from_slice(&[0u8; 8]);

        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert!(stex.image().is_none());
    }

    #[test]
    fn v3_embedded_payload_reports_fourcc() {
        let mut buf = v3_header(2, 2, STEX_FORMAT_FLAG_LOSSLESS);
        buf.extend_from_slice(&1u32.to_le_bytes()); // v3 embedded mipmap count
        buf.extend_from_slice(&12u32.to_le_bytes());
        buf.extend_from_slice(b"PNG ");
        buf.extend_from_slice(&[0u8; 8]);

        let stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.pixel_format(), "PNG");
    }

    #[test]
    fn unknown_format_reports_unknown() {
        let mut buf = v3_header(4, 4, 0x30);
        buf.extend_from_slice(&[0u8; 64]);
        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert_eq!(stex.pixel_format(), "Unknown (48)");
        assert!(stex.image().is_none());
    }

    #[test]
    fn truncated_base_level_fails_decode() {
        // 8x8 DXT1 needs 32 bytes; only 16 present.
        let mut buf = v3_header(8, 8, 0x11);
        buf.extend_from_slice(&dxt1_blocks(2));
        let mut stex = GodotStex::new(Box::new(Cursor::new(buf))).unwrap();
        assert!(stex.image().is_none());
    }
}
