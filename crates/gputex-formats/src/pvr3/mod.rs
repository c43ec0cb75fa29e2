//! PowerVR texture container
//!
//! Handles PowerVR 3.0.0 files in either byte order, plus the legacy v1
//! and v2 layouts, whose pixel-format byte is translated into the v3
//! FourCC + channel-depth representation during construction.
//!
//! Mipmap levels are stored largest-first with no per-level index; each
//! level's offset is derived by walking the computed sizes.

mod format;
mod header;

pub use format::{
    FmtEntry, PVR3_CHTYPE_FLOAT, PVR3_CHTYPE_UBYTE, PVR3_CHTYPE_UBYTE_NORM, lookup_uncompressed,
    pvr3_decode, pvr3_expected_size, pvr3_pixel_format_name, translate_legacy_format,
};
pub use header::{
    PVR_LEGACY_MAGIC, PVR3_VERSION, Pvr3Header, PvrHeader, PvrLegacyHeader, read_pvr_header,
};

use std::io::SeekFrom;

use gputex_decode::{DecodedImage, FlipOp};
use tracing::{debug, warn};

use crate::error::{TextureError, TextureResult};
use crate::io::ReadSeek;
use crate::texture::{
    MAX_FILE_SIZE, MAX_METADATA_SIZE, MAX_TEXTURE_DIMENSION, MipmapDescriptor, TextureFile,
};

/// Metadata block key for the logical orientation.
const PVR3_META_ORIENTATION: u32 = 3;

/// Upper bound on surfaces, faces, and mipmap levels alike.
const MAX_SURFACES: u32 = 128;

/// PowerVR texture file (3.0.0 or legacy v1/v2)
pub struct PowerVr3 {
    reader: Box<dyn ReadSeek>,
    /// v3 header; synthesized from the legacy fields for v1/v2 files.
    header: Pvr3Header,
    file_size: u64,
    /// Texel data offset: header plus metadata for v3, header size for legacy.
    data_start: u64,
    big_endian: bool,
    /// Legacy version (1 or 2), when the file predates PowerVR 3.0.0.
    legacy_version: Option<u8>,
    flip: Option<FlipOp>,
    pixel_format: String,
    mipmaps: Vec<MipmapDescriptor>,
    cache: Vec<Option<DecodedImage>>,
}

impl PowerVr3 {
    /// Parse a PowerVR texture from a byte source.
    pub fn new(mut reader: Box<dyn ReadSeek>) -> TextureResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size > MAX_FILE_SIZE {
            return Err(TextureError::FileTooLarge {
                size: file_size,
                max: MAX_FILE_SIZE,
            });
        }
        reader.seek(SeekFrom::Start(0))?;

        let (header, big_endian, data_start, legacy_version, pixel_format);
        match read_pvr_header(&mut reader)? {
            PvrHeader::V3 {
                header: v3,
                big_endian: be,
            } => {
                if v3.metadata_size > MAX_METADATA_SIZE {
                    return Err(TextureError::MetadataTooLarge {
                        size: v3.metadata_size,
                        max: MAX_METADATA_SIZE,
                    });
                }
                data_start = Pvr3Header::SIZE + u64::from(v3.metadata_size);
                pixel_format = pvr3_pixel_format_name(v3.pixel_format, v3.channel_depth);
                header = v3;
                big_endian = be;
                legacy_version = None;
            }
            PvrHeader::Legacy {
                header: legacy,
                num_surfaces,
                version,
            } => {
                let format_byte = (legacy.pixel_format_and_flags & 0xFF) as u8;
                let translated = translate_legacy_format(format_byte);
                // An untranslatable byte still parses; the sentinel channel
                // type keeps every decode path switched off.
                let (pf, cd, ct) = translated.unwrap_or((u32::from(format_byte), 0, u32::MAX));
                pixel_format = if translated.is_some() {
                    pvr3_pixel_format_name(pf, cd)
                } else {
                    format!("Unknown (legacy: {format_byte:#04X})")
                };
                data_start = u64::from(legacy.header_size);
                header = Pvr3Header {
                    version: PVR3_VERSION,
                    flags: 0,
                    pixel_format: pf,
                    channel_depth: cd,
                    color_space: 0,
                    channel_type: ct,
                    height: legacy.height,
                    width: legacy.width,
                    depth: 1,
                    num_surfaces,
                    num_faces: 1,
                    // Legacy counts extra levels; v3 counts all of them.
                    mipmap_count: legacy.mipmap_count.saturating_add(1),
                    metadata_size: 0,
                };
                big_endian = false;
                legacy_version = Some(version);
            }
        }

        if header.width == 0
            || header.width > MAX_TEXTURE_DIMENSION
            || header.height > MAX_TEXTURE_DIMENSION
        {
            return Err(TextureError::InvalidDimensions {
                width: header.width,
                height: header.height,
            });
        }
        debug!(
            width = header.width,
            height = header.height,
            pixel_format,
            mipmaps = header.mipmap_count,
            legacy = legacy_version.is_some(),
            "parsed PVR header"
        );

        let mut pvr = Self {
            reader,
            header,
            file_size,
            data_start,
            big_endian,
            legacy_version,
            flip: None,
            pixel_format,
            mipmaps: Vec::new(),
            cache: Vec::new(),
        };
        pvr.load_metadata()?;
        pvr.build_mipmaps();
        pvr.cache = vec![None; pvr.mipmaps.len()];
        Ok(pvr)
    }

    /// Underlying v3-normalized header.
    #[must_use]
    pub fn header(&self) -> &Pvr3Header {
        &self.header
    }

    /// Legacy version (1 or 2) for pre-3.0.0 files.
    #[must_use]
    pub fn legacy_version(&self) -> Option<u8> {
        self.legacy_version
    }

    fn read_meta_word(&self, buf: &[u8]) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&buf[..4]);
        if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        }
    }

    /// Walk the metadata blocks after the v3 header. Only the orientation
    /// block is consumed; everything else is skipped by its size field.
    fn load_metadata(&mut self) -> TextureResult<()> {
        if self.header.metadata_size == 0 {
            return Ok(());
        }
        let len = self.header.metadata_size as usize;
        self.reader.seek(SeekFrom::Start(Pvr3Header::SIZE))?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;

        let mut p = 0usize;
        while p + 12 <= len {
            let fourcc = self.read_meta_word(&buf[p..]);
            let key = self.read_meta_word(&buf[p + 4..]);
            let size = self.read_meta_word(&buf[p + 8..]) as usize;
            p += 12;

            if fourcc != PVR3_VERSION {
                p = p.saturating_add(size);
                continue;
            }
            match key {
                PVR3_META_ORIENTATION => {
                    if p + 3 > len {
                        warn!("orientation metadata extends past the block");
                        break;
                    }
                    let (x, y) = (buf[p], buf[p + 1]);
                    p += 3;
                    let mut flip = None;
                    if x != 0 {
                        flip = Some(FlipOp::Horizontal);
                    }
                    if y != 0 {
                        flip = match flip {
                            Some(FlipOp::Horizontal) => Some(FlipOp::Both),
                            _ => Some(FlipOp::Vertical),
                        };
                    }
                    self.flip = flip;
                }
                _ => p = p.saturating_add(size),
            }
        }
        Ok(())
    }

    /// Derive the mipmap chain: each level is a quarter of the previous
    /// one, and array surfaces and cubemap faces of a level are stored
    /// back-to-back before the next level begins.
    fn build_mipmaps(&mut self) {
        let h = &self.header;
        let Some(mut expected) = pvr3_expected_size(
            h.pixel_format,
            h.channel_depth,
            h.channel_type,
            h.width,
            h.height.max(1),
        ) else {
            debug!(pixel_format = %self.pixel_format, "no decodable payload size");
            return;
        };
        let surfaces = u64::from(h.num_surfaces.clamp(1, MAX_SURFACES));
        let faces = u64::from(h.num_faces.clamp(1, MAX_SURFACES));
        let levels = h.mipmap_count.clamp(1, MAX_SURFACES);

        let mut offset = self.data_start;
        let mut width = h.width;
        let mut height = h.height.max(1);
        for _ in 0..levels {
            self.mipmaps.push(MipmapDescriptor {
                byte_offset: offset,
                byte_length: expected,
                width,
                height,
            });
            offset += expected as u64 * surfaces * faces;
            expected /= 4;
            width /= 2;
            height /= 2;
            if width == 0 || height == 0 {
                break;
            }
        }
    }

    fn decode_level(&mut self, level: usize) -> TextureResult<DecodedImage> {
        let desc = *self
            .mipmaps
            .get(level)
            .ok_or(TextureError::Unsupported("mipmap level out of range"))?;
        if desc.byte_offset + desc.byte_length as u64 > self.file_size {
            return Err(TextureError::TruncatedData {
                expected: desc.byte_length,
                available: self.file_size.saturating_sub(desc.byte_offset) as usize,
            });
        }
        self.reader.seek(SeekFrom::Start(desc.byte_offset))?;
        let mut buf = vec![0u8; desc.byte_length];
        self.reader.read_exact(&mut buf)?;

        let h = &self.header;
        let mut img = pvr3_decode(
            h.pixel_format,
            h.channel_depth,
            h.channel_type,
            desc.width,
            desc.height,
            &buf,
        )?;
        if let Some(op) = self.flip {
            img = img.flip(op);
        }
        Ok(img)
    }
}

impl TextureFile for PowerVr3 {
    fn format_name(&self) -> &'static str {
        "PowerVR"
    }

    fn pixel_format(&self) -> &str {
        &self.pixel_format
    }

    fn width(&self) -> u32 {
        self.header.width
    }

    fn height(&self) -> u32 {
        self.header.height.max(1)
    }

    fn mipmap_count(&self) -> i32 {
        self.header.mipmap_count.max(1) as i32 - 1
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
