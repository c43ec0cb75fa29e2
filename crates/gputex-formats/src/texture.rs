//! Shared texture file contract

use gputex_decode::DecodedImage;

/// Hard ceiling on texture dimensions, per axis.
pub const MAX_TEXTURE_DIMENSION: u32 = gputex_decode::MAX_DIMENSION;

/// Hard ceiling on total container file size.
pub const MAX_FILE_SIZE: u64 = 128 * 1024 * 1024;

/// Hard ceiling on a container's metadata / key-value block.
pub const MAX_METADATA_SIZE: u32 = 512 * 1024;

/// Hard ceiling on embedded sub-files (Godot PNG/WebP payloads) and on
/// XPR0 files as a whole.
pub const MAX_EMBEDDED_SIZE: u64 = 16 * 1024 * 1024;

/// Location and logical size of one mipmap level within the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipmapDescriptor {
    /// Absolute byte offset of the level's data
    pub byte_offset: u64,
    /// Byte length of the level's data
    pub byte_length: usize,
    /// Level width in pixels
    pub width: u32,
    /// Level height in pixels
    pub height: u32,
}

/// Common contract implemented by every container parser.
///
/// A value of an implementing type is always valid: construction returns
/// `Result` and malformed headers never produce a parser. Decoding happens
/// lazily; a failed `mipmap()` call returns `None` and leaves the parser
/// usable.
pub trait TextureFile {
    /// Short container format name, e.g. `"Khronos KTX"`.
    fn format_name(&self) -> &'static str;

    /// Human-readable pixel format. Never empty; unrecognized tags are
    /// reported as `"Unknown (...)"`.
    fn pixel_format(&self) -> &str;

    /// Texture width in pixels.
    fn width(&self) -> u32;

    /// Texture height in pixels.
    fn height(&self) -> u32;

    /// Width and height as a pair.
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Logical dimensions when the physical image was padded, e.g. for
    /// power-of-two PVRTC decoding.
    fn rescale_dimensions(&self) -> Option<(u32, u32)> {
        None
    }

    /// Number of additional mipmap levels: `-1` when the format has no
    /// mipmap concept, `0` for a single stored level, `n` for `n + 1`
    /// stored levels.
    fn mipmap_count(&self) -> i32;

    /// Decode the full-size image (level 0). Cached after the first call.
    fn image(&mut self) -> Option<&DecodedImage> {
        self.mipmap(0)
    }

    /// Decode the given mipmap level. Cached after the first call.
    fn mipmap(&mut self, level: usize) -> Option<&DecodedImage>;
}
