//! Texture container error types

use gputex_decode::DecodeError;
use thiserror::Error;

/// Errors from texture container parsing and decoding
#[derive(Debug, Error)]
pub enum TextureError {
    /// Magic bytes did not match any known revision of the container
    #[error("invalid magic: got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Container revision is recognized but not supported
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// File exceeds the hard size ceiling
    #[error("file too large: {size} bytes (maximum {max})")]
    FileTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// Metadata block exceeds the hard size ceiling
    #[error("metadata block too large: {size} bytes (maximum {max})")]
    MetadataTooLarge {
        /// Declared metadata size
        size: u32,
        /// Maximum allowed size
        max: u32,
    },

    /// Header dimensions exceed the hard ceiling or are zero
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
    },

    /// Data region is shorter than the header requires
    #[error("truncated texture data: need {expected} bytes, have {available}")]
    TruncatedData {
        /// Bytes required by the header
        expected: usize,
        /// Bytes actually present
        available: usize,
    },

    /// Pixel format tag is not recognized by this parser
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// Feature is recognized but intentionally not implemented
    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    /// Block decoding error
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Embedded image (PNG/WebP) decoding error
    #[error("embedded image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for texture container operations
pub type TextureResult<T> = Result<T, TextureError>;
