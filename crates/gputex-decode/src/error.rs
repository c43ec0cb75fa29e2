//! Decoder error types

use thiserror::Error;

/// Error type shared by all block decoders and image operations
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Image dimensions are zero or exceed the hard ceiling
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Input buffer is smaller than the computed minimum for the image
    #[error("input buffer too small: expected at least {expected} bytes, got {actual}")]
    BufferTooSmall {
        /// Minimum byte count for the requested decode
        expected: usize,
        /// Bytes actually provided
        actual: usize,
    },

    /// Dimensions violate a codec-specific constraint
    /// (e.g. PVRTC requires power-of-two input)
    #[error("dimensions {width}x{height} not valid for {codec}")]
    DimensionConstraint {
        /// Codec name
        codec: &'static str,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Pixel format has no registered conversion
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(&'static str),

    /// Channel swizzle specifier is not a 4-character `[rgba01]` string
    #[error("invalid swizzle specifier: {0:?}")]
    InvalidSwizzle(String),

    /// Crop target is larger than the source image
    #[error("cannot crop {src_width}x{src_height} image to {width}x{height}")]
    InvalidCrop {
        /// Source width
        src_width: u32,
        /// Source height
        src_height: u32,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;
