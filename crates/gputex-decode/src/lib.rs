//! Block-compression codecs and pixel buffer types for GPU texture containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for codec bit manipulation
#![allow(clippy::cast_possible_wrap)] // Intentional for signed color deltas
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Codec-specific naming patterns
#![allow(clippy::many_single_char_names)] // Bit-level decoders use spec variable names
#![allow(clippy::verbose_bit_mask)] // Masks written to match format documentation
//! This crate provides the stateless half of the texture pipeline: pure
//! functions that turn compressed block data into uncompressed ARGB32 pixel
//! buffers, plus the exact size arithmetic container parsers use to validate
//! payloads before reading them.
//!
//! # Supported codecs
//!
//! - **S3TC / DXTn**: DXT1 (opaque and 1-bit alpha), DXT2-5, BC4, BC5
//! - **ETC**: ETC1, ETC2 RGB/RGBA/RGB_A1, EAC R11/RG11
//! - **PVRTC**: 2bpp and 4bpp, power-of-two dimensions
//! - **BC7**: all eight block modes
//! - **ASTC**: LDR profile, 2D footprints up to 12x12
//! - **Linear**: uncompressed 8/16/24/32-bit pixel formats
//!
//! # Design principles
//!
//! - **Stateless**: every decode call is a pure function; concurrent decodes
//!   of different images need no synchronization
//! - **Bounds-checked**: input length is validated against the computed
//!   minimum before any block is read; truncated input is an error, never an
//!   out-of-bounds read
//! - **Exact output**: decoded images are exactly `width x height`, cropped
//!   down when a codec required a padded power-of-two intermediate

#![warn(missing_docs)]

mod conv;
mod error;
mod image;

pub mod astc;
pub mod bc7;
pub mod etc;
pub mod linear;
pub mod pvrtc;
pub mod s3tc;
pub mod size;
pub mod swizzle;

pub use error::{DecodeError, DecodeResult};
pub use image::{DecodedImage, FlipOp, Sbit};
pub use linear::PixelFormat;

/// Hard ceiling for image dimensions, in either axis.
///
/// Texture files are attacker-controlled input; every entry point rejects
/// dimensions above this before allocating anything.
pub const MAX_DIMENSION: u32 = 32768;
