//! Texture container parsers for GPU texture file formats
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for header field arithmetic
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Format-specific naming patterns
//! This crate provides the stateful half of the texture pipeline: container
//! parsers that read file headers, locate mipmap levels, and hand the
//! compressed payloads to the codecs in `gputex-decode`.
//!
//! # Supported containers
//!
//! - **KTX** ([`KhronosKtx`]): Khronos KTX 1.1, both endiannesses
//! - **KTX2** ([`KhronosKtx2`]): Khronos KTX 2.0, Vulkan formats
//! - **STEX** ([`GodotStex`]): Godot 3 `.stex` and Godot 4 `.ctex`
//! - **PVR** ([`PowerVr3`]): PowerVR 3.0.0 plus the legacy v1/v2 layout
//! - **ASTC** ([`AstcFile`]): standalone `.astc` files
//! - **XPR** ([`XboxXpr`]): original Xbox XPR0 textures
//!
//! Every parser implements [`TextureFile`]: construction validates the
//! header eagerly and fails fast, while pixel decoding is deferred until a
//! mipmap level is first requested and cached afterwards. Decode failures
//! on individual levels are soft; the parser stays usable and the level
//! reads as absent.
//!
//! Input is treated as untrusted throughout. File size, metadata size, and
//! dimensions are capped before allocation, and every level's byte range is
//! checked against the file before it is read.

#![warn(missing_docs)]

mod error;
mod io;
mod texture;

pub mod astc;
pub mod ktx;
pub mod ktx2;
pub mod probe;
pub mod pvr3;
pub mod stex;
pub mod xpr;

pub use astc::AstcFile;
pub use error::{TextureError, TextureResult};
pub use io::ReadSeek;
pub use ktx::KhronosKtx;
pub use ktx2::KhronosKtx2;
pub use probe::{ContainerFormat, probe};
pub use pvr3::PowerVr3;
pub use stex::GodotStex;
pub use texture::{
    MAX_EMBEDDED_SIZE, MAX_FILE_SIZE, MAX_METADATA_SIZE, MAX_TEXTURE_DIMENSION,
    MipmapDescriptor, TextureFile,
};
pub use xpr::XboxXpr;
