//! Canonical decoded image type
//!
//! Every decoder in this crate produces a [`DecodedImage`]: a host-endian
//! ARGB32 pixel buffer with no row padding, plus optional significant-bits
//! metadata and optional rescale dimensions for codecs that decode at a
//! padded physical size.

use crate::MAX_DIMENSION;
use crate::error::{DecodeError, DecodeResult};

/// Significant bits per channel (sBIT).
///
/// Records how many bits of each channel carry real data versus padding
/// introduced by the ARGB32 expansion. A value of 0 means the channel is
/// unused by the source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sbit {
    /// Red significant bits
    pub red: u8,
    /// Green significant bits
    pub green: u8,
    /// Blue significant bits
    pub blue: u8,
    /// Grayscale significant bits (luminance formats)
    pub gray: u8,
    /// Alpha significant bits
    pub alpha: u8,
}

impl Sbit {
    /// Construct an sBIT descriptor.
    pub const fn new(red: u8, green: u8, blue: u8, gray: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            gray,
            alpha,
        }
    }
}

/// Flip operation applied as post-processing after decode.
///
/// Some containers store textures upside-down or mirrored relative to the
/// display orientation; orientation metadata selects one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOp {
    /// Mirror across the vertical axis (left/right)
    Horizontal,
    /// Mirror across the horizontal axis (top/bottom)
    Vertical,
    /// Mirror across both axes
    Both,
}

impl FlipOp {
    /// Combine per-axis flip flags into an operation, if any axis is set.
    pub const fn from_flags(horizontal: bool, vertical: bool) -> Option<Self> {
        match (horizontal, vertical) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Horizontal),
            (false, true) => Some(Self::Vertical),
            (false, false) => None,
        }
    }
}

/// Uncompressed ARGB32 pixel image.
///
/// Pixels are stored row-major with no padding stride; pixel `(x, y)` is at
/// index `y * width + x`. Channel layout within each `u32` is `0xAARRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u32>,
    sbit: Option<Sbit>,
    rescale: Option<(u32, u32)>,
}

impl DecodedImage {
    /// Create a zero-filled (transparent black) image.
    pub fn new(width: u32, height: u32) -> DecodeResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
            sbit: None,
            rescale: None,
        })
    }

    /// Create an image from an existing pixel buffer.
    ///
    /// The buffer length must be exactly `width * height`.
    pub fn from_pixels(width: u32, height: u32, data: Vec<u32>) -> DecodeResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(DecodeError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            sbit: None,
            rescale: None,
        })
    }

    /// Image width in pixels.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel buffer, row-major ARGB32.
    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    /// Mutable pixel buffer.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Iterator over the image rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.data.chunks_exact(self.width as usize)
    }

    /// Single pixel accessor. Returns `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Set a single pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = argb;
        }
    }

    /// Significant-bits metadata, if set by the decoder.
    pub const fn sbit(&self) -> Option<Sbit> {
        self.sbit
    }

    /// Attach significant-bits metadata.
    pub const fn set_sbit(&mut self, sbit: Sbit) {
        self.sbit = Some(sbit);
    }

    /// Logical (rescale) dimensions, when distinct from the physical ones.
    ///
    /// Set when the source texture was stored padded (e.g. PVRTC rounded up
    /// to a power of two); callers should display the image at this size.
    pub const fn rescale_dimensions(&self) -> Option<(u32, u32)> {
        self.rescale
    }

    /// Record logical dimensions distinct from the physical buffer size.
    pub const fn set_rescale_dimensions(&mut self, width: u32, height: u32) {
        self.rescale = Some((width, height));
    }

    /// Copy a decoded tile into the image at block position
    /// `(block_x, block_y)`, clipping at the right/bottom edges for images
    /// whose dimensions are not multiples of the tile size.
    pub(crate) fn blit_tile(
        &mut self,
        tile: &[u32],
        tile_w: u32,
        tile_h: u32,
        block_x: u32,
        block_y: u32,
    ) {
        let x0 = block_x * tile_w;
        let y0 = block_y * tile_h;
        let copy_w = tile_w.min(self.width.saturating_sub(x0)) as usize;
        for ty in 0..tile_h {
            let y = y0 + ty;
            if y >= self.height {
                break;
            }
            let src = ty as usize * tile_w as usize;
            let dst = y as usize * self.width as usize + x0 as usize;
            self.data[dst..dst + copy_w].copy_from_slice(&tile[src..src + copy_w]);
        }
    }

    /// Return a flipped copy of the image, carrying metadata over.
    pub fn flip(&self, op: FlipOp) -> Self {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut out = vec![0u32; w * h];
        for y in 0..h {
            let src_y = match op {
                FlipOp::Vertical | FlipOp::Both => h - 1 - y,
                FlipOp::Horizontal => y,
            };
            let src_row = &self.data[src_y * w..src_y * w + w];
            let dst_row = &mut out[y * w..y * w + w];
            match op {
                FlipOp::Vertical => dst_row.copy_from_slice(src_row),
                FlipOp::Horizontal | FlipOp::Both => {
                    for (dst, src) in dst_row.iter_mut().zip(src_row.iter().rev()) {
                        *dst = *src;
                    }
                }
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data: out,
            sbit: self.sbit,
            rescale: self.rescale,
        }
    }

    /// Remap color channels in place using a 4-character `[rgba01]` spec.
    ///
    /// The spec characters select the source for the output R, G, B and A
    /// channels respectively; `0` forces 0x00 and `1` forces 0xFF.
    pub fn swizzle(&mut self, spec: &str) -> DecodeResult<()> {
        let bytes = spec.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|c| matches!(c, b'r' | b'g' | b'b' | b'a' | b'0' | b'1')) {
            return Err(DecodeError::InvalidSwizzle(spec.to_string()));
        }

        // Identity swizzle is a no-op.
        if bytes == b"rgba" {
            return Ok(());
        }

        let select = |px: u32, c: u8| -> u32 {
            match c {
                b'r' => (px >> 16) & 0xFF,
                b'g' => (px >> 8) & 0xFF,
                b'b' => px & 0xFF,
                b'a' => (px >> 24) & 0xFF,
                b'0' => 0x00,
                _ => 0xFF, // b'1'
            }
        };
        for px in &mut self.data {
            let p = *px;
            *px = (select(p, bytes[3]) << 24)
                | (select(p, bytes[0]) << 16)
                | (select(p, bytes[1]) << 8)
                | select(p, bytes[2]);
        }

        if let Some(sb) = self.sbit {
            let pick = |c: u8| -> u8 {
                match c {
                    b'r' => sb.red,
                    b'g' => sb.green,
                    b'b' => sb.blue,
                    b'a' => sb.alpha,
                    _ => 0,
                }
            };
            self.sbit = Some(Sbit::new(
                pick(bytes[0]),
                pick(bytes[1]),
                pick(bytes[2]),
                sb.gray,
                pick(bytes[3]),
            ));
        }
        Ok(())
    }

    /// Exchange the red and blue channels in place.
    pub fn swap_rb(&mut self) {
        for px in &mut self.data {
            let p = *px;
            *px = (p & 0xFF00FF00) | ((p >> 16) & 0xFF) | ((p & 0xFF) << 16);
        }
        if let Some(sb) = self.sbit {
            self.sbit = Some(Sbit::new(sb.blue, sb.green, sb.red, sb.gray, sb.alpha));
        }
    }

    /// Return a top-left crop of the image.
    ///
    /// Used after a padded power-of-two decode to cut the buffer back down
    /// to the logical texture size. sBIT carries over; rescale dimensions
    /// are cleared since the crop realizes them.
    pub fn crop(&self, width: u32, height: u32) -> DecodeResult<Self> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return Err(DecodeError::InvalidCrop {
                src_width: self.width,
                src_height: self.height,
                width,
                height,
            });
        }
        let src_w = self.width as usize;
        let w = width as usize;
        let mut out = Vec::with_capacity(w * height as usize);
        for y in 0..height as usize {
            out.extend_from_slice(&self.data[y * src_w..y * src_w + w]);
        }
        Ok(Self {
            width,
            height,
            data: out,
            sbit: self.sbit,
            rescale: None,
        })
    }

    /// Reverse premultiplied alpha in place (DXT2/DXT4).
    pub fn un_premultiply(&mut self) {
        for px in &mut self.data {
            let a = *px >> 24;
            if a == 0 {
                *px = 0;
                continue;
            }
            if a == 0xFF {
                continue;
            }
            let unmul = |c: u32| -> u32 { (c * 0xFF / a).min(0xFF) };
            *px = (a << 24)
                | (unmul((*px >> 16) & 0xFF) << 16)
                | (unmul((*px >> 8) & 0xFF) << 8)
                | unmul(*px & 0xFF);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ramp(width: u32, height: u32) -> DecodedImage {
        let data = (0..width * height).map(|i| 0xFF00_0000 | i).collect();
        DecodedImage::from_pixels(width, height, data).unwrap()
    }

    #[test]
    fn rejects_zero_and_oversized_dimensions() {
        assert!(DecodedImage::new(0, 4).is_err());
        assert!(DecodedImage::new(4, 0).is_err());
        assert!(DecodedImage::new(MAX_DIMENSION + 1, 4).is_err());
        assert!(DecodedImage::new(MAX_DIMENSION, 1).is_ok());
    }

    #[test]
    fn flip_vertical_reverses_rows() {
        let img = ramp(2, 2);
        let flipped = img.flip(FlipOp::Vertical);
        assert_eq!(flipped.pixel(0, 0), img.pixel(0, 1));
        assert_eq!(flipped.pixel(1, 1), img.pixel(1, 0));
    }

    #[test]
    fn flip_both_is_180_rotation() {
        let img = ramp(3, 2);
        let flipped = img.flip(FlipOp::Both);
        assert_eq!(flipped.pixel(0, 0), img.pixel(2, 1));
        assert_eq!(flipped.pixel(2, 1), img.pixel(0, 0));
    }

    #[test]
    fn swizzle_bgra_swaps_channels() {
        let mut img = DecodedImage::from_pixels(1, 1, vec![0x11223344]).unwrap();
        img.swizzle("bgra").unwrap();
        assert_eq!(img.pixel(0, 0), Some(0x11443322));
    }

    #[test]
    fn swizzle_constants_force_channel_values() {
        let mut img = DecodedImage::from_pixels(1, 1, vec![0x00223344]).unwrap();
        img.swizzle("rgb1").unwrap();
        assert_eq!(img.pixel(0, 0), Some(0xFF223344));
    }

    #[test]
    fn swizzle_rejects_bad_specs() {
        let mut img = DecodedImage::new(1, 1).unwrap();
        assert!(img.swizzle("rgb").is_err());
        assert!(img.swizzle("rgbx").is_err());
        assert!(img.swizzle("rgbaa").is_err());
    }

    #[test]
    fn swap_rb_round_trips() {
        let mut img = DecodedImage::from_pixels(1, 1, vec![0xAA112233]).unwrap();
        img.swap_rb();
        assert_eq!(img.pixel(0, 0), Some(0xAA332211));
        img.swap_rb();
        assert_eq!(img.pixel(0, 0), Some(0xAA112233));
    }

    #[test]
    fn crop_takes_top_left() {
        let img = ramp(4, 4);
        let cropped = img.crop(2, 3).unwrap();
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 3);
        assert_eq!(cropped.pixel(1, 2), img.pixel(1, 2));
        assert!(img.crop(5, 1).is_err());
    }

    #[test]
    fn un_premultiply_restores_straight_alpha() {
        // 50% alpha, premultiplied channels
        let mut img = DecodedImage::from_pixels(1, 1, vec![0x80402000]).unwrap();
        img.un_premultiply();
        let px = img.pixel(0, 0).unwrap();
        assert_eq!(px >> 24, 0x80);
        assert_eq!((px >> 16) & 0xFF, 0x7F);
        // Fully transparent pixels collapse to zero.
        let mut img = DecodedImage::from_pixels(1, 1, vec![0x00FFFFFF]).unwrap();
        img.un_premultiply();
        assert_eq!(img.pixel(0, 0), Some(0));
    }
}
