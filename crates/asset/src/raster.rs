//! CPU-side raster image handed from the bitmap decoder to texture upload.

/// Tightly packed 8-bit image in blue-green-red channel order, bottom row first.
///
/// Channel order is the on-disk BMP order; consumers must not assume RGB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Wrap a BGR8 buffer. Returns `None` if a dimension is zero or the buffer
    /// length is not exactly `width * height * 3`.
    pub fn from_bgr8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = Self::byte_len(width, height)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Two-tone checkerboard used as a stand-in when a texture file is missing.
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * Self::BYTES_PER_PIXEL);

        for y in 0..size {
            for x in 0..size {
                let value = if ((x / cell) + (y / cell)) % 2 == 0 { 255 } else { 128 };
                pixels.extend_from_slice(&[value, value, value]);
            }
        }

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Number of bytes a `width x height` BGR8 image occupies, if it fits in `usize`.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(Self::BYTES_PER_PIXEL)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// BGR triple at `(x, y)` where `y = 0` is the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}
