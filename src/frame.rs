/// Errors raised when a pixel buffer does not describe a valid RGB24 frame
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("row stride {stride} is smaller than the packed row width {min}")]
    StrideTooSmall { stride: usize, min: usize },

    #[error("pixel buffer holds {actual} bytes, expected at least {expected}")]
    BufferTooShort { actual: usize, expected: usize },

    #[error("frame geometry {width}x{height} with stride {stride} does not fit in memory")]
    SizeOverflow { width: u32, height: u32, stride: usize },
}

/// An RGB24 pixel buffer.
///
/// Channel `c` of the pixel at `(x, y)` lives at `pixels[y * stride + x * 3 + c]`.
/// Rows may carry trailing padding, so `stride` is never less than `width * 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap a pixel buffer, checking the stride and length invariants
    pub fn new(width: u32, height: u32, stride: usize, pixels: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }

        let overflow = FrameError::SizeOverflow {
            width,
            height,
            stride,
        };

        let min = (width as usize).checked_mul(3).ok_or(overflow.clone())?;
        if stride < min {
            return Err(FrameError::StrideTooSmall { stride, min });
        }

        let expected = stride.checked_mul(height as usize).ok_or(overflow)?;
        if pixels.len() < expected {
            return Err(FrameError::BufferTooShort {
                actual: pixels.len(),
                expected,
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    /// Wrap a tightly packed buffer (`stride == width * 3`)
    pub fn packed(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let stride = (width as usize).checked_mul(3).ok_or(FrameError::SizeOverflow {
            width,
            height,
            stride: usize::MAX,
        })?;
        Self::new(width, height, stride, pixels)
    }

    /// Packed buffer whose length the caller has already sized to `width * height * 3`
    pub(crate) fn from_packed_parts(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            stride: width as usize * 3,
            pixels,
        }
    }

    /// A packed frame where every pixel has the same color
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Result<Self, FrameError> {
        let (r, g, b) = rgb;
        let count = (width as usize)
            .checked_mul(height as usize)
            .filter(|count| count.checked_mul(3).is_some())
            .ok_or(FrameError::SizeOverflow {
                width,
                height,
                stride: usize::MAX,
            })?;
        let pixels = [r, g, b].repeat(count);
        Self::packed(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The `width * 3` meaningful bytes of row `y`, padding excluded
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {} out of bounds for height {}", y, self.height);
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.width as usize * 3]
    }

    /// RGB triple at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of bounds for {}x{}",
            x,
            y,
            self.width,
            self.height
        );
        let index = y as usize * self.stride + x as usize * 3;
        (
            self.pixels[index],
            self.pixels[index + 1],
            self.pixels[index + 2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            Frame::packed(0, 4, Vec::new()),
            Err(FrameError::ZeroDimension { width: 0, height: 4 })
        );
    }

    #[test]
    fn test_rejects_narrow_stride() {
        let result = Frame::new(4, 1, 11, vec![0; 12]);
        assert_eq!(result, Err(FrameError::StrideTooSmall { stride: 11, min: 12 }));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = Frame::new(2, 2, 8, vec![0; 15]);
        assert_eq!(
            result,
            Err(FrameError::BufferTooShort {
                actual: 15,
                expected: 16
            })
        );
    }

    #[test]
    fn test_pixel_lookup_skips_row_padding() {
        // 2x2 frame, 8 byte stride: 6 bytes of pixels + 2 padding bytes per row
        let pixels = vec![
            1, 2, 3, 4, 5, 6, 99, 99, //
            7, 8, 9, 10, 11, 12, 99, 99,
        ];
        let frame = Frame::new(2, 2, 8, pixels).unwrap();

        assert_eq!(frame.pixel(0, 0), (1, 2, 3));
        assert_eq!(frame.pixel(1, 1), (10, 11, 12));
        assert_eq!(frame.row(1), &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_pixel_in_row_padding_panics() {
        let frame = Frame::new(2, 1, 8, vec![0; 8]).unwrap();
        frame.pixel(2, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_row_past_height_panics() {
        let frame = Frame::filled(2, 2, (0, 0, 0)).unwrap();
        frame.row(2);
    }

    #[test]
    fn test_oversized_geometry_is_rejected() {
        let result = Frame::new(1, 4, usize::MAX / 2, vec![0; 3]);
        assert_eq!(
            result,
            Err(FrameError::SizeOverflow {
                width: 1,
                height: 4,
                stride: usize::MAX / 2
            })
        );
    }

    #[test]
    fn test_oversized_filled_frame_is_rejected() {
        // u32::MAX * u32::MAX * 3 bytes cannot be addressed on any target
        let result = Frame::filled(u32::MAX, u32::MAX, (0, 0, 0));
        assert!(matches!(result, Err(FrameError::SizeOverflow { .. })));
    }

    #[test]
    fn test_filled_frame() {
        let frame = Frame::filled(3, 2, (50, 100, 150)).unwrap();
        assert_eq!(frame.stride(), 9);
        assert_eq!(frame.pixels().len(), 18);
        assert_eq!(frame.pixel(2, 1), (50, 100, 150));
    }
}
