use crate::frame::Frame;
use log::debug;

/// Character grid a frame is reduced to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownsampleTarget {
    pub width: u32,
    pub height: u32,
}

/// Reasons a downsample request is rejected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DownsampleError {
    #[error("target grid must be non-zero (got {width}x{height})")]
    EmptyTarget { width: u32, height: u32 },

    #[error(
        "target grid {target_width}x{target_height} exceeds source resolution \
         {source_width}x{source_height}; averaging block would be empty"
    )]
    DegenerateBlock {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    },
}

impl DownsampleTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check that averaging a `source_width x source_height` frame onto this
    /// grid yields non-empty blocks. Returns the `(h_step, v_step)` block size.
    pub fn validate_for(
        &self,
        source_width: u32,
        source_height: u32,
    ) -> Result<(u32, u32), DownsampleError> {
        if self.width == 0 || self.height == 0 {
            return Err(DownsampleError::EmptyTarget {
                width: self.width,
                height: self.height,
            });
        }

        let h_step = source_width / self.width;
        let v_step = source_height / self.height;
        if h_step == 0 || v_step == 0 {
            return Err(DownsampleError::DegenerateBlock {
                source_width,
                source_height,
                target_width: self.width,
                target_height: self.height,
            });
        }

        Ok((h_step, v_step))
    }
}

/// Reduce `source` to the target grid with an integer box filter.
///
/// Each output cell is the truncated per-channel mean of a
/// `h_step x v_step` block, where the steps are the floor of the
/// source/target ratios. Source columns and rows beyond
/// `target * step` are not sampled. The result is tightly packed.
pub fn downsample(source: &Frame, target: DownsampleTarget) -> Result<Frame, DownsampleError> {
    let (h_step, v_step) = target.validate_for(source.width(), source.height())?;

    let out_stride = target.width as usize * 3;
    let mut pixels = vec![0u8; out_stride * target.height as usize];
    let count = u64::from(h_step) * u64::from(v_step);

    for y in 0..target.height {
        for x in 0..target.width {
            let mut sum = [0u64; 3];

            for dy in 0..v_step {
                let row = source.row(y * v_step + dy);
                let start = (x * h_step) as usize * 3;
                let block = &row[start..start + h_step as usize * 3];

                for px in block.chunks_exact(3) {
                    sum[0] += u64::from(px[0]);
                    sum[1] += u64::from(px[1]);
                    sum[2] += u64::from(px[2]);
                }
            }

            let out = y as usize * out_stride + x as usize * 3;
            for (channel, total) in sum.iter().enumerate() {
                // A mean of u8 samples always fits in a u8
                pixels[out + channel] = (total / count) as u8;
            }
        }
    }

    debug!(
        "Downsampled {}x{} -> {}x{} (block {}x{})",
        source.width(),
        source.height(),
        target.width,
        target.height,
        h_step,
        v_step
    );

    Ok(Frame::from_packed_parts(target.width, target.height, pixels))
}
