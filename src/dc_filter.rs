//! DC offset restoration for finished PCM buffers.
//!
//! The mixer accumulates unsigned samples, so every active channel pushes
//! the raw signal above zero. Before a buffer is published each frame is
//! amplified to line level and a running DC offset walks the output back
//! toward a zero mean, one 50th of the error per frame. The walk doubles
//! as an anti-click ramp: pausing clears the accumulator, everything else
//! (including chip resets) keeps it so playback never steps.
//!
//! The arithmetic deliberately works in the same widths the hardware
//! driver used. Amplification truncates to 16 bits (loud content wraps), a
//! wrapped-negative frame trips the clamp branch which pins the worse side
//! to full scale, and frames are only written back while the accumulator
//! is nonzero, so quiet raw buffers pass through untouched.

/// Line-level gain applied to the 10-bit mixer output.
const AMPLIFY: i32 = 95;

#[inline]
fn amplify(raw: i16) -> i32 {
    (raw as i32 >> 4) * AMPLIFY
}

/// Running DC restoration state.
///
/// One instance processes every buffer in production order; the offset
/// carries from buffer to buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcRestorer {
    offset: i16,
}

impl DcRestorer {
    /// Creates a restorer with a settled (zero) accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current accumulator value.
    #[inline]
    pub fn offset(&self) -> i16 {
        self.offset
    }

    /// Clears the accumulator, for pause transitions.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Amplifies and offset-corrects one buffer of packed stereo frames in
    /// place. Left sits in the low half-word, right in the high half-word.
    pub fn process_buffer(&mut self, frames: &mut [u32]) {
        for word in frames.iter_mut() {
            let raw_left = (*word & 0xFFFF) as u16 as i16;
            let raw_right = (*word >> 16) as u16 as i16;
            let left = (amplify(raw_left) + self.offset as i32) as i16;
            let right = (amplify(raw_right) + self.offset as i32) as i16;

            let offset = self.offset as i32;
            let mut correction =
                offset - (-(left as i32) - right as i32 + offset * 48) / 50;
            if left < self.offset || right < self.offset {
                // A frame wrapped negative during amplification: pull the
                // more negative side up to full scale instead of walking.
                let mut clamp = 0;
                if left < self.offset {
                    clamp = left as i32 - 0x7FFF;
                }
                if right < self.offset && right as i32 - 0x7FFF > clamp {
                    clamp = right as i32 - 0x7FFF;
                }
                correction = clamp;
            }

            let left = (left as i32 - correction) as i16;
            let right = (right as i32 - correction) as i16;
            self.offset = (offset - correction) as i16;

            if self.offset != 0 {
                *word = (left as u16 as u32) | ((right as u16 as u32) << 16);
            }
        }
    }
}
