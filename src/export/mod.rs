//! Offline rendering and WAV export.
//!
//! Rendering drives the chip faster than real time: [`render_frames`]
//! advances emulated cycles one buffer at a time and drains the consumer as
//! it goes, so the ring never overflows no matter how much audio is asked
//! for.

mod wav;

pub use wav::{export_to_wav, write_wav};

use crate::buffer_ring::PcmConsumer;
use crate::constants::{cycles_for_frames, FRAMES_PER_BUFFER, SAMPLES_PER_BUFFER};
use crate::vsu::Vsu;

/// Renders `frame_count` stereo frames from the chip's current time.
///
/// Returns interleaved left/right samples, `2 * frame_count` of them. The
/// register state plays out unchanged; interleave register writes between
/// calls to sequence music. A paused chip renders silence.
pub fn render_frames(chip: &mut Vsu, output: &mut PcmConsumer, frame_count: usize) -> Vec<i16> {
    let mut pcm = Vec::with_capacity(frame_count * 2);
    let mut buffer = [0i16; SAMPLES_PER_BUFFER];
    let mut cycle = chip.current_cycle();
    while pcm.len() < frame_count * 2 {
        cycle += cycles_for_frames(FRAMES_PER_BUFFER as u64);
        chip.advance(cycle);
        output.next_buffer(&mut buffer);
        let take = (frame_count * 2 - pcm.len()).min(SAMPLES_PER_BUFFER);
        pcm.extend_from_slice(&buffer[..take]);
    }
    pcm
}
