//! Timing and buffer layout constants.
//!
//! The VSU runs from the Virtual Boy's 20 MHz master clock and produces
//! 48 kHz stereo output, so one output sample spans exactly 416 master
//! cycles. Samples are collected into 10 ms buffers, and the sequencer
//! effects (envelope, sweep/modulation, auto-shutoff) tick every 48
//! output samples.

/// Master clock frequency in Hz (20 MHz).
pub const MASTER_CLOCK_HZ: u32 = 20_000_000;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Master clock cycles per output sample.
pub const CYCLES_PER_SAMPLE: u32 = MASTER_CLOCK_HZ / SAMPLE_RATE;

/// Stereo frames per PCM buffer (10 ms of audio).
pub const FRAMES_PER_BUFFER: usize = (SAMPLE_RATE / 100) as usize;

/// Interleaved `i16` samples per PCM buffer (left/right pairs).
pub const SAMPLES_PER_BUFFER: usize = FRAMES_PER_BUFFER * 2;

/// Number of slots in the PCM buffer ring.
pub const BUFFER_COUNT: usize = 9;

/// Output samples between sequencer effect ticks.
pub const EFFECT_INTERVAL_SAMPLES: u32 = 48;

/// Master clock cycles needed to produce `frames` output frames.
#[inline]
pub const fn cycles_for_frames(frames: u64) -> u64 {
    frames * CYCLES_PER_SAMPLE as u64
}
