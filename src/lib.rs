//! Virtual Boy VSU Emulator
//!
//! A cycle-accurate emulator of the Virtual Boy VSU (Virtual Sound Unit), the
//! six-channel wavetable sound chip clocked at 20 MHz. Five channels play
//! 32-entry programmable waveforms (channel 5 adds a frequency sweep and
//! modulation unit), and channel 6 generates noise from a tapped LFSR.
//!
//! The chip is driven by emulated CPU cycles: callers store bytes into the
//! 4 KiB register window with [`Vsu::write_register`] and move time forward
//! with [`Vsu::advance`]. Finished 10 ms stereo buffers (480 frames at 48 kHz)
//! are published into a lock-free ring and pulled from the other side through
//! a [`PcmConsumer`], which is safe to drive from an audio callback thread.
//!
//! # Features
//! - Register-accurate synthesis for all six channels
//! - Envelope generators with auto-shutoff timers
//! - Frequency sweep and table-driven modulation on channel 5
//! - Tapped-LFSR noise generation on channel 6
//! - Lock-free buffer ring with underrun/overrun accounting
//! - DC offset restoration matching the original hardware driver
//! - WAV export and optional real-time streaming playback
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Render one buffer
//! ```
//! use vsu::{registers, Vsu, SAMPLES_PER_BUFFER};
//!
//! let mut chip = Vsu::new();
//! let mut output = chip.take_output().unwrap();
//!
//! // Program wave table 0 with a square wave.
//! for step in 0..32u32 {
//!     chip.write_register(step * 4, if step < 16 { 63 } else { 0 });
//! }
//!
//! // Full volume, envelope value 15, channel 1 on wave table 0 at ~440 Hz.
//! let base = registers::channel_base(0);
//! chip.write_register(base + registers::REG_LRV, 0xFF);
//! chip.write_register(base + registers::REG_EV0, 0xF0);
//! chip.write_register(base + registers::REG_FQL, 0x9D);
//! chip.write_register(base + registers::REG_FQH, 0x06);
//! chip.write_register(base + registers::REG_INT, 0x80);
//!
//! // Advance 10 ms worth of 20 MHz cycles and collect the finished buffer.
//! chip.advance(200_000);
//! let mut pcm = [0i16; SAMPLES_PER_BUFFER];
//! assert!(output.next_buffer(&mut pcm));
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use vsu::streaming::AudioDevice;
//! use vsu::Vsu;
//! let mut chip = Vsu::new();
//! let output = chip.take_output().unwrap();
//! let device = AudioDevice::new(output).unwrap();
//! // keep advancing `chip` from the emulation thread
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod buffer_ring; // PCM Buffer Ring (producer/consumer)
pub mod constants; // Clock & Buffer Layout Constants
pub mod dc_filter; // DC Offset Restoration
pub mod export; // Offline Rendering & WAV Export
pub mod vsu; // VSU Chip Emulation (core)

#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming

/// Error types for VSU emulator operations
#[derive(thiserror::Error, Debug)]
pub enum VsuError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for VsuError {
    /// Converts a String into `VsuError::Other`.
    ///
    /// This is a convenience conversion for generic string errors. For better
    /// error discrimination, use specific variant constructors instead.
    fn from(msg: String) -> Self {
        VsuError::Other(msg)
    }
}

impl From<&str> for VsuError {
    /// Converts a string slice into `VsuError::Other`.
    fn from(msg: &str) -> Self {
        VsuError::Other(msg.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, VsuError>;

// Public API exports
pub use vsu::Vsu;

pub use buffer_ring::{PcmConsumer, RingStats};
pub use constants::{
    CYCLES_PER_SAMPLE, FRAMES_PER_BUFFER, MASTER_CLOCK_HZ, SAMPLES_PER_BUFFER, SAMPLE_RATE,
};
pub use dc_filter::DcRestorer;
pub use export::{export_to_wav, render_frames, write_wav};
pub use vsu::registers;
#[cfg(feature = "streaming")]
pub use streaming::AudioDevice;
