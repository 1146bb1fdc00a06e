//! Real-time audio output (requires the `streaming` feature).
//!
//! Wraps the [`PcmConsumer`](crate::PcmConsumer) side of the ring as a
//! `rodio` source, so the audio backend drains buffers on its own thread
//! while the emulation keeps advancing the chip.

mod audio_device;

pub use audio_device::AudioDevice;
