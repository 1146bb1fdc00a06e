//! VSU chip emulation core.
//!
//! The pieces mirror the hardware blocks: [`registers`] holds the 4 KiB
//! register window and its field accessors, `channel` the per-channel
//! counters and the noise LFSR, `sweep` the channel 5 sweep/modulation
//! unit, `wave_cache` the flat-waveform fast path, and `effects` the
//! 1 kHz sequencer (envelope, sweep, auto-shutoff). `chip` ties them
//! together behind the public [`Vsu`] type.

pub mod registers;

mod channel;
mod chip;
mod effects;
mod sweep;
mod wave_cache;

pub use chip::Vsu;
