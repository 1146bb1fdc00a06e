//! VSU register window layout and register file.
//!
//! The chip occupies a 4 KiB window of the bus. Registers and wave memory
//! are byte-wide with a 4-byte stride; the write handler masks addresses
//! into the window and ignores odd addresses.
//!
//! | Offset range  | Contents                                        |
//! |---------------|-------------------------------------------------|
//! | `0x000-0x27F` | Wave tables 0-4, 32 entries each, 4-byte stride |
//! | `0x280-0x2FF` | Modulation table, 32 signed entries             |
//! | `0x400-0x5FF` | Channel register blocks, `0x40` bytes per channel |
//! | `0x580`       | `SSTOP`, stops all channels                     |
//!
//! Within a channel block the registers sit at [`REG_INT`] (control),
//! [`REG_LRV`] (stereo levels), [`REG_FQL`]/[`REG_FQH`] (frequency),
//! [`REG_EV0`]/[`REG_EV1`] (envelope), [`REG_RAM`] (wave table select)
//! and, for channel 5 only, [`REG_SWP`] (sweep/modulation control).

use bitflags::bitflags;

/// Size of the register window in bytes.
pub const WINDOW_SIZE: usize = 0x1000;

/// Mask folding any bus address into the register window.
pub const ADDRESS_MASK: usize = 0xFFF;

/// Number of sound channels (five wavetable plus one noise).
pub const NUM_CHANNELS: usize = 6;

/// Index of the channel with the sweep/modulation unit (channel 5).
pub const SWEEP_CHANNEL: usize = 4;

/// Index of the noise channel (channel 6).
pub const NOISE_CHANNEL: usize = 5;

/// Number of programmable wave tables.
pub const WAVE_TABLE_COUNT: usize = 5;

/// Entries per wave table.
pub const WAVE_TABLE_LEN: usize = 32;

/// Channel control register offset: enable, auto-shutoff, interval.
pub const REG_INT: u32 = 0x00;

/// Stereo level register offset: left nibble in bits 7..4, right in 3..0.
pub const REG_LRV: u32 = 0x04;

/// Frequency low byte register offset.
pub const REG_FQL: u32 = 0x08;

/// Frequency high bits register offset (bits 2..0 used).
pub const REG_FQH: u32 = 0x0C;

/// Envelope data register offset: reload value, direction, step interval.
pub const REG_EV0: u32 = 0x10;

/// Envelope modifier register offset: enable, repeat, sweep/modulation
/// controls (channel 5), noise tap select (channel 6).
pub const REG_EV1: u32 = 0x14;

/// Wave table select register offset (wavetable channels only).
pub const REG_RAM: u32 = 0x18;

/// Sweep/modulation control register offset (channel 5 only).
pub const REG_SWP: u32 = 0x1C;

/// Stop-all register: writing an odd value clears every channel enable bit.
pub const SSTOP: u32 = 0x580;

/// Base offset of the modulation table (32 signed entries, 4-byte stride).
pub const MODULATION_BASE: u32 = 0x280;

/// Entries in the modulation table.
pub const MODULATION_TABLE_LEN: usize = 32;

/// Base offset of a channel's register block.
#[inline]
pub const fn channel_base(channel: usize) -> u32 {
    0x400 + 0x40 * channel as u32
}

bitflags! {
    /// Channel control register (`REG_INT`) flag bits.
    ///
    /// The low five bits hold the auto-shutoff interval and are not flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelControl: u8 {
        /// Channel enabled and producing output.
        const ENABLE = 0x80;
        /// Count down the shutoff interval and disable the channel when it
        /// expires.
        const AUTO_SHUTOFF = 0x20;
    }
}

bitflags! {
    /// Envelope modifier register (`REG_EV1`) flag bits.
    ///
    /// Bits 6..4 double as the noise tap selector on channel 6.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EnvelopeMode: u8 {
        /// Envelope steps are applied on the envelope tick.
        const ON = 0x01;
        /// Envelope reloads instead of freezing when it runs off the end.
        const REPEAT = 0x02;
        /// Channel 5: select modulation (set) or sweep (clear).
        const MODULATE = 0x10;
        /// Channel 5: repeat the modulation table after one pass.
        const MOD_REPEAT = 0x20;
        /// Channel 5: master enable for the sweep/modulation timer.
        const MOD_ENABLE = 0x40;
    }
}

bitflags! {
    /// Sweep control register (`REG_SWP`, channel 5) flag bits.
    ///
    /// Bits 6..4 hold the sweep interval, bits 2..0 the sweep shift.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SweepControl: u8 {
        /// Interval base select: set scales the interval by 8.
        const SLOW_CLOCK = 0x80;
        /// Sweep direction: set adds the shifted frequency, clear subtracts.
        const DIRECTION_UP = 0x08;
    }
}

/// Backing store for the 4 KiB register window.
///
/// Stores raw bytes exactly as written; all field extraction happens in the
/// accessors so the synthesis code reads registers the same way the hardware
/// decodes them.
pub(crate) struct RegisterFile {
    mem: Box<[u8; WINDOW_SIZE]>,
}

impl RegisterFile {
    pub(crate) fn new() -> Self {
        Self {
            mem: Box::new([0; WINDOW_SIZE]),
        }
    }

    /// Raw byte read, folded into the window.
    #[inline]
    pub(crate) fn read(&self, offset: usize) -> u8 {
        self.mem[offset & ADDRESS_MASK]
    }

    /// Raw byte write, folded into the window.
    #[inline]
    pub(crate) fn write(&mut self, offset: usize, value: u8) {
        self.mem[offset & ADDRESS_MASK] = value;
    }

    #[inline]
    fn reg(&self, channel: usize, reg: u32) -> u8 {
        self.read((channel_base(channel) + reg) as usize)
    }

    /// Channel control byte (`REG_INT`).
    #[inline]
    pub(crate) fn control(&self, channel: usize) -> u8 {
        self.reg(channel, REG_INT)
    }

    #[inline]
    pub(crate) fn control_flags(&self, channel: usize) -> ChannelControl {
        ChannelControl::from_bits_truncate(self.control(channel))
    }

    #[inline]
    pub(crate) fn channel_enabled(&self, channel: usize) -> bool {
        self.control_flags(channel).contains(ChannelControl::ENABLE)
    }

    /// True while no channel has its enable bit set.
    pub(crate) fn all_channels_stopped(&self) -> bool {
        (0..NUM_CHANNELS).all(|ch| !self.channel_enabled(ch))
    }

    /// Clears a channel's enable bit, leaving the rest of the control byte.
    pub(crate) fn clear_enable(&mut self, channel: usize) {
        let value = self.control(channel) & !ChannelControl::ENABLE.bits();
        self.write((channel_base(channel) + REG_INT) as usize, value);
    }

    /// Zeroes a channel's whole control byte (sweep overflow shutoff).
    pub(crate) fn zero_control(&mut self, channel: usize) {
        self.write((channel_base(channel) + REG_INT) as usize, 0);
    }

    /// Stereo level byte (`REG_LRV`).
    #[inline]
    pub(crate) fn level(&self, channel: usize) -> u8 {
        self.reg(channel, REG_LRV)
    }

    /// 11-bit frequency value assembled from `REG_FQL`/`REG_FQH`.
    #[inline]
    pub(crate) fn frequency(&self, channel: usize) -> u16 {
        let lo = self.reg(channel, REG_FQL) as u16;
        let hi = self.reg(channel, REG_FQH) as u16;
        (lo | (hi << 8)) & 0x7FF
    }

    /// Envelope data byte (`REG_EV0`).
    #[inline]
    pub(crate) fn envelope0(&self, channel: usize) -> u8 {
        self.reg(channel, REG_EV0)
    }

    /// Envelope modifier byte (`REG_EV1`).
    #[inline]
    pub(crate) fn envelope1(&self, channel: usize) -> u8 {
        self.reg(channel, REG_EV1)
    }

    #[inline]
    pub(crate) fn envelope_mode(&self, channel: usize) -> EnvelopeMode {
        EnvelopeMode::from_bits_truncate(self.envelope1(channel))
    }

    /// Wave table selected by a channel (`REG_RAM`, low 3 bits).
    #[inline]
    pub(crate) fn wave_select(&self, channel: usize) -> usize {
        (self.reg(channel, REG_RAM) & 7) as usize
    }

    /// Sweep control byte (`REG_SWP` of channel 5).
    #[inline]
    pub(crate) fn sweep_control(&self) -> u8 {
        self.read((channel_base(SWEEP_CHANNEL) + REG_SWP) as usize)
    }

    #[inline]
    pub(crate) fn sweep_flags(&self) -> SweepControl {
        SweepControl::from_bits_truncate(self.sweep_control())
    }

    /// Noise tap selector from channel 6's `REG_EV1`, bits 6..4.
    #[inline]
    pub(crate) fn noise_tap(&self) -> u8 {
        (self.envelope1(NOISE_CHANNEL) >> 4) & 7
    }

    /// Raw wave table entry. The hardware only uses the low six bits; the
    /// flat-waveform cache compares the raw bytes, so no masking here.
    #[inline]
    pub(crate) fn wave_entry(&self, table: usize, step: usize) -> u8 {
        self.read(0x80 * table + 4 * step)
    }

    /// Signed modulation table entry.
    #[inline]
    pub(crate) fn modulation_offset(&self, index: usize) -> i8 {
        self.read(MODULATION_BASE as usize + 4 * index) as i8
    }
}
