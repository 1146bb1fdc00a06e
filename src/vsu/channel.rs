//! Per-channel playback state and the noise LFSR.

/// Feedback tap bit positions selectable through channel 6's `REG_EV1`
/// bits 6..4. The tap choice sets the noise pattern length.
pub(crate) const NOISE_TAPS: [u8; 8] = [14, 10, 13, 4, 8, 6, 9, 11];

/// Free-running counters of one channel.
///
/// Everything register-derived (frequency, levels, envelope parameters) is
/// read from the register file at synthesis time; only state the hardware
/// keeps outside the register window lives here.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChannelState {
    /// Current wave table step, 0..31.
    pub sample_pos: u8,
    /// Master cycles until the next wave step (or LFSR shift on channel 6).
    pub freq_time: i32,
    /// Current envelope output level, 0..15.
    pub envelope_value: u8,
    /// Envelope step countdown; bit 7 marks the envelope as expired.
    pub envelope_time: u8,
    /// Auto-shutoff countdown, five bits.
    pub shutoff_time: u8,
}

impl ChannelState {
    /// Restarts the channel counters for a control register write.
    ///
    /// The envelope output level is deliberately left alone; it only
    /// reloads through `REG_EV0` writes.
    pub(crate) fn restart(&mut self, control: u8, period: i32, envelope_data: u8) {
        self.shutoff_time = control & 0x1F;
        self.sample_pos = 0;
        self.freq_time = period;
        self.envelope_time = envelope_data & 7;
    }
}

/// 15-bit linear feedback shift register driving the noise channel.
///
/// Feedback XNORs bit 7 with a selectable tap bit, so the all-zero seed
/// immediately produces ones instead of locking up.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoiseLfsr {
    shift: u16,
}

impl NoiseLfsr {
    /// Clears the register back to its seed.
    pub(crate) fn reseed(&mut self) {
        self.shift = 0;
    }

    /// Current feedback bit for the given tap selector.
    #[inline]
    pub(crate) fn feedback(&self, tap: u8) -> u16 {
        let tap_bit = self.shift >> NOISE_TAPS[(tap & 7) as usize];
        (!((self.shift >> 7) ^ tap_bit)) & 1
    }

    /// Current output level: full scale while the feedback bit is set.
    #[inline]
    pub(crate) fn output(&self, tap: u8) -> u8 {
        if self.feedback(tap) != 0 {
            0x3F
        } else {
            0
        }
    }

    /// Shifts once, feeding the feedback bit back into bit 0.
    #[inline]
    pub(crate) fn step(&mut self, tap: u8) {
        let bit = self.feedback(tap);
        self.shift = ((self.shift << 1) | bit) & 0x7FFF;
    }
}
