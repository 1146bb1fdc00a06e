//! Channel 5 sweep/modulation unit state.
//!
//! Channel 5 can replace its register frequency with an operating frequency
//! driven either by a shift-and-add sweep or by a 32-entry signed modulation
//! table. The stepping itself happens on the sequencer tick in `effects`;
//! this module only holds the unit's counters and the splice helpers shared
//! by the tick and the register write handler.

use super::registers::SweepControl;

/// Progress of the modulation table pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ModulationPhase {
    /// Still inside the first pass of the modulation table.
    #[default]
    FirstPass,
    /// The first pass just wrapped; the repeat decision lands on the next
    /// modulation tick.
    JustWrapped,
    /// First pass complete. Modulation keeps stepping only with
    /// `EnvelopeMode::MOD_REPEAT`, and sweep commits stop entirely.
    Completed,
}

/// Records which half of the channel 5 frequency pair was written while
/// modulation was selected. The next modulation tick splices that half into
/// the operating frequency after the table value lands, matching the
/// hardware's late-write behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FrequencyLatch {
    /// No pending half-write.
    #[default]
    None,
    /// `REG_FQL` was written; re-splice the low byte.
    Low,
    /// `REG_FQH` was written; re-splice the high bits.
    High,
}

/// Sweep/modulation unit state for channel 5.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SweepUnit {
    /// Operating frequency used in place of the register pair.
    pub frequency: u16,
    /// Sequencer ticks until the next sweep/modulation step. Signed so an
    /// expired timer keeps reloading through zero intervals.
    pub timer: i32,
    /// Modulation table index, 0..31.
    pub counter: u8,
    /// Modulation pass progress.
    pub phase: ModulationPhase,
    /// Pending frequency half-write to fold in on the next tick.
    pub latch: FrequencyLatch,
}

impl SweepUnit {
    /// Timer interval for a sweep control byte, in sequencer ticks.
    pub(crate) fn interval(sweep_control: u8) -> i32 {
        let base = ((sweep_control >> 4) & 7) as i32;
        if sweep_control & SweepControl::SLOW_CLOCK.bits() != 0 {
            base * 8
        } else {
            base
        }
    }

    /// Re-arms the unit for a channel 5 control register write. The
    /// operating frequency itself is carried over.
    pub(crate) fn restart(&mut self, sweep_control: u8) {
        self.timer = Self::interval(sweep_control);
        self.counter = 0;
        self.phase = ModulationPhase::FirstPass;
    }

    /// Splices a low byte into the operating frequency.
    pub(crate) fn set_low_byte(&mut self, value: u8) {
        self.frequency = (self.frequency & 0x700) | value as u16;
    }

    /// Splices high bits into the operating frequency.
    pub(crate) fn set_high_bits(&mut self, value: u8) {
        self.frequency = (self.frequency & 0xFF) | (((value & 7) as u16) << 8);
    }
}
