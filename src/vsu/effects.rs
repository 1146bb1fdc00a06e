//! Sequencer effects: sweep/modulation, auto-shutoff, envelopes.
//!
//! A sequencer tick lands every 48 output samples (about 1 ms). The sweep
//! unit steps on every tick, auto-shutoff on every fourth tick, and the
//! envelopes on every fourth shutoff run. Both dividers start expired, so a
//! freshly reset chip runs all three stages on its first tick.

use super::channel::ChannelState;
use super::registers::{
    channel_base, ChannelControl, EnvelopeMode, RegisterFile, SweepControl, MODULATION_TABLE_LEN,
    NUM_CHANNELS, REG_FQH, REG_FQL, SWEEP_CHANNEL,
};
use super::sweep::{FrequencyLatch, ModulationPhase, SweepUnit};

/// Divider chain sequencing the three effect stages.
#[derive(Debug, Default)]
pub(crate) struct EffectSequencer {
    shutoff_divider: i8,
    envelope_divider: i8,
}

impl EffectSequencer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        self.shutoff_divider = 0;
        self.envelope_divider = 0;
    }

    /// Runs one sequencer tick over all channels.
    pub(crate) fn tick(
        &mut self,
        regs: &mut RegisterFile,
        channels: &mut [ChannelState; NUM_CHANNELS],
        sweep: &mut SweepUnit,
    ) {
        Self::sweep_stage(regs, sweep);

        self.shutoff_divider -= 1;
        if self.shutoff_divider >= 0 {
            return;
        }
        self.shutoff_divider += 4;
        Self::shutoff_stage(regs, channels);

        self.envelope_divider -= 1;
        if self.envelope_divider >= 0 {
            return;
        }
        self.envelope_divider += 4;
        Self::envelope_stage(regs, channels);
    }

    /// Channel 5 sweep/modulation step.
    fn sweep_stage(regs: &mut RegisterFile, sweep: &mut SweepUnit) {
        if !regs.channel_enabled(SWEEP_CHANNEL) {
            return;
        }
        let mode = regs.envelope_mode(SWEEP_CHANNEL);
        let control = regs.sweep_control();

        // The sweep candidate and its overflow shutoff run on every tick,
        // even ones where the timer never commits the candidate.
        let mut candidate = sweep.frequency as i32;
        if !mode.contains(EnvelopeMode::MODULATE) {
            let delta = (sweep.frequency >> (control & 7)) as i32;
            if regs.sweep_flags().contains(SweepControl::DIRECTION_UP) {
                candidate += delta;
                if candidate >= 0x800 {
                    regs.zero_control(SWEEP_CHANNEL);
                }
            } else {
                candidate -= delta;
                if candidate < 0 {
                    candidate = 0;
                }
            }
        }

        if !mode.contains(EnvelopeMode::MOD_ENABLE) {
            return;
        }
        sweep.timer -= 1;
        if sweep.timer >= 0 {
            return;
        }
        sweep.timer = SweepUnit::interval(control);
        if sweep.timer == 0 {
            return;
        }

        if mode.contains(EnvelopeMode::MODULATE) {
            Self::modulation_step(regs, sweep, mode);
        } else if sweep.phase != ModulationPhase::Completed {
            sweep.frequency = candidate as u16;
        }

        sweep.counter += 1;
        if sweep.counter as usize >= MODULATION_TABLE_LEN {
            if sweep.phase == ModulationPhase::FirstPass {
                sweep.phase = ModulationPhase::JustWrapped;
            }
            sweep.counter = 0;
        }
    }

    fn modulation_step(regs: &RegisterFile, sweep: &mut SweepUnit, mode: EnvelopeMode) {
        if sweep.phase == ModulationPhase::FirstPass || mode.contains(EnvelopeMode::MOD_REPEAT) {
            let base = regs.frequency(SWEEP_CHANNEL) as i32;
            let offset = regs.modulation_offset(sweep.counter as usize) as i32;
            sweep.frequency = (base + offset) as u16;
        }
        if sweep.phase == ModulationPhase::JustWrapped {
            sweep.phase = ModulationPhase::Completed;
        }
        // A frequency half written while modulation was selected lands
        // after the table value, clobbering that half of it.
        match sweep.latch {
            FrequencyLatch::Low => {
                let value = regs.read((channel_base(SWEEP_CHANNEL) + REG_FQL) as usize);
                sweep.set_low_byte(value);
            }
            FrequencyLatch::High => {
                let value = regs.read((channel_base(SWEEP_CHANNEL) + REG_FQH) as usize);
                sweep.set_high_bits(value);
            }
            FrequencyLatch::None => {}
        }
        sweep.frequency &= 0x7FF;
    }

    fn shutoff_stage(regs: &mut RegisterFile, channels: &mut [ChannelState; NUM_CHANNELS]) {
        for (ch, state) in channels.iter_mut().enumerate() {
            let flags = regs.control_flags(ch);
            if flags.contains(ChannelControl::ENABLE | ChannelControl::AUTO_SHUTOFF) {
                state.shutoff_time = state.shutoff_time.wrapping_sub(1);
                if state.shutoff_time & 0x1F == 0x1F {
                    regs.clear_enable(ch);
                }
            }
        }
    }

    fn envelope_stage(regs: &RegisterFile, channels: &mut [ChannelState; NUM_CHANNELS]) {
        for (ch, state) in channels.iter_mut().enumerate() {
            if !regs.channel_enabled(ch) {
                continue;
            }
            let mode = regs.envelope_mode(ch);
            if !mode.contains(EnvelopeMode::ON) || state.envelope_time & 0x80 != 0 {
                continue;
            }
            state.envelope_time = state.envelope_time.wrapping_sub(1);
            if state.envelope_time & 8 == 0 {
                continue;
            }
            let data = regs.envelope0(ch);
            state.envelope_time = data & 7;
            let step: i32 = if data & 8 != 0 { 1 } else { -1 };
            let mut value = state.envelope_value as i32 + step;
            if value & 0x10 != 0 {
                if mode.contains(EnvelopeMode::REPEAT) {
                    value = (data >> 4) as i32;
                } else {
                    // Ran off the end: hold the last level and expire.
                    value -= step;
                    state.envelope_time = 0x80;
                }
            }
            state.envelope_value = value as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::registers::{MODULATION_BASE, REG_EV0, REG_EV1, REG_INT, REG_SWP};

    fn setup() -> (RegisterFile, [ChannelState; NUM_CHANNELS], SweepUnit) {
        (
            RegisterFile::new(),
            [ChannelState::default(); NUM_CHANNELS],
            SweepUnit::default(),
        )
    }

    fn write_reg(regs: &mut RegisterFile, ch: usize, reg: u32, value: u8) {
        regs.write((channel_base(ch) + reg) as usize, value);
    }

    #[test]
    fn test_shutoff_counts_on_every_fourth_tick() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Enable + auto-shutoff, interval 2. The shutoff stage runs on
        // ticks 1, 5, 9, ... and disables once the counter wraps below 0.
        write_reg(&mut regs, 0, REG_INT, 0xA2);
        channels[0].shutoff_time = 2;

        for _ in 0..8 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert!(regs.channel_enabled(0), "two runs only reach zero");

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert!(!regs.channel_enabled(0), "third run wraps and disables");
        assert_eq!(regs.control(0), 0x22, "only the enable bit clears");
    }

    #[test]
    fn test_shutoff_needs_both_control_bits() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, 1, REG_INT, 0x80);
        channels[1].shutoff_time = 0;
        for _ in 0..40 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert!(regs.channel_enabled(1));
        assert_eq!(channels[1].shutoff_time, 0, "counter never moves");
    }

    #[test]
    fn test_envelope_decay_cadence() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Envelope on, step interval 0: one step per envelope run. The
        // envelope stage runs on ticks 1, 17, 33, ...
        write_reg(&mut regs, 2, REG_INT, 0x80);
        write_reg(&mut regs, 2, REG_EV1, 0x01);
        channels[2].envelope_value = 15;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(channels[2].envelope_value, 14);

        for _ in 0..15 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(channels[2].envelope_value, 14, "tick 16 is still early");

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(channels[2].envelope_value, 13, "tick 17 steps again");
    }

    #[test]
    fn test_envelope_interval_spreads_steps() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Step interval 3: the countdown reloads to 3 and only the wrap
        // below zero applies a step, every fourth envelope run.
        write_reg(&mut regs, 0, REG_INT, 0x80);
        write_reg(&mut regs, 0, REG_EV1, 0x01);
        write_reg(&mut regs, 0, REG_EV0, 0x03);
        channels[0].envelope_value = 15;
        channels[0].envelope_time = 3;

        let mut steps = Vec::new();
        for tick in 1..=200 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
            if channels[0].envelope_value == 14 && steps.is_empty() {
                steps.push(tick);
            }
            if channels[0].envelope_value == 13 && steps.len() == 1 {
                steps.push(tick);
            }
        }
        // Envelope runs land on ticks 1, 17, 33, 49, 65, ...; with the
        // countdown starting at 3 the first step lands on the fourth run.
        assert_eq!(steps, vec![49, 113]);
    }

    #[test]
    fn test_envelope_freezes_at_floor() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, 3, REG_INT, 0x80);
        write_reg(&mut regs, 3, REG_EV1, 0x01);
        channels[3].envelope_value = 1;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(channels[3].envelope_value, 0);

        for _ in 0..32 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(channels[3].envelope_value, 0, "underflow holds at zero");
        assert_eq!(channels[3].envelope_time, 0x80, "envelope expired");
    }

    #[test]
    fn test_envelope_repeat_reloads() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, 3, REG_INT, 0x80);
        write_reg(&mut regs, 3, REG_EV1, 0x03);
        write_reg(&mut regs, 3, REG_EV0, 0xA0);
        channels[3].envelope_value = 0;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(channels[3].envelope_value, 10, "reloads from the data nibble");
        assert_ne!(channels[3].envelope_time & 0x80, 0x80);
    }

    #[test]
    fn test_envelope_climb_freezes_at_ceiling() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, 0, REG_INT, 0x80);
        write_reg(&mut regs, 0, REG_EV1, 0x01);
        write_reg(&mut regs, 0, REG_EV0, 0x08);
        channels[0].envelope_value = 14;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(channels[0].envelope_value, 15);

        for _ in 0..16 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(channels[0].envelope_value, 15);
        assert_eq!(channels[0].envelope_time, 0x80);
    }

    #[test]
    fn test_sweep_up_commits_and_overflow_disables() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Sweep selected, enabled, upward, shift 1, interval 1.
        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x40);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x19);
        sweep.frequency = 1024;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 1536, "1024 + (1024 >> 1)");
        assert!(regs.channel_enabled(SWEEP_CHANNEL));

        // Next candidate is 1536 + 768 = 2304: past the top. The overflow
        // check runs every tick, so the channel shuts down even though the
        // timer has not expired and nothing commits.
        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(regs.control(SWEEP_CHANNEL), 0);
        assert_eq!(sweep.frequency, 1536);

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 1536, "disabled channel stops stepping");
    }

    #[test]
    fn test_sweep_overflow_can_commit_on_the_same_tick() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Shift 0 doubles the frequency in one step, and the expired timer
        // commits on the same tick the overflow check disables the channel.
        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x40);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x18);
        sweep.frequency = 1100;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(regs.control(SWEEP_CHANNEL), 0);
        assert_eq!(sweep.frequency, 2200, "out-of-range value still lands");
    }

    #[test]
    fn test_sweep_interval_gates_commits() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        // Interval 2: the timer reloads to 2, so commits land every third
        // tick (1, 4, 7, ...).
        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x40);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x29);
        sweep.frequency = 512;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 768);
        seq.tick(&mut regs, &mut channels, &mut sweep);
        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 768, "ticks 2 and 3 only count down");
        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 768 + 384);
    }

    #[test]
    fn test_sweep_ignored_without_enable_bit() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x19);
        sweep.frequency = 1000;
        for _ in 0..10 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(sweep.frequency, 1000);
        assert_eq!(sweep.timer, 0, "timer holds without the enable bit");
    }

    #[test]
    fn test_modulation_walks_the_table() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x50);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x10);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQL, 0x00);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQH, 0x04);
        regs.write(MODULATION_BASE as usize, 16);
        regs.write(MODULATION_BASE as usize + 4, 0x80);

        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 0x400 + 16);
        assert_eq!(sweep.counter, 1);

        // Interval 1 reloads the timer to 1, so the next step lands two
        // ticks later.
        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 0x400 + 16);
        seq.tick(&mut regs, &mut channels, &mut sweep);
        assert_eq!(sweep.frequency, 0x400 - 128, "entries are signed");
    }

    #[test]
    fn test_modulation_one_shot_freezes_after_pass() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x50);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x10);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQH, 0x02);
        for i in 0..MODULATION_TABLE_LEN {
            regs.write(MODULATION_BASE as usize + 4 * i, i as u8);
        }

        // Steps land every second tick, so a full table pass takes 64.
        for _ in 0..2 * MODULATION_TABLE_LEN {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(sweep.frequency, 0x200 + 31);
        assert_eq!(sweep.counter, 0);
        assert_eq!(sweep.phase, ModulationPhase::JustWrapped);

        for _ in 0..10 {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(sweep.frequency, 0x200 + 31, "one-shot holds the last value");
        assert_eq!(sweep.phase, ModulationPhase::Completed);
    }

    #[test]
    fn test_modulation_repeat_restarts_table() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x70);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x10);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQH, 0x02);
        for i in 0..MODULATION_TABLE_LEN {
            regs.write(MODULATION_BASE as usize + 4 * i, i as u8);
        }

        // 33 steps at one step per two ticks: one full pass plus one.
        for _ in 0..2 * (MODULATION_TABLE_LEN + 1) {
            seq.tick(&mut regs, &mut channels, &mut sweep);
        }
        assert_eq!(sweep.frequency, 0x200, "wrapped back to entry 0");
        assert_eq!(sweep.counter, 1);
        assert_eq!(sweep.phase, ModulationPhase::Completed);
    }

    #[test]
    fn test_modulation_latch_replays_written_half() {
        let (mut regs, mut channels, mut sweep) = setup();
        let mut seq = EffectSequencer::new();

        write_reg(&mut regs, SWEEP_CHANNEL, REG_INT, 0x80);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_EV1, 0x50);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_SWP, 0x10);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQL, 0x55);
        write_reg(&mut regs, SWEEP_CHANNEL, REG_FQH, 0x01);
        regs.write(MODULATION_BASE as usize, -1i8 as u8);
        sweep.latch = FrequencyLatch::Low;

        seq.tick(&mut regs, &mut channels, &mut sweep);
        // Table lands 0x155 - 1 = 0x154, then the latched low byte
        // overwrites: (0x154 & 0x700) | 0x55 = 0x155.
        assert_eq!(sweep.frequency, 0x155);
        assert_eq!(sweep.latch, FrequencyLatch::Low, "latch persists until a write");
    }
}
