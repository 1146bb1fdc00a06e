//! The chip core: register writes, the synthesis loop, buffer production.

use std::sync::Arc;

use crate::buffer_ring::{BufferRing, PcmConsumer, RingStats};
use crate::constants::{CYCLES_PER_SAMPLE, EFFECT_INTERVAL_SAMPLES, FRAMES_PER_BUFFER};
use crate::dc_filter::DcRestorer;

use super::channel::{ChannelState, NoiseLfsr};
use super::effects::EffectSequencer;
use super::registers::{
    channel_base, EnvelopeMode, RegisterFile, ADDRESS_MASK, NOISE_CHANNEL, NUM_CHANNELS, REG_EV0,
    REG_EV1, REG_FQH, REG_FQL, REG_INT, SSTOP, SWEEP_CHANNEL, WAVE_TABLE_COUNT,
};
use super::sweep::{FrequencyLatch, SweepUnit};
use super::wave_cache::WaveCache;

/// The VSU sound chip.
///
/// The chip is driven from the emulation thread: [`write_register`] stores
/// bytes into the 4 KiB register window and applies their side effects, and
/// [`advance`] moves emulated time forward, synthesizing one output sample
/// per 416 master cycles. Finished 480-frame buffers pass through DC
/// restoration and are published to the PCM ring, where the
/// [`PcmConsumer`] obtained from [`take_output`] picks them up.
///
/// [`write_register`]: Vsu::write_register
/// [`advance`]: Vsu::advance
/// [`take_output`]: Vsu::take_output
pub struct Vsu {
    regs: RegisterFile,
    channels: [ChannelState; NUM_CHANNELS],
    sweep: SweepUnit,
    noise: NoiseLfsr,
    cache: WaveCache,
    effects: EffectSequencer,
    dc: DcRestorer,
    /// Output samples until the next sequencer effect tick. Starts expired
    /// so the first tick lands before the first sample.
    effect_countdown: u32,
    /// Master cycle up to which samples have been synthesized.
    last_cycles: u64,
    /// Latest cycle handed to [`Vsu::advance`].
    current_cycle: u64,
    ring: Arc<BufferRing>,
    fill_index: usize,
    fill_pos: usize,
    output: Option<PcmConsumer>,
}

impl Vsu {
    /// Creates a powered-on chip with zeroed registers and an empty ring.
    pub fn new() -> Self {
        let ring = Arc::new(BufferRing::new());
        let output = PcmConsumer::new(Arc::clone(&ring));
        let regs = RegisterFile::new();
        let mut cache = WaveCache::new();
        cache.refresh_all(&regs);
        Self {
            regs,
            channels: [ChannelState::default(); NUM_CHANNELS],
            sweep: SweepUnit::default(),
            noise: NoiseLfsr::default(),
            cache,
            effects: EffectSequencer::new(),
            dc: DcRestorer::new(),
            effect_countdown: 0,
            last_cycles: 0,
            current_cycle: 0,
            ring,
            fill_index: 0,
            fill_pos: 0,
            output: Some(output),
        }
    }

    /// Takes the consuming side of the PCM ring.
    ///
    /// There is exactly one consumer; the first call returns it and later
    /// calls return `None`.
    pub fn take_output(&mut self) -> Option<PcmConsumer> {
        self.output.take()
    }

    /// Advances emulation to `cycle` (absolute, in 20 MHz master cycles),
    /// synthesizing the elapsed output samples. Calls that do not move time
    /// forward do nothing.
    pub fn advance(&mut self, cycle: u64) {
        if cycle > self.current_cycle {
            self.current_cycle = cycle;
            self.synthesize_to(cycle);
        }
    }

    /// Latest cycle passed to [`Vsu::advance`].
    #[inline]
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Stores the low byte of a bus write into the register window and
    /// applies its effects. The registers are byte-wide; the upper byte of a
    /// halfword write never reaches them.
    ///
    /// Odd addresses are ignored and bit 1 is folded away, giving every
    /// register its 4-byte stride. Writes land at the chip's current time:
    /// callers interleaving writes with CPU execution should [`advance`] up
    /// to the write's cycle first.
    ///
    /// Wave and modulation memory writes are rejected while channel 5 is
    /// enabled, and wave table writes while any channel is enabled.
    ///
    /// [`advance`]: Vsu::advance
    pub fn write_register(&mut self, address: u32, value: u16) {
        if address & 1 != 0 {
            return;
        }
        let value = value as u8;
        let offset = (address as usize & ADDRESS_MASK) & !2;
        self.sweep.latch = FrequencyLatch::None;

        if offset & 0x400 == 0 {
            if self.regs.channel_enabled(SWEEP_CHANNEL) {
                return;
            }
            if offset & 0x370 < 0x280 {
                let busy = (0..NUM_CHANNELS)
                    .any(|ch| ch != SWEEP_CHANNEL && self.regs.channel_enabled(ch));
                if busy {
                    return;
                }
                self.cache.mark_written((offset >> 7) & 7);
            }
            self.regs.write(offset, value);
            return;
        }

        let was_silent = offset & 0x3F == 0 && self.regs.all_channels_stopped();
        self.regs.write(offset, value);

        let ch = (offset >> 6) & 7;
        if offset == SSTOP as usize {
            if value & 1 != 0 {
                for ch in 0..NUM_CHANNELS {
                    self.regs.clear_enable(ch);
                }
            }
        } else if offset & 0x3F == REG_INT as usize && ch < NUM_CHANNELS {
            if was_silent {
                // Coming out of silence: fold buffered wave writes into the
                // flat-waveform cache before they can be heard.
                self.cache.refresh_dirty(&self.regs);
            }
            if ch == SWEEP_CHANNEL {
                self.sweep.restart(self.regs.sweep_control());
            } else if ch == NOISE_CHANNEL {
                self.noise.reseed();
            }
            let period = Self::period(ch, self.regs.frequency(ch), self.sweep.frequency);
            self.channels[ch].restart(value, period, self.regs.envelope0(ch));
        } else if offset & 0x3F == REG_EV0 as usize && ch < NUM_CHANNELS {
            self.channels[ch].envelope_value = (value >> 4) & 0xF;
        } else if offset == (channel_base(SWEEP_CHANNEL) + REG_FQL) as usize {
            self.sweep.set_low_byte(value);
            if self.modulation_selected() {
                self.sweep.latch = FrequencyLatch::Low;
            }
        } else if offset == (channel_base(SWEEP_CHANNEL) + REG_FQH) as usize {
            self.sweep.set_high_bits(value);
            if self.modulation_selected() {
                self.sweep.latch = FrequencyLatch::High;
            }
        } else if offset == (channel_base(NOISE_CHANNEL) + REG_EV1) as usize {
            self.noise.reseed();
        }
    }

    /// Reads back one byte of the register window.
    #[inline]
    pub fn read_register(&self, address: u32) -> u8 {
        self.regs.read(address as usize & ADDRESS_MASK)
    }

    /// Returns the chip to its power-on state.
    ///
    /// Channel counters, the sweep unit, the noise register and all channel
    /// control bytes are cleared and pending ring buffers are flushed. Wave
    /// and modulation memory survive, as does the DC restoration offset, so
    /// a reset mid-stream does not step the output level.
    pub fn reset(&mut self) {
        self.channels = [ChannelState::default(); NUM_CHANNELS];
        self.sweep = SweepUnit::default();
        self.noise.reseed();
        self.effects.reset();
        self.effect_countdown = 0;
        self.last_cycles = 0;
        self.current_cycle = 0;
        for ch in 0..NUM_CHANNELS {
            self.regs.zero_control(ch);
        }
        self.cache.refresh_all(&self.regs);
        self.fill_pos = 0;
        self.ring.request_flush();
        self.ring.set_paused(false);
    }

    /// Pauses playback: the consumer substitutes silence and holds pending
    /// buffers. The DC restoration offset is cleared so resuming does not
    /// replay the old level as a click.
    pub fn pause(&mut self) {
        self.ring.set_paused(true);
        self.dc.reset();
    }

    /// Resumes a paused chip.
    pub fn resume(&mut self) {
        self.ring.set_paused(false);
    }

    /// Mutes or unmutes playback. Muted playback keeps consuming buffers on
    /// schedule, so timing is unaffected.
    pub fn set_muted(&mut self, muted: bool) {
        self.ring.set_muted(muted);
    }

    /// Current mute state.
    pub fn is_muted(&self) -> bool {
        self.ring.muted()
    }

    /// Playback counters for diagnostics.
    pub fn stats(&self) -> RingStats {
        self.ring.stats()
    }

    /// Current DC restoration offset.
    pub fn dc_offset(&self) -> i16 {
        self.dc.offset()
    }

    fn modulation_selected(&self) -> bool {
        self.regs
            .envelope_mode(SWEEP_CHANNEL)
            .contains(EnvelopeMode::MODULATE)
    }

    /// Master cycles per wave step (or LFSR shift) for a channel.
    ///
    /// Channel 5 runs from its sweep unit's operating frequency instead of
    /// the register pair. An overflowed sweep commit can leave that past
    /// the top of the range; the clamp keeps the divider moving.
    fn period(ch: usize, frequency: u16, sweep_frequency: u16) -> i32 {
        let f = if ch == SWEEP_CHANNEL {
            sweep_frequency
        } else {
            frequency
        };
        let base = (2048 - f as i32).max(1);
        base * if ch == NOISE_CHANNEL { 40 } else { 4 }
    }

    /// Synthesizes all whole output samples between `last_cycles` and
    /// `cycle`, splitting at buffer boundaries and effect ticks.
    fn synthesize_to(&mut self, cycle: u64) {
        let elapsed = cycle.saturating_sub(self.last_cycles);
        let mut remaining = (elapsed / CYCLES_PER_SAMPLE as u64) as usize;
        if remaining == 0 {
            return;
        }
        self.last_cycles += remaining as u64 * CYCLES_PER_SAMPLE as u64;

        while remaining > 0 {
            let space = FRAMES_PER_BUFFER - self.fill_pos;
            let samples = remaining.min(space).min(self.effect_countdown as usize);

            let sweep_frequency = self.sweep.frequency;
            let Self {
                ref regs,
                ref cache,
                ref mut channels,
                ref mut noise,
                ref ring,
                fill_index,
                fill_pos,
                ..
            } = *self;
            ring.with_producer_frames(fill_index, |frames| {
                let chunk = &mut frames[fill_pos..fill_pos + samples];
                chunk.fill(0);
                for ch in 0..NUM_CHANNELS {
                    Self::run_channel(
                        regs,
                        cache,
                        &mut channels[ch],
                        noise,
                        ch,
                        sweep_frequency,
                        chunk,
                    );
                }
            });

            self.effect_countdown -= samples as u32;
            if self.effect_countdown == 0 {
                self.effect_countdown = EFFECT_INTERVAL_SAMPLES;
                self.effects
                    .tick(&mut self.regs, &mut self.channels, &mut self.sweep);
            }

            self.fill_pos += samples;
            remaining -= samples;
            if self.fill_pos == FRAMES_PER_BUFFER {
                self.finish_buffer();
            }
        }
    }

    /// Runs DC restoration over the finished buffer and publishes it. When
    /// the ring is full the slot is reused and the buffer drops.
    fn finish_buffer(&mut self) {
        let Self {
            ref ring,
            ref mut dc,
            fill_index,
            ..
        } = *self;
        ring.with_producer_frames(fill_index, |frames| dc.process_buffer(frames));
        if let Some(next) = self.ring.try_publish(self.fill_index) {
            self.fill_index = next;
        }
        self.fill_pos = 0;
    }

    /// Mixes one channel into `chunk`, stepping its frequency divider on
    /// master-cycle boundaries.
    fn run_channel(
        regs: &RegisterFile,
        cache: &WaveCache,
        state: &mut ChannelState,
        noise: &mut NoiseLfsr,
        ch: usize,
        sweep_frequency: u16,
        chunk: &mut [u32],
    ) {
        if !regs.channel_enabled(ch) || state.envelope_value == 0 {
            return;
        }
        let wave = regs.wave_select(ch);
        if ch < NOISE_CHANNEL && wave >= WAVE_TABLE_COUNT {
            return;
        }

        let total_clocks = chunk.len() as i32 * CYCLES_PER_SAMPLE as i32;
        let period = Self::period(ch, regs.frequency(ch), sweep_frequency);
        let mut current_clocks = 0;
        while current_clocks < total_clocks {
            let mut clocks = total_clocks - current_clocks;
            if ch == NOISE_CHANNEL || cache.constant(wave).is_none() {
                clocks = clocks.min(state.freq_time);
            } else {
                // Flat waveform: every step produces the same sample, so
                // park the divider past this span instead of iterating it.
                state.freq_time = clocks + period;
            }

            let first = (current_clocks / CYCLES_PER_SAMPLE as i32) as usize;
            let last = ((current_clocks + clocks) / CYCLES_PER_SAMPLE as i32) as usize;
            Self::mix_span(regs, state, noise, ch, wave, &mut chunk[first..last]);

            state.freq_time -= clocks;
            if state.freq_time == 0 {
                if ch < NOISE_CHANNEL {
                    state.sample_pos = (state.sample_pos + 1) & 31;
                } else {
                    noise.step(regs.noise_tap());
                }
                state.freq_time = period;
            }
            current_clocks += clocks;
        }
    }

    /// Accumulates one held sample value across a span of frames.
    ///
    /// Left/right volumes are the envelope level scaled by the stereo
    /// nibbles with a +1 bump when both sides of the product are nonzero,
    /// packed as left in the low half-word and right in the high.
    fn mix_span(
        regs: &RegisterFile,
        state: &ChannelState,
        noise: &NoiseLfsr,
        ch: usize,
        wave: usize,
        span: &mut [u32],
    ) {
        if span.is_empty() {
            return;
        }
        let level = regs.level(ch);
        let env = state.envelope_value as u32;
        let mut left_vol = (env * (level >> 4) as u32) >> 3;
        let mut right_vol = (env * (level & 0xF) as u32) >> 3;
        if env != 0 {
            if level & 0xF0 != 0 {
                left_vol += 1;
            }
            if level & 0x0F != 0 {
                right_vol += 1;
            }
        }
        let sample = if ch < NOISE_CHANNEL {
            (regs.wave_entry(wave, state.sample_pos as usize) & 0x3F) as u32
        } else {
            noise.output(regs.noise_tap()) as u32
        };
        let word = ((left_vol * sample) & 0xFFFF) | ((right_vol * sample) << 16);
        for frame in span {
            *frame = frame.wrapping_add(word);
        }
    }
}

impl Default for Vsu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vsu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vsu")
            .field("current_cycle", &self.current_cycle)
            .field("fill_pos", &self.fill_pos)
            .field("stats", &self.ring.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{cycles_for_frames, SAMPLES_PER_BUFFER};
    use super::super::registers::REG_LRV;

    fn write(chip: &mut Vsu, ch: usize, reg: u32, value: u16) {
        chip.write_register(channel_base(ch) + reg, value);
    }

    /// Square wave on channel 1: full volume, envelope 15, about 440 Hz.
    fn program_square(chip: &mut Vsu) {
        for step in 0..32 {
            chip.write_register(step * 4, if step < 16 { 0x3F } else { 0 });
        }
        write(chip, 0, REG_LRV, 0xFF);
        write(chip, 0, REG_EV0, 0xF0);
        write(chip, 0, REG_FQL, 0x9D);
        write(chip, 0, REG_FQH, 0x06);
        write(chip, 0, REG_INT, 0x80);
    }

    #[test]
    fn test_new_chip_produces_silence() {
        let mut chip = Vsu::new();
        let mut output = chip.take_output().expect("first take hands out the consumer");
        assert!(chip.take_output().is_none(), "there is only one consumer");

        chip.advance(cycles_for_frames(480));
        let mut pcm = [1i16; SAMPLES_PER_BUFFER];
        assert!(output.next_buffer(&mut pcm));
        assert!(pcm.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_odd_addresses_are_ignored() {
        let mut chip = Vsu::new();
        chip.sweep.latch = FrequencyLatch::Low;
        chip.write_register(channel_base(0) + REG_INT + 1, 0xFF);
        assert!(!chip.regs.channel_enabled(0));
        assert_eq!(
            chip.sweep.latch,
            FrequencyLatch::Low,
            "odd writes never reach the chip, not even the latch clear"
        );
    }

    #[test]
    fn test_bit_one_folds_onto_register_stride() {
        let mut chip = Vsu::new();
        chip.write_register(channel_base(0) + REG_LRV + 2, 0xDB);
        assert_eq!(chip.regs.level(0), 0xDB);
        assert_eq!(chip.read_register(channel_base(0) + REG_LRV), 0xDB);
    }

    #[test]
    fn test_int_write_restarts_channel_counters() {
        let mut chip = Vsu::new();
        write(&mut chip, 0, REG_FQL, 0x9D);
        write(&mut chip, 0, REG_FQH, 0x06);
        write(&mut chip, 0, REG_EV0, 0xA5);
        chip.channels[0].sample_pos = 13;

        write(&mut chip, 0, REG_INT, 0x9F);
        assert!(chip.regs.channel_enabled(0));
        assert_eq!(chip.channels[0].sample_pos, 0);
        assert_eq!(chip.channels[0].shutoff_time, 0x1F);
        assert_eq!(chip.channels[0].envelope_time, 5);
        assert_eq!(
            chip.channels[0].freq_time,
            (2048 - 0x69D) * 4,
            "divider reloads from the register frequency"
        );
        assert_eq!(chip.channels[0].envelope_value, 10, "set by the earlier EV0 write");
    }

    #[test]
    fn test_ev0_write_latches_envelope_value() {
        let mut chip = Vsu::new();
        chip.channels[2].envelope_time = 0x44;
        write(&mut chip, 2, REG_EV0, 0xA7);
        assert_eq!(chip.channels[2].envelope_value, 10);
        assert_eq!(
            chip.channels[2].envelope_time, 0x44,
            "EV0 alone does not restart the step counter"
        );
    }

    #[test]
    fn test_sstop_clears_every_enable_bit() {
        let mut chip = Vsu::new();
        for ch in 0..NUM_CHANNELS {
            write(&mut chip, ch, REG_INT, 0x9F);
        }
        chip.write_register(SSTOP, 0x00);
        assert!(!chip.regs.all_channels_stopped(), "even stop values do nothing");

        chip.write_register(SSTOP, 0x01);
        assert!(chip.regs.all_channels_stopped());
        assert_eq!(chip.regs.control(0), 0x1F, "only the enable bits clear");
    }

    #[test]
    fn test_wave_memory_locks_while_channels_play() {
        let mut chip = Vsu::new();
        chip.write_register(0x000, 0x11);
        assert_eq!(chip.read_register(0x000), 0x11, "writable while silent");

        write(&mut chip, 0, REG_INT, 0x80);
        chip.write_register(0x000, 0x22);
        assert_eq!(chip.read_register(0x000), 0x11, "wave memory locked");
        chip.write_register(0x284, 0x22);
        assert_eq!(chip.read_register(0x284), 0, "modulation memory locked too");
        chip.write_register(0x300, 0x22);
        assert_eq!(chip.read_register(0x300), 0x22, "the scratch page stays open");

        chip.write_register(SSTOP, 1);
        write(&mut chip, SWEEP_CHANNEL, REG_INT, 0x80);
        chip.write_register(0x300, 0x33);
        assert_eq!(
            chip.read_register(0x300),
            0x22,
            "channel 5 locks the whole memory region"
        );
    }

    #[test]
    fn test_wave_cache_refreshes_when_leaving_silence() {
        let mut chip = Vsu::new();
        assert_eq!(chip.cache.constant(0), Some(0), "zeroed tables scan flat");

        for step in 0..32 {
            chip.write_register(step * 4, 5);
        }
        assert_eq!(chip.cache.constant(0), Some(0), "writes only mark the table");

        // The first enable after silence rescans; a noise channel enable
        // counts just like a wavetable one.
        write(&mut chip, NOISE_CHANNEL, REG_INT, 0x80);
        assert_eq!(chip.cache.constant(0), Some(5));

        chip.write_register(SSTOP, 1);
        chip.write_register(0, 9);
        write(&mut chip, 0, REG_INT, 0x80);
        assert_eq!(chip.cache.constant(0), None, "one odd entry breaks flatness");
    }

    #[test]
    fn test_frequency_writes_latch_under_modulation() {
        let mut chip = Vsu::new();
        write(&mut chip, SWEEP_CHANNEL, REG_EV1, 0x10);
        write(&mut chip, SWEEP_CHANNEL, REG_FQL, 0x55);
        assert_eq!(chip.sweep.frequency, 0x055);
        assert_eq!(chip.sweep.latch, FrequencyLatch::Low);

        write(&mut chip, SWEEP_CHANNEL, REG_FQH, 0x03);
        assert_eq!(chip.sweep.frequency, 0x355);
        assert_eq!(chip.sweep.latch, FrequencyLatch::High);

        // Any other write clears the pending latch.
        write(&mut chip, SWEEP_CHANNEL, REG_EV1, 0x00);
        assert_eq!(chip.sweep.latch, FrequencyLatch::None);

        // Without modulation selected the writes splice but do not latch.
        write(&mut chip, SWEEP_CHANNEL, REG_FQL, 0x66);
        assert_eq!(chip.sweep.frequency, 0x366);
        assert_eq!(chip.sweep.latch, FrequencyLatch::None);
    }

    #[test]
    fn test_noise_register_writes_reseed_the_lfsr() {
        let mut chip = Vsu::new();
        for _ in 0..8 {
            chip.noise.step(0);
        }
        assert_eq!(chip.noise.output(0), 0, "walked into the zero-output state");

        write(&mut chip, NOISE_CHANNEL, REG_EV1, 0x00);
        assert_eq!(chip.noise.output(0), 0x3F, "EV1 write reseeds");

        for _ in 0..8 {
            chip.noise.step(0);
        }
        write(&mut chip, NOISE_CHANNEL, REG_INT, 0x80);
        assert_eq!(chip.noise.output(0), 0x3F, "control write reseeds");
    }

    #[test]
    fn test_advance_publishes_buffers() {
        let mut chip = Vsu::new();
        let mut output = chip.take_output().expect("consumer");
        program_square(&mut chip);

        chip.advance(cycles_for_frames(480));
        assert_eq!(chip.current_cycle(), cycles_for_frames(480));

        let mut pcm = [0i16; SAMPLES_PER_BUFFER];
        assert!(output.next_buffer(&mut pcm));
        assert!(pcm.iter().any(|&s| s != 0), "an enabled channel makes sound");
        assert!(!output.next_buffer(&mut pcm), "only one buffer was produced");
    }

    #[test]
    fn test_advance_ignores_time_going_backwards() {
        let mut chip = Vsu::new();
        let mut output = chip.take_output().expect("consumer");
        program_square(&mut chip);

        chip.advance(100_000);
        assert_eq!(chip.current_cycle(), 100_000);
        let fill = chip.fill_pos;

        chip.advance(50_000);
        assert_eq!(chip.current_cycle(), 100_000);
        assert_eq!(chip.fill_pos, fill);

        chip.advance(cycles_for_frames(480));
        let mut pcm = [0i16; SAMPLES_PER_BUFFER];
        assert!(output.next_buffer(&mut pcm), "the buffer still completes on time");
    }

    #[test]
    fn test_partial_advances_accumulate_samples() {
        let mut chip = Vsu::new();
        // 416 cycles per sample: 400 is not quite one sample.
        chip.advance(400);
        assert_eq!(chip.fill_pos, 0);
        chip.advance(832);
        assert_eq!(chip.fill_pos, 2, "leftover cycles carry across calls");
    }

    #[test]
    fn test_reset_returns_to_power_on() {
        let mut chip = Vsu::new();
        let mut output = chip.take_output().expect("consumer");
        program_square(&mut chip);
        chip.advance(cycles_for_frames(480) + 5000);

        chip.reset();
        assert!(chip.regs.all_channels_stopped());
        assert_eq!(chip.current_cycle(), 0);
        assert_eq!(chip.fill_pos, 0);
        assert_eq!(chip.sweep.frequency, 0);
        assert_eq!(
            chip.read_register(0x000),
            0x3F,
            "wave memory survives a reset"
        );

        let mut pcm = [0i16; SAMPLES_PER_BUFFER];
        assert!(
            !output.next_buffer(&mut pcm),
            "reset flushes the published buffer"
        );
    }

    #[test]
    fn test_mute_passthrough() {
        let mut chip = Vsu::new();
        assert!(!chip.is_muted());
        chip.set_muted(true);
        assert!(chip.is_muted());
    }
}
