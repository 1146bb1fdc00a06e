//! Flat-waveform fast path.
//!
//! A wave table whose 32 entries all hold the same byte produces the same
//! sample no matter where the phase sits, so synthesis can skip the phase
//! walk for whole sub-chunks. Wave memory only changes while every channel
//! is stopped, which keeps the bookkeeping cheap: writes mark a table dirty
//! and the next channel start recomputes the marked ones.

use super::registers::{RegisterFile, WAVE_TABLE_COUNT, WAVE_TABLE_LEN};

/// Tracks which wave tables hold a single repeated byte.
#[derive(Debug, Default)]
pub(crate) struct WaveCache {
    constant: [Option<u8>; WAVE_TABLE_COUNT],
    dirty: [bool; WAVE_TABLE_COUNT],
}

impl WaveCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Flags a table after a wave memory write. Page indices past the wave
    /// tables (the modulation page decodes to 5) have no cache entry.
    pub(crate) fn mark_written(&mut self, table: usize) {
        if table < WAVE_TABLE_COUNT {
            self.dirty[table] = true;
        }
    }

    /// Recomputes the tables flagged since the last channel start.
    pub(crate) fn refresh_dirty(&mut self, regs: &RegisterFile) {
        for table in 0..WAVE_TABLE_COUNT {
            if self.dirty[table] {
                self.dirty[table] = false;
                self.constant[table] = Self::scan(regs, table);
            }
        }
    }

    /// Recomputes every table, for a full chip refresh.
    pub(crate) fn refresh_all(&mut self, regs: &RegisterFile) {
        for table in 0..WAVE_TABLE_COUNT {
            self.dirty[table] = false;
            self.constant[table] = Self::scan(regs, table);
        }
    }

    /// The table's repeated byte, if it holds only one value. Compares raw
    /// bytes, like the flat-path check in the synthesis loop expects.
    #[inline]
    pub(crate) fn constant(&self, table: usize) -> Option<u8> {
        self.constant[table]
    }

    fn scan(regs: &RegisterFile, table: usize) -> Option<u8> {
        let first = regs.wave_entry(table, 0);
        (1..WAVE_TABLE_LEN)
            .all(|step| regs.wave_entry(table, step) == first)
            .then_some(first)
    }
}
