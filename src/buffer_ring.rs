//! Lock-free PCM buffer ring between the emulation and audio threads.
//!
//! The chip fills fixed-size stereo buffers and publishes each one by
//! setting its slot's ready flag; the consumer drains them in order and
//! clears the flag when done. Exactly one thread produces and one consumes,
//! so a slot is always owned by one side: the producer while its flag is
//! false, the consumer while it is true. Release/acquire ordering on the
//! flag hands the buffer contents across.
//!
//! The producer never overwrites a published buffer. When the slot after
//! the one it just filled is still waiting to be consumed, the finished
//! buffer is simply not published and the next fill reuses the slot,
//! dropping the oldest unplayed audio by one buffer. The consumer
//! substitutes silence when it catches up with the producer. Both events
//! are counted in [`RingStats`].

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::constants::{BUFFER_COUNT, FRAMES_PER_BUFFER, SAMPLES_PER_BUFFER};

/// One ring slot: a buffer of packed stereo frames plus its ownership flag.
///
/// Frames are stored the way the mixer accumulates them, left channel in
/// the low half-word and right in the high half-word.
struct BufferSlot {
    ready: AtomicBool,
    frames: UnsafeCell<[u32; FRAMES_PER_BUFFER]>,
}

// SAFETY: slot contents are only touched by the side that currently owns
// the slot. The single producer writes `frames` while `ready` is false and
// publishes with a release store; the single consumer reads `frames` after
// an acquire load sees true and releases the slot by storing false. The
// flush path only writes flags, never contents.
unsafe impl Sync for BufferSlot {}

/// Shared state of the PCM ring.
pub(crate) struct BufferRing {
    slots: [BufferSlot; BUFFER_COUNT],
    /// The producer's next publish index, mirrored here so a flushing
    /// consumer can realign with it.
    fill_cursor: AtomicUsize,
    paused: AtomicBool,
    muted: AtomicBool,
    flush_epoch: AtomicU32,
    buffers_played: AtomicU64,
    underruns: AtomicU64,
    drops: AtomicU64,
}

impl BufferRing {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| BufferSlot {
                ready: AtomicBool::new(false),
                frames: UnsafeCell::new([0; FRAMES_PER_BUFFER]),
            }),
            fill_cursor: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            flush_epoch: AtomicU32::new(0),
            buffers_played: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        }
    }

    /// Gives the producer mutable access to a slot it owns.
    ///
    /// Callers must be the single producer and must only pass the index of
    /// an unpublished slot.
    pub(crate) fn with_producer_frames<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut [u32; FRAMES_PER_BUFFER]) -> R,
    ) -> R {
        // SAFETY: the producer owns this slot (flag false), so no other
        // reference to the contents exists. See the Sync rationale above.
        f(unsafe { &mut *self.slots[index].frames.get() })
    }

    /// Publishes a finished buffer if the following slot is free.
    ///
    /// Returns the next fill index on success. When the consumer is a full
    /// ring behind, the buffer stays unpublished so the producer reuses the
    /// slot, and the drop is counted.
    pub(crate) fn try_publish(&self, index: usize) -> Option<usize> {
        let next = (index + 1) % BUFFER_COUNT;
        if self.slots[next].ready.load(Ordering::Acquire) {
            self.drops.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.slots[index].ready.store(true, Ordering::Release);
        self.fill_cursor.store(next, Ordering::Relaxed);
        Some(next)
    }

    /// Asks the consumer to discard everything published so far.
    ///
    /// The consumer notices the epoch change on its next callback, clears
    /// all ready flags and realigns with the producer's fill cursor, so
    /// stale buffers never play and fresh ones keep arriving in order.
    pub(crate) fn request_flush(&self) {
        self.flush_epoch.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub(crate) fn muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub(crate) fn stats(&self) -> RingStats {
        RingStats {
            buffers_played: self.buffers_played.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}

/// Playback counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingStats {
    /// Buffers handed to the consumer with real data.
    pub buffers_played: u64,
    /// Consumer callbacks that had to substitute silence.
    pub underruns: u64,
    /// Finished buffers the producer could not publish.
    pub drops: u64,
}

/// Consuming side of the PCM ring.
///
/// Obtained once from [`crate::Vsu::take_output`] and typically moved into
/// the audio callback thread. Repeatedly call [`next_buffer`] to drain
/// buffers in production order.
///
/// [`next_buffer`]: PcmConsumer::next_buffer
pub struct PcmConsumer {
    ring: Arc<BufferRing>,
    play_index: usize,
    flush_seen: u32,
}

impl PcmConsumer {
    pub(crate) fn new(ring: Arc<BufferRing>) -> Self {
        Self {
            ring,
            play_index: 0,
            flush_seen: 0,
        }
    }

    /// Fills `out` with the next 10 ms of interleaved stereo samples.
    ///
    /// Returns `true` when a produced buffer was consumed (muted playback
    /// consumes it but delivers silence), `false` when the output is
    /// substitute silence because the chip is paused or the ring ran dry.
    pub fn next_buffer(&mut self, out: &mut [i16; SAMPLES_PER_BUFFER]) -> bool {
        let epoch = self.ring.flush_epoch.load(Ordering::Acquire);
        if epoch != self.flush_seen {
            self.flush_seen = epoch;
            for slot in &self.ring.slots {
                slot.ready.store(false, Ordering::Release);
            }
            self.play_index = self.ring.fill_cursor.load(Ordering::Relaxed);
        }

        if self.ring.paused.load(Ordering::Relaxed) {
            out.fill(0);
            return false;
        }

        let slot = &self.ring.slots[self.play_index];
        if !slot.ready.load(Ordering::Acquire) {
            self.ring.underruns.fetch_add(1, Ordering::Relaxed);
            out.fill(0);
            return false;
        }

        if self.ring.muted() {
            out.fill(0);
        } else {
            // SAFETY: the acquire load above saw true, so the consumer owns
            // the slot contents until it clears the flag below.
            let frames = unsafe { &*slot.frames.get() };
            for (pair, word) in out.chunks_exact_mut(2).zip(frames.iter()) {
                pair[0] = (*word & 0xFFFF) as u16 as i16;
                pair[1] = (*word >> 16) as u16 as i16;
            }
        }

        slot.ready.store(false, Ordering::Release);
        self.play_index = (self.play_index + 1) % BUFFER_COUNT;
        self.ring.buffers_played.fetch_add(1, Ordering::Relaxed);
        true
    }
}

impl std::fmt::Debug for PcmConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcmConsumer")
            .field("play_index", &self.play_index)
            .field("stats", &self.ring.stats())
            .finish_non_exhaustive()
    }
}
