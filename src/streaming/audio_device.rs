//! Audio device integration using rodio
//!
//! Plays ring buffers to the system audio device, substituting silence on
//! underrun so the stream never stalls.

use crate::buffer_ring::PcmConsumer;
use crate::constants::{SAMPLES_PER_BUFFER, SAMPLE_RATE};
use crate::{Result, VsuError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source fed from the chip's PCM consumer.
struct ConsumerSource {
    output: PcmConsumer,
    /// One ring buffer's worth of interleaved samples.
    buffer: [i16; SAMPLES_PER_BUFFER],
    buffer_pos: usize,
    finished: Arc<AtomicBool>,
}

impl ConsumerSource {
    fn new(output: PcmConsumer, finished: Arc<AtomicBool>) -> Self {
        ConsumerSource {
            output,
            buffer: [0; SAMPLES_PER_BUFFER],
            // Start past the end so the first sample pulls a fresh buffer.
            buffer_pos: SAMPLES_PER_BUFFER,
            finished,
        }
    }
}

impl Source for ConsumerSource {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = SAMPLES_PER_BUFFER - self.buffer_pos;
        if remaining > 0 {
            Some(remaining)
        } else {
            Some(SAMPLES_PER_BUFFER)
        }
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        // We don't know total duration upfront
        None
    }
}

impl Iterator for ConsumerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.buffer_pos >= SAMPLES_PER_BUFFER {
            // The consumer substitutes silence when the ring is paused or
            // dry, so playback timing holds either way.
            self.output.next_buffer(&mut self.buffer);
            self.buffer_pos = 0;
        }

        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some((sample as f32 / 32767.0).clamp(-1.0, 1.0))
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Creates a device and starts playing from the consumer.
    ///
    /// The consumer comes from [`Vsu::take_output`](crate::Vsu::take_output)
    /// and moves onto the audio thread; keep advancing the chip from the
    /// emulation side to feed it.
    pub fn new(output: PcmConsumer) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VsuError::AudioDeviceError(format!("Failed to create audio stream: {}", e)))?;

        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| VsuError::AudioDeviceError(format!("Failed to create audio sink: {}", e)))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = ConsumerSource::new(output, Arc::clone(&finished));
        sink.append(source);

        let running = Arc::new(AtomicBool::new(true));

        Ok(AudioDevice {
            _stream: stream,
            sink,
            running,
            finished,
        })
    }

    /// Pause playback
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Check if audio device is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Wait for playback to finish (blocks until the sink is empty)
    pub fn wait_for_finish(&self) {
        self.sink.sleep_until_end();
    }

    /// Signal that no more buffers will be produced, letting the playback
    /// stream terminate instead of playing silence forever.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.pause();
        self.running.store(false, Ordering::Relaxed);
    }
}
