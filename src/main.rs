#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The vsu demo requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
mod cli {
    use std::env;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use vsu::constants::{cycles_for_frames, BUFFER_COUNT};
    use vsu::registers::{
        channel_base, NOISE_CHANNEL, REG_EV0, REG_EV1, REG_FQH, REG_FQL, REG_INT, REG_LRV,
        REG_RAM, SSTOP, WAVE_TABLE_LEN,
    };
    use vsu::{
        render_frames, write_wav, AudioDevice, Vsu, FRAMES_PER_BUFFER, MASTER_CLOCK_HZ,
        SAMPLE_RATE,
    };

    const CYCLES_PER_MICRO: u64 = (MASTER_CLOCK_HZ / 1_000_000) as u64;

    /// The producer thread runs this far ahead of the wall clock so the
    /// audio callback always finds a finished buffer in the ring.
    const SCHEDULE_LEAD_MICROS: u64 = 40_000;

    /// Output frames per melody note (250 ms at 48 kHz).
    const NOTE_FRAMES: u64 = 12_000;

    /// Output frames rendered after the last event so the closing noise
    /// burst can decay to silence.
    const TAIL_FRAMES: u64 = 28_800;

    /// A minor arpeggio, as (label, frequency register value) pairs.
    const MELODY: [(&str, u16); 8] = [
        ("A4", 1693),
        ("C5", 1749),
        ("E5", 1811),
        ("A5", 1870),
        ("E5", 1811),
        ("C5", 1749),
        ("G4", 1649),
        ("A4", 1693),
    ];

    /// A batch of register writes applied at a fixed point on the output
    /// timeline.
    struct Event {
        at_frame: u64,
        label: &'static str,
        writes: Vec<(u32, u16)>,
    }

    fn wave_table_writes() -> Vec<(u32, u16)> {
        // Square wave on table 0: first half full scale, second half silent.
        (0..WAVE_TABLE_LEN)
            .map(|step| {
                let value = if step < WAVE_TABLE_LEN / 2 { 0x3F } else { 0x00 };
                ((step * 4) as u32, value)
            })
            .collect()
    }

    fn note_writes(frequency: u16) -> Vec<(u32, u16)> {
        let base = channel_base(0);
        vec![
            (base + REG_LRV, 0xFF),
            (base + REG_FQL, frequency & 0xFF),
            (base + REG_FQH, frequency >> 8),
            (base + REG_EV0, 0xF7),
            (base + REG_EV1, 0x01),
            (base + REG_RAM, 0x00),
            (base + REG_INT, 0x80),
        ]
    }

    fn noise_hit_writes() -> Vec<(u32, u16)> {
        let base = channel_base(NOISE_CHANNEL);
        vec![
            (base + REG_LRV, 0xFF),
            (base + REG_FQL, 0xF1),
            (base + REG_FQH, 0x07),
            (base + REG_EV0, 0xF1),
            (base + REG_EV1, 0x01),
            (base + REG_INT, 0x80),
        ]
    }

    /// Builds the demo tune: the melody on wave channel 1, closed out by a
    /// decaying noise burst on channel 6.
    fn score() -> Vec<Event> {
        let mut events = Vec::new();

        // The wave table must be loaded before any channel is enabled,
        // so the opening event carries it along with the first note.
        let mut opening = wave_table_writes();
        opening.extend(note_writes(MELODY[0].1));
        events.push(Event {
            at_frame: 0,
            label: MELODY[0].0,
            writes: opening,
        });

        for (index, &(label, frequency)) in MELODY.iter().enumerate().skip(1) {
            events.push(Event {
                at_frame: index as u64 * NOTE_FRAMES,
                label,
                writes: note_writes(frequency),
            });
        }

        // Stop the melody channel, then let the noise generator ring out.
        let mut closing = vec![(SSTOP, 0x01)];
        closing.extend(noise_hit_writes());
        events.push(Event {
            at_frame: MELODY.len() as u64 * NOTE_FRAMES,
            label: "noise burst",
            writes: closing,
        });

        events
    }

    fn render_to_wav(path: &str) -> vsu::Result<()> {
        println!("Rendering demo tune to {}\n", path);

        let mut chip = Vsu::new();
        let mut output = chip
            .take_output()
            .ok_or("PCM consumer already taken")?;

        let mut samples: Vec<i16> = Vec::new();
        let mut rendered: u64 = 0;
        for event in score() {
            if event.at_frame > rendered {
                let gap = (event.at_frame - rendered) as usize;
                samples.extend(render_frames(&mut chip, &mut output, gap));
                rendered = event.at_frame;
            }
            for (address, value) in event.writes {
                chip.write_register(address, value);
            }
        }
        samples.extend(render_frames(&mut chip, &mut output, TAIL_FRAMES as usize));

        write_wav(&samples, path)?;
        println!(
            "Wrote {} frames ({:.2} seconds) to {}",
            samples.len() / 2,
            samples.len() as f32 / 2.0 / SAMPLE_RATE as f32,
            path
        );
        Ok(())
    }

    fn play_live() -> vsu::Result<()> {
        let mut chip = Vsu::new();
        let output = chip
            .take_output()
            .ok_or("PCM consumer already taken")?;
        let chip = Arc::new(parking_lot::Mutex::new(chip));

        let device = AudioDevice::new(output)?;
        println!("Audio device initialized - playing to speakers\n");
        println!("Streaming Configuration:");
        println!("  Sample rate: {} Hz", SAMPLE_RATE);
        println!(
            "  Buffer size: {} frames ({:.1}ms)",
            FRAMES_PER_BUFFER,
            FRAMES_PER_BUFFER as f32 * 1000.0 / SAMPLE_RATE as f32
        );
        println!("  Ring depth:  {} buffers\n", BUFFER_COUNT);

        let events = score();
        let total_frames = MELODY.len() as u64 * NOTE_FRAMES + TAIL_FRAMES;
        let total_cycles = cycles_for_frames(total_frames);
        let start = Instant::now();

        let producer = {
            let chip = Arc::clone(&chip);
            thread::spawn(move || {
                let mut next_event = 0;
                loop {
                    let elapsed_micros = start.elapsed().as_micros() as u64;
                    let target = ((elapsed_micros + SCHEDULE_LEAD_MICROS) * CYCLES_PER_MICRO)
                        .min(total_cycles);

                    let mut chip = chip.lock();
                    while next_event < events.len() {
                        let event = &events[next_event];
                        let at_cycle = cycles_for_frames(event.at_frame);
                        if at_cycle > target {
                            break;
                        }
                        chip.advance(at_cycle);
                        println!("  {}", event.label);
                        for &(address, value) in &event.writes {
                            chip.write_register(address, value);
                        }
                        next_event += 1;
                    }
                    chip.advance(target);
                    drop(chip);

                    if target >= total_cycles {
                        break;
                    }
                    thread::sleep(Duration::from_millis(2));
                }
            })
        };

        producer
            .join()
            .expect("Producer thread panicked during playback");

        // Let the ring and the sink drain before tearing the device down.
        thread::sleep(Duration::from_millis(300));
        device.finish();

        let stats = chip.lock().stats();
        println!("\n=== Playback Statistics ===");
        println!(
            "Duration:         {:.2} seconds",
            start.elapsed().as_secs_f32()
        );
        println!("Buffers played:   {}", stats.buffers_played);
        println!("Underruns:        {}", stats.underruns);
        println!("Dropped buffers:  {}", stats.drops);
        println!("\nPlayback complete!");

        Ok(())
    }

    pub fn run() -> vsu::Result<()> {
        println!("Virtual Boy VSU Emulator - Demo Tune");
        println!("=====================================\n");

        let mut wav_path: Option<String> = None;
        let mut show_help = false;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => {
                    show_help = true;
                }
                "--wav" => match args.next() {
                    Some(value) => wav_path = Some(value),
                    None => {
                        eprintln!("--wav requires a file argument");
                        show_help = true;
                    }
                },
                _ if arg.starts_with("--wav=") => {
                    wav_path = Some(arg[6..].to_string());
                }
                _ => {
                    eprintln!("Unknown argument: {}", arg);
                    show_help = true;
                }
            }
        }

        if show_help {
            eprintln!(
                "Usage:\n  vsu [--wav <file>]\n\nFlags:\n  --wav <file>    Render the demo tune to a WAV file instead of playing it\n  -h, --help      Show this help\n"
            );
            return Ok(());
        }

        match wav_path {
            Some(path) => render_to_wav(&path),
            None => play_live(),
        }
    }
}

#[cfg(feature = "streaming")]
fn main() -> vsu::Result<()> {
    cli::run()
}
