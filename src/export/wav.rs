//! WAV file writing via `hound`.

use std::path::Path;

use crate::buffer_ring::PcmConsumer;
use crate::constants::SAMPLE_RATE;
use crate::vsu::Vsu;
use crate::{Result, VsuError};

use super::render_frames;

/// Writes interleaved stereo samples as a 16-bit 48 kHz WAV file.
pub fn write_wav<P: AsRef<Path>>(samples: &[i16], path: P) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| VsuError::AudioFileError(format!("Failed to create WAV file: {}", e)))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| VsuError::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| VsuError::AudioFileError(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}

/// Renders `frame_count` frames from the chip and writes them to `path`.
pub fn export_to_wav<P: AsRef<Path>>(
    chip: &mut Vsu,
    output: &mut PcmConsumer,
    frame_count: usize,
    path: P,
) -> Result<()> {
    let samples = render_frames(chip, output, frame_count);
    write_wav(&samples, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_writes_readable_wav() {
        let mut chip = Vsu::new();
        let mut output = chip.take_output().expect("consumer");
        let path = std::env::temp_dir().join("vsu_export_test.wav");

        export_to_wav(&mut chip, &mut output, 960, &path).expect("export succeeds");

        let reader = hound::WavReader::open(&path).expect("file reads back");
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 1920, "960 stereo frames");

        std::fs::remove_file(&path).ok();
    }
}
