use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    Unsupported(String),
}

/// Mono audio at its native sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

/// Mix interleaved multi-channel audio down to mono by averaging each frame
pub fn mix_to_mono(samples: &[f64], channels: usize) -> Vec<f64> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect()
}

/// Read a WAV file. Integer samples keep their raw amplitude (the link
/// normalizes by the peak), float samples are taken as-is.
pub fn read_wav(path: &Path) -> Result<Audio, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    log::info!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let interleaved: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8..=32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(AudioError::Unsupported(format!("{:?} at {} bits", format, bits)));
        }
    };

    Ok(Audio {
        samples: mix_to_mono(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

/// Write mono 16-bit PCM, saturating samples outside the i16 range
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(i16::MIN as f64, i16::MAX as f64);
        writer.write_sample(clamped as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
