use crate::bits::{check_group, pack_bits, unpack_bits};
use crate::error::{LinkError, Result};
use crate::{PCM_BITS_PER_SAMPLE, PCM_FULL_SCALE};

// 13-segment style logarithmic companding
//
// Samples are normalized to +/-4096 units, then coded as:
// - 1 sign bit (1 = strictly positive)
// - 3 segment bits selecting one of 8 exponential ranges
// - 4 step bits giving the linear position inside the segment
//
// Decoding reconstructs the midpoint of the selected quantization interval.

/// Lower edge of each segment in normalized units
pub const SEGMENT_STARTS: [f64; 8] = [0.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0];

/// Quantization step inside each segment in normalized units
pub const SEGMENT_STEPS: [f64; 8] = [2.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];

const MAX_STEP_INDEX: u8 = 15;

/// One companded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmCodeword {
    pub positive: bool,
    pub segment: u8,
    pub step: u8,
}

impl PcmCodeword {
    pub fn to_byte(self) -> u8 {
        ((self.positive as u8) << 7) | (self.segment << 4) | self.step
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            positive: byte & 0x80 != 0,
            segment: (byte >> 4) & 0x07,
            step: byte & 0x0F,
        }
    }
}

/// Output of [`encode`]: the codeword stream and the scale it was normalized by
#[derive(Debug, Clone, PartialEq)]
pub struct PcmEncoded {
    pub bits: Vec<bool>,
    pub scale: f64,
}

/// Segment containing a magnitude given in normalized units
pub fn segment_of(units: f64) -> usize {
    SEGMENT_STARTS
        .iter()
        .rposition(|&start| units >= start)
        .unwrap_or(0)
}

/// Quantization step of a segment in normalized units
pub fn step_size(segment: usize) -> f64 {
    SEGMENT_STEPS[segment]
}

/// Compand one sample already normalized to +/-4096 units
pub fn encode_sample(units: f64) -> PcmCodeword {
    let magnitude = units.abs();
    let segment = segment_of(magnitude);
    let offset = (magnitude - SEGMENT_STARTS[segment]) / SEGMENT_STEPS[segment];
    // Truncation toward zero; values past full scale saturate
    let step = (offset as u64).min(MAX_STEP_INDEX as u64) as u8;

    PcmCodeword {
        positive: units > 0.0,
        segment: segment as u8,
        step,
    }
}

/// Expand one codeword back to normalized units (interval midpoint)
pub fn decode_codeword(codeword: PcmCodeword) -> f64 {
    let segment = codeword.segment as usize;
    let step = SEGMENT_STEPS[segment];
    let magnitude = SEGMENT_STARTS[segment] + codeword.step as f64 * step + 0.5 * step;
    if codeword.positive {
        magnitude
    } else {
        -magnitude
    }
}

/// Largest absolute sample, rejecting NaN/Inf
pub fn peak_amplitude(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(LinkError::EmptyInput);
    }
    let mut peak = 0.0f64;
    for (index, &sample) in samples.iter().enumerate() {
        if !sample.is_finite() {
            return Err(LinkError::NonFiniteSample { index });
        }
        peak = peak.max(sample.abs());
    }
    Ok(peak)
}

/// Compand a sample sequence into 8 bits per sample
///
/// With no `reference_scale` the peak absolute sample is used, so the loudest
/// sample lands at full scale. Passing the scale of a previous encode lets a
/// second sequence (e.g. a reconstruction) be coded against the same
/// normalization for codeword-by-codeword comparison.
pub fn encode(samples: &[f64], reference_scale: Option<f64>) -> Result<PcmEncoded> {
    let scale = match reference_scale {
        Some(scale) => {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(LinkError::InvalidConfig(format!(
                    "reference scale must be finite and positive, got {}",
                    scale
                )));
            }
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                return Err(LinkError::NonFiniteSample { index });
            }
            scale
        }
        None => peak_amplitude(samples)?,
    };

    // An all-silent input has zero scale; every sample is then 0 units
    let gain = if scale > 0.0 { PCM_FULL_SCALE / scale } else { 0.0 };

    let mut bits = Vec::with_capacity(samples.len() * PCM_BITS_PER_SAMPLE);
    for &sample in samples {
        let codeword = encode_sample(sample * gain);
        bits.extend(unpack_bits(codeword.to_byte() as u16, PCM_BITS_PER_SAMPLE));
    }

    log::debug!("companded {} samples at scale {}", samples.len(), scale);
    Ok(PcmEncoded { bits, scale })
}

/// Expand a codeword stream back into samples at the given scale
pub fn decode(bits: &[bool], scale: f64) -> Result<Vec<f64>> {
    check_group("companding decode", bits.len(), PCM_BITS_PER_SAMPLE)?;
    if !scale.is_finite() || scale < 0.0 {
        return Err(LinkError::InvalidConfig(format!(
            "decode scale must be finite and non-negative, got {}",
            scale
        )));
    }

    Ok(bits
        .chunks(PCM_BITS_PER_SAMPLE)
        .map(|chunk| {
            let codeword = PcmCodeword::from_byte(pack_bits(chunk) as u8);
            decode_codeword(codeword) / PCM_FULL_SCALE * scale
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::bits_from_u8;

    #[test]
    fn test_segment_boundaries() {
        assert_eq!(segment_of(0.0), 0);
        assert_eq!(segment_of(31.999), 0);
        assert_eq!(segment_of(32.0), 1);
        assert_eq!(segment_of(127.0), 2);
        assert_eq!(segment_of(2047.9), 6);
        assert_eq!(segment_of(2048.0), 7);
        assert_eq!(segment_of(9000.0), 7);
    }

    #[test]
    fn test_encode_sample_layout() {
        // 1352/169646*4096 ~= 32.64 units: segment 1, step 0
        let codeword = encode_sample(1352.0 / 169646.0 * 4096.0);
        assert_eq!(
            codeword,
            PcmCodeword {
                positive: true,
                segment: 1,
                step: 0
            }
        );
        assert_eq!(codeword.to_byte(), 0b1001_0000);

        // Full scale saturates at the last step of the last segment
        let peak = encode_sample(4096.0);
        assert_eq!((peak.segment, peak.step), (7, 15));
        let negative = encode_sample(-100.0);
        assert_eq!((negative.positive, negative.segment, negative.step), (false, 2, 9));
    }

    #[test]
    fn test_zero_encodes_as_negative_smallest_level() {
        let codeword = encode_sample(0.0);
        assert_eq!(codeword.to_byte(), 0);
        assert_eq!(decode_codeword(codeword), -1.0);
    }

    #[test]
    fn test_codeword_byte_roundtrip() {
        for byte in 0u8..=255 {
            assert_eq!(PcmCodeword::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_reference_vector() {
        let samples = [169646.0, 1352.0, 321.0, -0.74, 1.0, 0.0, -2.0];
        let encoded = encode(&samples, None).unwrap();
        assert_eq!(encoded.scale, 169646.0);
        assert_eq!(encoded.bits.len(), 56);
        assert_eq!(
            &encoded.bits[..24],
            &bits_from_u8(&[
                1, 1, 1, 1, 1, 1, 1, 1, // full scale
                1, 0, 0, 1, 0, 0, 0, 0, // segment 1, step 0
                1, 0, 0, 0, 0, 0, 1, 1, // segment 0, step 3
            ])[..]
        );

        let decoded = decode(&encoded.bits, encoded.scale).unwrap();
        let expected = [166995.28125, 1366.77685546875, 289.92236328125, -41.41748046875];
        for (got, want) in decoded.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_quantization_error_is_half_step() {
        let scale = 1.0;
        let samples: Vec<f64> = (-2000..=2000).map(|i| i as f64 / 2000.0).collect();
        let encoded = encode(&samples, Some(scale)).unwrap();
        let decoded = decode(&encoded.bits, scale).unwrap();

        for (&original, &restored) in samples.iter().zip(decoded.iter()) {
            let units = original.abs() * PCM_FULL_SCALE;
            let bound = 0.5 * step_size(segment_of(units)) / PCM_FULL_SCALE * scale;
            assert!(
                (restored - original).abs() <= bound + 1e-12,
                "sample {} restored {} bound {}",
                original,
                restored,
                bound
            );
        }
    }

    #[test]
    fn test_reference_scale_is_shared() {
        let original = [0.5, -0.25, 1.0];
        let first = encode(&original, None).unwrap();
        let second = encode(&[0.25], Some(first.scale)).unwrap();
        assert_eq!(second.scale, 1.0);
        assert_eq!(
            PcmCodeword::from_byte(pack_bits(&second.bits) as u8),
            encode_sample(0.25 * PCM_FULL_SCALE)
        );
    }

    #[test]
    fn test_silence_has_zero_scale() {
        let encoded = encode(&[0.0, 0.0], None).unwrap();
        assert_eq!(encoded.scale, 0.0);
        assert_eq!(decode(&encoded.bits, encoded.scale).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(encode(&[], None), Err(LinkError::EmptyInput));
        assert_eq!(
            encode(&[1.0, f64::NAN], None),
            Err(LinkError::NonFiniteSample { index: 1 })
        );
        assert_eq!(
            encode(&[f64::INFINITY], Some(1.0)),
            Err(LinkError::NonFiniteSample { index: 0 })
        );
        assert!(matches!(
            encode(&[1.0], Some(0.0)),
            Err(LinkError::InvalidConfig(_))
        ));
        assert!(matches!(
            decode(&[true; 7], 1.0),
            Err(LinkError::InvalidInputSize { group: 8, .. })
        ));
        assert_eq!(encode(&[], Some(2.0)).unwrap().bits, Vec::<bool>::new());
    }
}
