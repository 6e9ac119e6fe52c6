use crate::bits::{check_group, unpack_bits};
use crate::error::{LinkError, Result};
use crate::psk::{decide_symbol, CarrierBasis, ModemConfig};
use crate::PSK_BITS_PER_SYMBOL;

/// Recovers 4-bit symbols from a received 16-PSK waveform
///
/// Implementors only estimate the (I, Q) projection of one symbol period;
/// angle estimation, sector decision and bit unpacking are shared.
pub trait Demodulator {
    fn config(&self) -> &ModemConfig;

    /// In-phase and quadrature estimates for one symbol period
    fn project(&self, segment: &[f64]) -> (f64, f64);

    fn demodulate_symbol(&self, segment: &[f64]) -> Result<u8> {
        let config = self.config();
        if segment.len() != config.samples_per_symbol() {
            return Err(LinkError::InvalidInputSize {
                stage: "demodulate symbol",
                len: segment.len(),
                group: config.samples_per_symbol(),
            });
        }

        let (i, q) = self.project(segment);
        Ok(decide_symbol(config.phase_rule.angle(i, q)))
    }

    /// Demodulate a waveform made of whole symbol periods
    fn demodulate(&self, waveform: &[f64]) -> Result<Vec<bool>> {
        let symbol_len = self.config().samples_per_symbol();
        check_group("demodulate", waveform.len(), symbol_len)?;

        let mut bits = Vec::with_capacity(waveform.len() / symbol_len * PSK_BITS_PER_SYMBOL);
        for segment in waveform.chunks(symbol_len) {
            let symbol = self.demodulate_symbol(segment)?;
            bits.extend(unpack_bits(symbol as u16, PSK_BITS_PER_SYMBOL));
        }

        log::debug!("demodulated {} symbols", waveform.len() / symbol_len);
        Ok(bits)
    }
}

/// Matched-filter demodulator: integrates the received symbol period against
/// the carrier basis over every cycle
pub struct CorrelationDemodulator {
    config: ModemConfig,
    basis: CarrierBasis,
}

impl CorrelationDemodulator {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            basis: CarrierBasis::new(config.samples_per_cycle),
            config,
        })
    }
}

impl Demodulator for CorrelationDemodulator {
    fn config(&self) -> &ModemConfig {
        &self.config
    }

    fn project(&self, segment: &[f64]) -> (f64, f64) {
        let mut r1 = 0.0;
        let mut r2 = 0.0;
        for cycle in segment.chunks(self.config.samples_per_cycle) {
            for (&sample, &(cos, neg_sin)) in cycle.iter().zip(self.basis.points()) {
                r1 += cos * sample;
                r2 += neg_sin * sample;
            }
        }
        (r1, r2)
    }
}

/// Coherent demodulator: mixes each sample with the local carrier, averages
/// the products across carrier cycles, and takes the DC level of each
/// mixed stream as its mean over the cycle.
///
/// No explicit low-pass filter is run; the mean over whole cycles is the
/// DC estimate.
pub struct CoherentDemodulator {
    config: ModemConfig,
    basis: CarrierBasis,
}

impl CoherentDemodulator {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            basis: CarrierBasis::new(config.samples_per_cycle),
            config,
        })
    }

    /// Per-position mixer outputs averaged across the cycles of one symbol
    fn mix(&self, segment: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = self.config.samples_per_cycle;
        let cycles = self.config.carrier_cycles_per_symbol as f64;
        let mut in_phase = vec![0.0; n];
        let mut quadrature = vec![0.0; n];

        for cycle in segment.chunks(n) {
            for (k, (&sample, &(cos, neg_sin))) in cycle.iter().zip(self.basis.points()).enumerate() {
                in_phase[k] += cos * sample / cycles;
                quadrature[k] += neg_sin * sample / cycles;
            }
        }
        (in_phase, quadrature)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl Demodulator for CoherentDemodulator {
    fn config(&self) -> &ModemConfig {
        &self.config
    }

    fn project(&self, segment: &[f64]) -> (f64, f64) {
        let (in_phase, quadrature) = self.mix(segment);
        (mean(&in_phase), mean(&quadrature))
    }
}

/// Run-time choice of demodulation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemodulatorKind {
    #[default]
    Correlation,
    Coherent,
}

impl DemodulatorKind {
    pub fn build(self, config: ModemConfig) -> Result<Box<dyn Demodulator>> {
        Ok(match self {
            DemodulatorKind::Correlation => Box::new(CorrelationDemodulator::new(config)?),
            DemodulatorKind::Coherent => Box::new(CoherentDemodulator::new(config)?),
        })
    }
}
