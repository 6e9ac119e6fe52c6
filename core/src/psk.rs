use crate::bits::{check_group, pack_bits};
use crate::error::{LinkError, Result};
use crate::{
    DEFAULT_CARRIER_CYCLES_PER_SYMBOL, DEFAULT_SAMPLES_PER_CYCLE, MIN_RELIABLE_SAMPLES_PER_CYCLE,
    MAX_SAMPLES_PER_SYMBOL, PSK_BITS_PER_SYMBOL,
};
use std::f64::consts::PI;

// 16-PSK over a sampled passband carrier
//
// Symbol period = carrier_cycles_per_symbol identical carrier cycles of
// samples_per_cycle samples each. Sample j of a cycle uses phase
// 2*pi*j/(N-1), so the last sample of a cycle repeats the first one. The
// demodulators use the same basis; keep the two in lockstep.

/// Constellation point (I, Q) of each 4-bit symbol value
pub const PHASE_TABLE: [(f64, f64); 16] = [
    (0.9807852804032304, 0.19509032201612825),
    (0.8314696123025452, 0.5555702330196022),
    (0.5555702330196023, 0.8314696123025452),
    (0.19509032201612833, 0.9807852804032304),
    (-0.1950903220161282, 0.9807852804032304),
    (-0.555570233019602, 0.8314696123025453),
    (-0.8314696123025453, 0.5555702330196022),
    (-0.9807852804032304, 0.1950903220161286),
    (-0.9807852804032304, -0.19509032201612836),
    (-0.8314696123025455, -0.555570233019602),
    (-0.5555702330196022, -0.8314696123025452),
    (-0.19509032201612866, -0.9807852804032303),
    (0.1950903220161283, -0.9807852804032304),
    (0.5555702330196026, -0.831469612302545),
    (0.8314696123025452, -0.5555702330196022),
    (0.9807852804032303, -0.19509032201612872),
];

/// Half the angular width of a decision sector
pub const HALF_SECTOR: f64 = PI / 16.0;

/// Nominal phase of symbol `k`
pub fn sector_center(k: usize) -> f64 {
    PI * k as f64 / 8.0 + HALF_SECTOR
}

/// How the received (I, Q) correlation is turned into an angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseRule {
    /// atan(q/i), plus pi when i < 0, else plus 2*pi when q < 0
    #[default]
    AtanCorrected,
    /// atan2(q, i) folded into [0, 2*pi)
    FourQuadrant,
}

impl PhaseRule {
    pub fn angle(self, i: f64, q: f64) -> f64 {
        match self {
            PhaseRule::AtanCorrected => {
                let mut angle = (q / i).atan();
                if i < 0.0 {
                    angle += PI;
                } else if q < 0.0 {
                    angle += 2.0 * PI;
                }
                angle
            }
            PhaseRule::FourQuadrant => {
                let angle = q.atan2(i);
                if angle < 0.0 {
                    angle + 2.0 * PI
                } else {
                    angle
                }
            }
        }
    }
}

/// Map an angle to a symbol: first sector (ascending) whose closed
/// interval contains it. An angle in no sector (NaN) decides symbol 0.
pub fn decide_symbol(angle: f64) -> u8 {
    (0..16)
        .find(|&k| {
            let center = sector_center(k);
            center - HALF_SECTOR <= angle && angle <= center + HALF_SECTOR
        })
        .unwrap_or(0) as u8
}

/// Sampled (cos, -sin) reference for one carrier cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierBasis {
    points: Vec<(f64, f64)>,
}

impl CarrierBasis {
    pub fn new(samples_per_cycle: usize) -> Self {
        let denominator = samples_per_cycle.saturating_sub(1) as f64;
        let points = (0..samples_per_cycle)
            .map(|j| {
                let phase = 2.0 * PI * j as f64 / denominator;
                (phase.cos(), -phase.sin())
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

/// Waveform shape parameters shared by modulator and demodulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModemConfig {
    pub carrier_cycles_per_symbol: usize,
    pub samples_per_cycle: usize,
    pub phase_rule: PhaseRule,
}

impl ModemConfig {
    pub fn new(carrier_cycles_per_symbol: usize, samples_per_cycle: usize) -> Result<Self> {
        let config = Self {
            carrier_cycles_per_symbol,
            samples_per_cycle,
            phase_rule: PhaseRule::AtanCorrected,
        };
        config.validate()?;
        Ok(config)
    }

    /// Derive the cycles per symbol from a carrier frequency and symbol rate
    pub fn from_rates(carrier_freq: f64, symbol_rate: f64, samples_per_cycle: usize) -> Result<Self> {
        let ratio = carrier_freq / symbol_rate;
        if !ratio.is_finite() || ratio < 1.0 || ratio.fract() != 0.0 {
            return Err(LinkError::InvalidConfig(format!(
                "carrier/symbol rate ratio must be a positive integer, got {}/{}",
                carrier_freq, symbol_rate
            )));
        }
        Self::new(ratio as usize, samples_per_cycle)
    }

    pub fn with_phase_rule(mut self, phase_rule: PhaseRule) -> Self {
        self.phase_rule = phase_rule;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.carrier_cycles_per_symbol == 0 {
            return Err(LinkError::InvalidConfig(
                "carrier cycles per symbol must be > 0".to_string(),
            ));
        }
        if self.samples_per_cycle < 2 {
            return Err(LinkError::InvalidConfig(
                "samples per carrier cycle must be >= 2".to_string(),
            ));
        }
        match self
            .carrier_cycles_per_symbol
            .checked_mul(self.samples_per_cycle)
        {
            Some(len) if len <= MAX_SAMPLES_PER_SYMBOL => {}
            _ => {
                return Err(LinkError::InvalidConfig(format!(
                    "symbol period too long: {} cycles of {} samples (max {} samples)",
                    self.carrier_cycles_per_symbol, self.samples_per_cycle, MAX_SAMPLES_PER_SYMBOL
                )));
            }
        }
        if self.samples_per_cycle < MIN_RELIABLE_SAMPLES_PER_CYCLE {
            log::warn!(
                "{} samples per carrier cycle: some phases mis-decide even without noise",
                self.samples_per_cycle
            );
        }
        Ok(())
    }

    /// Samples in one symbol period
    pub fn samples_per_symbol(&self) -> usize {
        self.carrier_cycles_per_symbol
            .saturating_mul(self.samples_per_cycle)
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            carrier_cycles_per_symbol: DEFAULT_CARRIER_CYCLES_PER_SYMBOL,
            samples_per_cycle: DEFAULT_SAMPLES_PER_CYCLE,
            phase_rule: PhaseRule::AtanCorrected,
        }
    }
}

/// 16-PSK modulator: 4 bits -> one symbol period of carrier
pub struct PskModulator {
    config: ModemConfig,
    basis: CarrierBasis,
}

impl PskModulator {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            basis: CarrierBasis::new(config.samples_per_cycle),
            config,
        })
    }

    /// Waveform for one 4-bit symbol value (0-15)
    pub fn modulate_symbol(&self, value: u8) -> Result<Vec<f64>> {
        let (a, b) = *PHASE_TABLE
            .get(value as usize)
            .ok_or_else(|| LinkError::InvalidConfig(format!("symbol value {} out of range", value)))?;

        let cycle: Vec<f64> = self
            .basis
            .points()
            .iter()
            .map(|&(cos, neg_sin)| a * cos + b * neg_sin)
            .collect();

        let mut samples = Vec::with_capacity(self.config.samples_per_symbol());
        for _ in 0..self.config.carrier_cycles_per_symbol {
            samples.extend_from_slice(&cycle);
        }
        Ok(samples)
    }

    /// Modulate a bit stream whose length is a multiple of 4
    pub fn modulate(&self, bits: &[bool]) -> Result<Vec<f64>> {
        check_group("modulate", bits.len(), PSK_BITS_PER_SYMBOL)?;

        let symbols = bits.len() / PSK_BITS_PER_SYMBOL;
        let mut samples = Vec::with_capacity(symbols * self.config.samples_per_symbol());
        for chunk in bits.chunks(PSK_BITS_PER_SYMBOL) {
            samples.extend(self.modulate_symbol(pack_bits(chunk) as u8)?);
        }

        log::debug!("modulated {} symbols into {} samples", symbols, samples.len());
        Ok(samples)
    }
}
