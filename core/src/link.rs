use crate::channel::AwgnChannel;
use crate::demodulator::{Demodulator, DemodulatorKind};
use crate::error::Result;
use crate::fec::{BlockDecoder, BlockEncoder, FecStats};
use crate::metrics::{codeword_errors, ErrorReport};
use crate::pcm;
use crate::psk::{ModemConfig, PskModulator};
use crate::DEFAULT_NOISE_AMPLITUDE;

/// Parameters of one simulated link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkConfig {
    pub modem: ModemConfig,
    pub noise_amplitude: f64,
    pub demodulator: DemodulatorKind,
    /// Seed for the channel noise; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            modem: ModemConfig::default(),
            noise_amplitude: DEFAULT_NOISE_AMPLITUDE,
            demodulator: DemodulatorKind::default(),
            seed: None,
        }
    }
}

/// Transmit side output
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub waveform: Vec<f64>,
    /// Normalization the samples were companded with
    pub scale: f64,
    /// Companded bits before error-correction coding
    pub source_bits: Vec<bool>,
}

/// Receive side output
#[derive(Debug, Clone, PartialEq)]
pub struct Reception {
    pub samples: Vec<f64>,
    /// Companded bits after error-correction decoding
    pub source_bits: Vec<bool>,
    pub fec: FecStats,
}

/// Samples -> companding -> block code -> 16-PSK waveform
pub struct Transmitter {
    fec: BlockEncoder,
    modulator: PskModulator,
}

impl Transmitter {
    pub fn new(config: ModemConfig) -> Result<Self> {
        Ok(Self {
            fec: BlockEncoder::new(),
            modulator: PskModulator::new(config)?,
        })
    }

    pub fn transmit(&self, samples: &[f64], reference_scale: Option<f64>) -> Result<Transmission> {
        let companded = pcm::encode(samples, reference_scale)?;
        let protected = self.fec.encode(&companded.bits)?;
        let waveform = self.modulator.modulate(&protected)?;

        Ok(Transmission {
            waveform,
            scale: companded.scale,
            source_bits: companded.bits,
        })
    }
}

/// 16-PSK waveform -> demodulation -> block decode -> expansion
pub struct Receiver {
    demodulator: Box<dyn Demodulator>,
    fec: BlockDecoder,
}

impl Receiver {
    pub fn new(config: ModemConfig, kind: DemodulatorKind) -> Result<Self> {
        Ok(Self {
            demodulator: kind.build(config)?,
            fec: BlockDecoder::new(),
        })
    }

    pub fn receive(&self, waveform: &[f64], scale: f64) -> Result<Reception> {
        let protected = self.demodulator.demodulate(waveform)?;
        let (source_bits, fec) = self.fec.decode_with_stats(&protected)?;
        let samples = pcm::decode(&source_bits, scale)?;

        Ok(Reception {
            samples,
            source_bits,
            fec,
        })
    }
}

/// Result of a full transmit / channel / receive run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub samples: Vec<f64>,
    pub scale: f64,
    pub fec: FecStats,
    /// Received companded stream measured against the transmitted one
    pub errors: ErrorReport,
}

/// Run samples through the whole link, including the noise channel
pub fn simulate(samples: &[f64], config: &LinkConfig) -> Result<SimulationReport> {
    let transmitter = Transmitter::new(config.modem)?;
    let receiver = Receiver::new(config.modem, config.demodulator)?;
    let mut channel = AwgnChannel::new(config.noise_amplitude, config.seed)?;

    let transmission = transmitter.transmit(samples, None)?;
    log::info!(
        "transmitting {} samples as {} waveform samples, noise amplitude {}",
        samples.len(),
        transmission.waveform.len(),
        channel.amplitude()
    );

    let noisy = channel.apply(&transmission.waveform)?;
    let reception = receiver.receive(&noisy, transmission.scale)?;
    let errors = codeword_errors(&transmission.source_bits, &reception.source_bits)?;

    log::info!(
        "{:?} demodulation: {}/{} codewords in error, {} corrected by FEC",
        config.demodulator,
        errors.codeword_errors,
        errors.codewords,
        reception.fec.corrected
    );

    Ok(SimulationReport {
        samples: reception.samples,
        scale: transmission.scale,
        fec: reception.fec,
        errors,
    })
}
