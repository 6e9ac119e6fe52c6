//! Simulated digital voice link
//!
//! Companded PCM source coding, a (12,8) block code, 16-PSK over a sampled
//! carrier, an AWGN channel, and correlation or coherent demodulation.

pub mod bits;
pub mod channel;
pub mod demodulator;
pub mod error;
pub mod fec;
pub mod link;
pub mod metrics;
pub mod pcm;
pub mod psk;

pub use channel::{add_awgn, AwgnChannel};
pub use demodulator::{CoherentDemodulator, CorrelationDemodulator, Demodulator, DemodulatorKind};
pub use error::{LinkError, Result};
pub use fec::{BlockDecoder, BlockEncoder, Correction, FecStats};
pub use link::{simulate, LinkConfig, Receiver, Reception, SimulationReport, Transmission, Transmitter};
pub use metrics::{bit_errors, codeword_errors, ErrorReport};
pub use pcm::PcmEncoded;
pub use psk::{ModemConfig, PhaseRule, PskModulator};

// Group sizes
pub const PCM_BITS_PER_SAMPLE: usize = 8;
pub const FEC_INFO_BITS: usize = 8;
pub const FEC_CODE_BITS: usize = 12;
pub const PSK_BITS_PER_SYMBOL: usize = 4;

// Companding
pub const PCM_FULL_SCALE: f64 = 4096.0;

// Waveform defaults (10 samples per carrier cycle, 10 cycles per symbol)
pub const DEFAULT_CARRIER_CYCLES_PER_SYMBOL: usize = 10;
pub const DEFAULT_SAMPLES_PER_CYCLE: usize = 10;
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 0.3;

/// Below this many samples per carrier cycle some phases mis-decide even on a
/// clean channel
pub const MIN_RELIABLE_SAMPLES_PER_CYCLE: usize = 6;

/// Longest accepted symbol period in samples
pub const MAX_SAMPLES_PER_SYMBOL: usize = 1 << 24;
