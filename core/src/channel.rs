use crate::error::{LinkError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

fn check_amplitude(amplitude: f64) -> Result<()> {
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(LinkError::InvalidConfig(format!(
            "noise amplitude must be finite and non-negative, got {}",
            amplitude
        )));
    }
    Ok(())
}

/// Add zero-mean Gaussian noise with standard deviation `amplitude`
///
/// An amplitude of zero returns the waveform unchanged and draws nothing
/// from `rng`.
pub fn add_awgn<R: Rng + ?Sized>(waveform: &[f64], amplitude: f64, rng: &mut R) -> Result<Vec<f64>> {
    check_amplitude(amplitude)?;
    if amplitude == 0.0 {
        return Ok(waveform.to_vec());
    }

    Ok(waveform
        .iter()
        .map(|&sample| {
            let noise: f64 = rng.sample(StandardNormal);
            sample + amplitude * noise
        })
        .collect())
}

/// AWGN channel owning its random source
pub struct AwgnChannel {
    amplitude: f64,
    rng: StdRng,
}

impl AwgnChannel {
    /// Seeded channels are reproducible; unseeded ones draw from OS entropy
    pub fn new(amplitude: f64, seed: Option<u64>) -> Result<Self> {
        check_amplitude(amplitude)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { amplitude, rng })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn apply(&mut self, waveform: &[f64]) -> Result<Vec<f64>> {
        add_awgn(waveform, self.amplitude, &mut self.rng)
    }
}
