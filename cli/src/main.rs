mod audio;

use clap::{Parser, Subcommand, ValueEnum};
use psk16link_core::{
    codeword_errors, pcm, simulate, DemodulatorKind, ErrorReport, LinkConfig, ModemConfig,
    PhaseRule, DEFAULT_CARRIER_CYCLES_PER_SYMBOL, DEFAULT_NOISE_AMPLITUDE,
    DEFAULT_SAMPLES_PER_CYCLE,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "psk16link")]
#[command(about = "Simulated PCM / (12,8) FEC / 16-PSK / AWGN voice link")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a WAV file through the simulated link and write what comes out
    Simulate {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Reconstructed WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Receiver strategy
        #[arg(short, long, value_enum, default_value_t = DemodulatorArg::Correlation)]
        demodulator: DemodulatorArg,

        /// Standard deviation of the channel noise
        #[arg(short, long, default_value_t = DEFAULT_NOISE_AMPLITUDE)]
        noise: f64,

        /// Carrier cycles per symbol (carrier frequency / symbol rate)
        #[arg(long, default_value_t = DEFAULT_CARRIER_CYCLES_PER_SYMBOL)]
        carrier_cycles: usize,

        /// Samples per carrier cycle
        #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_CYCLE)]
        samples_per_cycle: usize,

        /// Angle estimation rule
        #[arg(long, value_enum, default_value_t = PhaseRuleArg::AtanCorrected)]
        phase_rule: PhaseRuleArg,

        /// Seed for reproducible channel noise
        #[arg(long)]
        seed: Option<u64>,

        /// Write codeword error count, rate and time cost to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Print a JSON summary on stdout
        #[arg(long)]
        json: bool,
    },

    /// Compare a reconstructed WAV file with the original, codeword by codeword
    Compare {
        /// Original WAV file
        #[arg(value_name = "ORIGINAL.WAV")]
        original: PathBuf,

        /// Reconstructed WAV file
        #[arg(value_name = "RECONSTRUCTED.WAV")]
        reconstructed: PathBuf,

        /// Write codeword error count and rate to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Print a JSON summary on stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DemodulatorArg {
    Correlation,
    Coherent,
}

impl From<DemodulatorArg> for DemodulatorKind {
    fn from(arg: DemodulatorArg) -> Self {
        match arg {
            DemodulatorArg::Correlation => DemodulatorKind::Correlation,
            DemodulatorArg::Coherent => DemodulatorKind::Coherent,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PhaseRuleArg {
    AtanCorrected,
    FourQuadrant,
}

impl From<PhaseRuleArg> for PhaseRule {
    fn from(arg: PhaseRuleArg) -> Self {
        match arg {
            PhaseRuleArg::AtanCorrected => PhaseRule::AtanCorrected,
            PhaseRuleArg::FourQuadrant => PhaseRule::FourQuadrant,
        }
    }
}

#[derive(Serialize)]
struct Summary {
    samples: usize,
    codewords: usize,
    codeword_errors: usize,
    codeword_error_rate: f64,
    bit_error_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    fec_corrected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_secs: Option<f64>,
}

impl Summary {
    fn new(samples: usize, errors: &ErrorReport) -> Self {
        Self {
            samples,
            codewords: errors.codewords,
            codeword_errors: errors.codeword_errors,
            codeword_error_rate: errors.codeword_error_rate(),
            bit_error_rate: errors.bit_error_rate(),
            fec_corrected: None,
            elapsed_secs: None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            input,
            output,
            demodulator,
            noise,
            carrier_cycles,
            samples_per_cycle,
            phase_rule,
            seed,
            report,
            json,
        } => {
            let modem = ModemConfig::new(carrier_cycles, samples_per_cycle)?
                .with_phase_rule(phase_rule.into());
            let config = LinkConfig {
                modem,
                noise_amplitude: noise,
                demodulator: demodulator.into(),
                seed,
            };
            simulate_command(&input, &output, &config, report.as_deref(), json)?
        }
        Commands::Compare {
            original,
            reconstructed,
            report,
            json,
        } => compare_command(&original, &reconstructed, report.as_deref(), json)?,
    }

    Ok(())
}

fn write_report(path: &Path, errors: &ErrorReport, elapsed: Option<Duration>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    errors.write_plain(&mut writer, elapsed)?;
    log::info!("Wrote report to {}", path.display());
    Ok(())
}

fn simulate_command(
    input_path: &Path,
    output_path: &Path,
    config: &LinkConfig,
    report_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let input = audio::read_wav(input_path)?;
    log::info!("Extracted {} samples from {}", input.samples.len(), input_path.display());

    let result = simulate(&input.samples, config)?;
    audio::write_wav(output_path, &result.samples, input.sample_rate)?;
    log::info!(
        "Wrote {} samples to {}",
        result.samples.len(),
        output_path.display()
    );

    let elapsed = start.elapsed();
    log::info!(
        "Codeword errors: {} ({:.6}), {} codewords corrected by FEC, {:.3}s",
        result.errors.codeword_errors,
        result.errors.codeword_error_rate(),
        result.fec.corrected,
        elapsed.as_secs_f64()
    );

    if let Some(path) = report_path {
        write_report(path, &result.errors, Some(elapsed))?;
    }

    if json {
        let mut summary = Summary::new(input.samples.len(), &result.errors);
        summary.fec_corrected = Some(result.fec.corrected);
        summary.elapsed_secs = Some(elapsed.as_secs_f64());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn compare_command(
    original_path: &Path,
    reconstructed_path: &Path,
    report_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let original = audio::read_wav(original_path)?;
    let reconstructed = audio::read_wav(reconstructed_path)?;

    let reference = pcm::encode(&original.samples, None)?;
    let received = pcm::encode(&reconstructed.samples, Some(reference.scale))?;
    let errors = codeword_errors(&reference.bits, &received.bits)?;

    log::info!(
        "Codeword errors: {} of {} ({:.6})",
        errors.codeword_errors,
        errors.codewords,
        errors.codeword_error_rate()
    );

    if let Some(path) = report_path {
        write_report(path, &errors, None)?;
    }

    if json {
        let summary = Summary::new(original.samples.len(), &errors);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
