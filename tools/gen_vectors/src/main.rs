use anyhow::{bail, Context, Result};
use c123_vectors::{generate, GeneratorConfig, SimulationConfig, DEFAULT_CASES, DEFAULT_SEED};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Simulation config JSON (reads parameters.D and images[0].signed)
    config: PathBuf,

    /// Destination CSV
    output: PathBuf,

    /// Vectors per orientation
    #[arg(long, default_value_t = DEFAULT_CASES)]
    cases: usize,

    /// RNG seed, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_seed, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn parse_seed(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid seed '{}': {}", text, e))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = SimulationConfig::load(&args.config)
        .with_context(|| format!("load simulation config {}", args.config.display()))?;
    let format = config.sample_format().context("derive sample format")?;
    info!(depth = format.depth, signed = format.signed, "sample format");

    let generator = GeneratorConfig::new(format)
        .with_cases(args.cases)
        .with_seed(args.seed);
    let corpus = generate(&generator);

    let mismatches = corpus.verify();
    if !mismatches.is_empty() {
        bail!("generated corpus disagrees with the model in {} row(s)", mismatches.len());
    }

    corpus
        .save(&args.output)
        .with_context(|| format!("write {}", args.output.display()))?;
    println!("Wrote {} vectors to {}", corpus.len(), args.output.display());
    Ok(())
}
