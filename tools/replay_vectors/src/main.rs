use anyhow::{Context, Result};
use c123_harness::{Harness, HarnessConfig, LatencyPipeline};
use c123_model::Orientation;
use c123_vectors::Corpus;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vector CSV produced by gen_vectors
    vectors: PathBuf,

    /// Replay the column-oriented half of the corpus
    #[arg(long)]
    column_oriented: bool,

    /// Pipeline latency in clock edges
    #[arg(long, default_value_t = 2)]
    latency: u64,

    /// Edges held in reset before streaming
    #[arg(long, default_value_t = 3)]
    reset_cycles: usize,

    /// Edges clocked after the last vector
    #[arg(long, default_value_t = 5)]
    drain_cycles: usize,
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
    let orientation = Orientation::from_column_flag(args.column_oriented);

    let corpus = Corpus::load(&args.vectors)
        .with_context(|| format!("load vectors {}", args.vectors.display()))?;
    info!(vectors = corpus.len(), %orientation, "corpus loaded");

    let config = HarnessConfig {
        orientation,
        reset_cycles: args.reset_cycles,
        drain_cycles: args.drain_cycles,
    };
    let mut device = LatencyPipeline::new(orientation, args.latency);
    let mut harness = Harness::new(config);
    let report = harness
        .run(&mut device, &corpus)
        .with_context(|| format!("{} replay failed", orientation))?;

    println!(
        "{}: {} vectors checked in {} cycles (max latency {}, {} unexpected output(s))",
        orientation,
        report.outputs_checked,
        report.cycles,
        report.max_latency,
        report.unexpected_outputs
    );
    Ok(())
}
