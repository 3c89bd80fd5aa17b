use anyhow::{Context, Result};
use c123_compare::{compare, export_payload, CompareOptions, Decoder, ExternalDecoder};
use c123_container::Container;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Reference container file
    #[arg(long)]
    container: PathBuf,

    /// Raw payload dump captured from the hardware
    #[arg(long)]
    hdl_payload: PathBuf,

    /// Number of uncompressed input bytes
    #[arg(long)]
    input_bytes: u64,

    /// Export the reference payload bytes here
    #[arg(long)]
    payload_output: Option<PathBuf>,

    /// Uncompressed input file; enables the round-trip check
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Reference decoder binary used for the round trip
    #[arg(long)]
    decoder: Option<PathBuf>,
}

fn run(args: &Args) -> Result<bool> {
    let container = Container::open(&args.container)
        .with_context(|| format!("read container {}", args.container.display()))?;
    info!(
        version = container.version(),
        payload_bits = container.payload().bit_len(),
        "reference container"
    );

    if let Some(path) = &args.payload_output {
        export_payload(&container, path)
            .with_context(|| format!("export payload to {}", path.display()))?;
    }

    let hardware = fs::read(&args.hdl_payload)
        .with_context(|| format!("read hardware payload {}", args.hdl_payload.display()))?;

    let mut options = CompareOptions::new(args.input_bytes);
    options.input_file = args.input_file.clone();
    let decoder = args.decoder.clone().map(ExternalDecoder::new);

    let report = compare(
        &container,
        &hardware,
        &options,
        decoder.as_ref().map(|d| d as &dyn Decoder),
    )?;
    print!("{}", report);
    Ok(report.passed())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("compare_bitstreams: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
