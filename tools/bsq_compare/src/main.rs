use anyhow::{Context, Result};
use c123_compare::bsq::{compare_sequences, read_bsq};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    nx: usize,

    #[arg(long)]
    ny: usize,

    #[arg(long)]
    nz: usize,

    /// Reference BSQ image
    #[arg(long)]
    reference: PathBuf,

    /// Hardware reconstructed BSQ image
    #[arg(long)]
    hdl_recon: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let reference = read_bsq(&args.reference, args.nx, args.ny, args.nz)
        .with_context(|| format!("read reference {}", args.reference.display()))?;
    info!(samples = reference.len(), "reference image read");

    let Some(recon_path) = &args.hdl_recon else {
        println!("No hardware reconstruction provided; only reference data read");
        return Ok(ExitCode::SUCCESS);
    };

    let recon = read_bsq(recon_path, args.nx, args.ny, args.nz)
        .with_context(|| format!("read reconstruction {}", recon_path.display()))?;
    let comparison = compare_sequences("reconstructed", &reference, &recon);
    println!("{}", comparison);

    Ok(if comparison.matches() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
