//! # c123-vectors
//!
//! Test vector corpus shared by the reference model, the hardware harness and
//! any other consumer that needs `(inputs, expected outputs)` pairs.
//!
//! - [`generate`]: seeded random vectors for both orientations
//! - [`Corpus`]: CSV read/write and the self-check against the model
//! - [`SimulationConfig`]: the simulation JSON that fixes the sample format

pub mod config;
pub mod corpus;
pub mod generator;

pub use config::SimulationConfig;
pub use corpus::{Corpus, RowMismatch, Vector, COLUMNS};
pub use generator::{generate, GeneratorConfig, DEFAULT_CASES, DEFAULT_SEED};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Vector source not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corpus header is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sample format error: {0}")]
    Format(#[from] c123_model::SampleFormatError),
}
