//! # c123-compare
//!
//! Checks a hardware-produced payload against the payload of a reference
//! container and explains any disagreement precisely enough to debug from.
//!
//! Every check runs regardless of earlier failures:
//! length, byte diff, bit diff (MSB first, up to the declared bit length),
//! padding policy, compression ratio and, optionally, a lossless round trip
//! through the external reference decoder.
//!
//! - [`compare_payloads`] / [`compare`]: build a [`ComparisonReport`]
//! - [`Decoder`] / [`ExternalDecoder`]: round-trip seam
//! - [`hexdump::format_slice`]: offset / hex / ASCII dump used in every window
//! - [`bsq`]: sample-level comparison of BSQ image dumps

pub mod bits;
pub mod bsq;
pub mod hexdump;
pub mod payload;
pub mod report;
pub mod roundtrip;

pub use payload::{
    compare, compare_payloads, export_payload, CompareOptions, DEBUG_BYTES, MISMATCH_LIMIT,
};
pub use report::{
    BitDiff, BitMismatch, ByteDiff, ByteMismatch, ComparisonReport, Finding, LengthCheck,
    PaddingCheck, Window,
};
pub use roundtrip::{
    verify_round_trip, Decoder, ExternalDecoder, RoundTripError, RoundTripOutcome, SideOutcome,
    StreamComparison,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Container error: {0}")]
    Container(#[from] c123_container::ContainerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("BSQ dimensions {nx}x{ny}x{nz} are too large to address")]
    BsqDimensions { nx: usize, ny: usize, nz: usize },
    #[error(
        "Unexpected BSQ size for {}: {actual} bytes, expected {expected}",
        .path.display()
    )]
    BsqSize {
        path: PathBuf,
        actual: usize,
        expected: usize,
    },
}
