//! # c123-container
//!
//! Reader and writer for the self-describing `C123` container produced by the
//! reference encoder: a fixed little-endian header followed by a compressed
//! payload whose length is given in bits.
//!
//! Two header versions exist. The version is read first (u16 at offset 4) and
//! selects the layout; see [`LAYOUTS`].
//!
//! | version | header bytes | payload_bits offset |
//! |---|---|---|
//! | 2 | 30 | 18 |
//! | 3 | 46 | 38 |

pub mod container;
pub mod header;

pub use container::{Container, Payload};
pub use header::{
    layout_for, CoderParams, ContainerHeader, HeaderV2, HeaderV3, VersionLayout,
    FLAG_COLUMN_ORIENTED, FLAG_REDUCED, LAYOUTS, MAGIC, MIN_HEADER_SIZE,
};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Container is too small ({len} bytes, smallest header is {needed})")]
    Truncated { len: usize, needed: usize },
    #[error("Container has invalid magic {0:02X?}")]
    BadMagic([u8; 4]),
    #[error("Container has unsupported version {0}")]
    UnsupportedVersion(u16),
    #[error("Container is too small for version {version} header ({len} < {needed})")]
    HeaderTruncated {
        version: u16,
        len: usize,
        needed: usize,
    },
    #[error("Container payload truncated: expected {expected} bytes, got {actual}")]
    PayloadTruncated { expected: u64, actual: usize },
}

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
