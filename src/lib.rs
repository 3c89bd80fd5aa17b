//! # c123-oracle
//!
//! Differential-conformance oracle for a hardware implementation of a
//! CCSDS-123 style hyperspectral compressor.
//!
//! Two loops share this workspace:
//! - **vector loop**: [`model`] defines the local-difference stage,
//!   [`vectors`] turns it into a seeded CSV corpus and [`harness`] replays
//!   that corpus against a clocked device with unknown latency;
//! - **bitstream loop**: [`container`] parses reference `C123` files and
//!   [`compare`] checks a hardware payload against them, optionally through
//!   the reference decoder.

pub use c123_compare as compare;
pub use c123_container as container;
pub use c123_harness as harness;
pub use c123_model as model;
pub use c123_vectors as vectors;
