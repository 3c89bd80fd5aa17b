//! # c123-model
//!
//! Reference model of the CCSDS-123 local-difference predictor stage.
//!
//! The model is a pure function of one pixel's raster position and its causal
//! neighbourhood. Every value is kept at ×4 scale so the narrow local sums
//! (`2·north`, `west + north_west`, ...) never need a fractional bit.
//!
//! Key types:
//! - [`ControlFlags`]: raster-position flags carried alongside each sample
//! - [`NeighborhoodSample`]: current sample plus its N/NE/NW/W neighbours
//! - [`PredictorOutput`]: local sum and the four local differences
//! - [`SampleFormat`]: bit depth / signedness with the inclusive sample range

pub mod local_diff;
pub mod sample;

pub use local_diff::{
    local_diff, local_sum_terms, ControlFlags, NeighborhoodSample, Orientation, OutputField,
    PredictorOutput,
};
pub use sample::{SampleFormat, SampleFormatError, SAMPLE_MAX, SAMPLE_MIN};
