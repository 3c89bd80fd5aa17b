//! # c123-harness
//!
//! Replays a vector corpus against a clocked device-under-test and reconciles
//! what comes out against the stored expectations.
//!
//! The device's latency is unknown and may vary, so every submitted vector is
//! queued and matched, strictly first-in first-out, against the next output
//! the device marks valid.
//!
//! Key types:
//! - [`ClockedDevice`]: one call per rising clock edge
//! - [`Harness`]: the `Resetting → Streaming → Draining → Done` state machine
//! - [`LatencyPipeline`]: behavioural stand-in for the hardware stage

pub mod device;
pub mod harness;
pub mod pipeline;

pub use device::{ClockedDevice, InputPort, OutputPort};
pub use harness::{
    FieldMismatch, Harness, HarnessConfig, HarnessError, HarnessReport, HarnessState,
};
pub use pipeline::{Fault, LatencyPipeline};
