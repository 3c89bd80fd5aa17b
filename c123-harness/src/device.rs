use c123_model::{ControlFlags, NeighborhoodSample, PredictorOutput};
use c123_vectors::Vector;

/// Signals the harness drives into the device for one clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputPort {
    pub valid: bool,
    pub flags: ControlFlags,
    pub sample: NeighborhoodSample,
}

impl InputPort {
    /// Valid deasserted, all samples zero.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn drive(vector: &Vector) -> Self {
        Self {
            valid: true,
            flags: vector.flags,
            sample: vector.sample,
        }
    }
}

/// Signals sampled from the device after a clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputPort {
    pub valid: bool,
    pub output: PredictorOutput,
}

impl OutputPort {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn valid(output: PredictorOutput) -> Self {
        Self {
            valid: true,
            output,
        }
    }
}

/// A clocked implementation of the local-difference stage.
///
/// The harness owns the clock: each call to [`clock_edge`](Self::clock_edge)
/// is one rising edge with `input` held on the ports, and the returned value
/// is what the device presents once that edge has been processed.
pub trait ClockedDevice {
    /// Drive the (active) reset line.
    fn set_reset(&mut self, asserted: bool);

    fn clock_edge(&mut self, input: &InputPort) -> OutputPort;
}

impl<D: ClockedDevice + ?Sized> ClockedDevice for &mut D {
    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted)
    }

    fn clock_edge(&mut self, input: &InputPort) -> OutputPort {
        (**self).clock_edge(input)
    }
}
