use crate::device::{ClockedDevice, InputPort, OutputPort};
use c123_model::{local_diff, Orientation, OutputField, PredictorOutput};
use std::collections::{BTreeSet, VecDeque};

/// Deliberate defect injected into a [`LatencyPipeline`].
///
/// `index` counts accepted input beats from zero, reset excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Add `delta` to one output field.
    Corrupt {
        index: usize,
        field: OutputField,
        delta: i64,
    },
    /// Swallow the output entirely.
    Drop { index: usize },
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ready_at: u64,
    output: PredictorOutput,
}

/// Behavioural model of the hardware local-difference stage.
///
/// Computes the reference model on every valid input and releases the result
/// `latency` edges later, at most one output per edge and always in order.
/// Stall edges hold the output stage, so the effective latency of everything
/// behind a stall grows.
#[derive(Debug, Clone)]
pub struct LatencyPipeline {
    orientation: Orientation,
    latency: u64,
    in_flight: VecDeque<InFlight>,
    stalls: BTreeSet<u64>,
    faults: Vec<Fault>,
    in_reset: bool,
    edge: u64,
    accepted: usize,
}

impl LatencyPipeline {
    pub fn new(orientation: Orientation, latency: u64) -> Self {
        Self {
            orientation,
            latency,
            in_flight: VecDeque::new(),
            stalls: BTreeSet::new(),
            faults: Vec::new(),
            in_reset: false,
            edge: 0,
            accepted: 0,
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Hold the output stage on the given absolute edge indices.
    pub fn with_stalls<I: IntoIterator<Item = u64>>(mut self, edges: I) -> Self {
        self.stalls.extend(edges);
        self
    }

    pub fn latency(&self) -> u64 {
        self.latency
    }

    /// Outputs computed but not yet presented.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn apply_faults(&self, index: usize, mut output: PredictorOutput) -> Option<PredictorOutput> {
        for fault in &self.faults {
            match *fault {
                Fault::Corrupt {
                    index: at,
                    field,
                    delta,
                } if at == index => *output.get_mut(field) += i128::from(delta),
                Fault::Drop { index: at } if at == index => return None,
                _ => {}
            }
        }
        Some(output)
    }
}

impl ClockedDevice for LatencyPipeline {
    fn set_reset(&mut self, asserted: bool) {
        self.in_reset = asserted;
        if asserted {
            self.in_flight.clear();
            self.accepted = 0;
        }
    }

    fn clock_edge(&mut self, input: &InputPort) -> OutputPort {
        let edge = self.edge;
        self.edge += 1;
        if self.in_reset {
            return OutputPort::idle();
        }

        if input.valid {
            let index = self.accepted;
            self.accepted += 1;
            let computed = local_diff(input.flags, input.sample, self.orientation);
            if let Some(output) = self.apply_faults(index, computed) {
                self.in_flight.push_back(InFlight {
                    ready_at: edge + self.latency,
                    output,
                });
            }
        }

        if self.stalls.contains(&edge) {
            return OutputPort::idle();
        }
        match self.in_flight.front() {
            Some(head) if head.ready_at <= edge => {
                let head = *head;
                self.in_flight.pop_front();
                OutputPort::valid(head.output)
            }
            _ => OutputPort::idle(),
        }
    }
}
