use crate::device::{ClockedDevice, InputPort, OutputPort};
use c123_model::{local_diff, Orientation, OutputField, PredictorOutput};
use c123_vectors::{Corpus, Vector};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_RESET_CYCLES: usize = 3;
pub const DEFAULT_DRAIN_CYCLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Only corpus vectors of this orientation are replayed.
    pub orientation: Orientation,
    /// Edges spent with reset asserted before streaming starts.
    pub reset_cycles: usize,
    /// Edges clocked after the last vector, still reconciling.
    pub drain_cycles: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Row,
            reset_cycles: DEFAULT_RESET_CYCLES,
            drain_cycles: DEFAULT_DRAIN_CYCLES,
        }
    }
}

impl HarnessConfig {
    pub fn for_orientation(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Resetting,
    Streaming,
    Draining,
    Done,
}

/// A device output that disagrees with the queued expectation.
///
/// The display form carries everything needed to replay the vector alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: OutputField,
    pub expected: i128,
    pub actual: i128,
    pub vector: Vector,
    pub actual_output: PredictorOutput,
    /// Edge index at which the offending output was sampled.
    pub cycle: u64,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.vector.flags;
        let s = &self.vector.sample;
        write!(
            f,
            "Mismatch for {}: expected {}, got {}. {} ctrl=({}, {}, {}) \
             samples=({}, {}, {}, {}, {}) at cycle {}",
            self.field,
            self.expected,
            self.actual,
            self.vector.orientation,
            c.first_line as u8,
            c.first_in_line as u8,
            c.last_in_line as u8,
            s.cur,
            s.north,
            s.north_east,
            s.north_west,
            s.west,
            self.cycle
        )
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("No vectors loaded for {0} mode")]
    NoVectors(Orientation),
    #[error("{0}")]
    FieldMismatch(Box<FieldMismatch>),
    #[error(
        "Corpus row {index} is stale: stored {field} = {stored}, model gives {derived} \
         ({stale_rows} stale row(s)); regenerate the vectors"
    )]
    StaleCorpus {
        /// Position in the replayed slice.
        index: usize,
        field: OutputField,
        stored: i128,
        derived: i128,
        stale_rows: usize,
    },
    #[error("Pipeline did not drain, {pending} vectors left after {drain_cycles} drain cycles")]
    Drain { pending: usize, drain_cycles: usize },
}

/// Summary of a clean run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessReport {
    pub vectors_submitted: usize,
    pub outputs_checked: usize,
    /// Output-valid pulses that arrived with nothing pending.
    pub unexpected_outputs: usize,
    pub cycles: u64,
    /// Largest submit-to-output distance observed, in edges.
    pub max_latency: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    vector: Vector,
    submitted_at: u64,
}

/// Drives one device through reset, stimulus and drain.
///
/// All run state (FIFO, counters, cycle count) lives in the instance and is
/// cleared at the start of every [`run`](Self::run).
pub struct Harness {
    config: HarnessConfig,
    state: HarnessState,
    pending: VecDeque<Pending>,
    cycle: u64,
    report: HarnessReport,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            state: HarnessState::Done,
            pending: VecDeque::new(),
            cycle: 0,
            report: HarnessReport::default(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    /// Entries still waiting for a device output.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Replay the corpus vectors matching the configured orientation.
    pub fn run<D: ClockedDevice>(
        &mut self,
        device: &mut D,
        corpus: &Corpus,
    ) -> Result<HarnessReport, HarnessError> {
        self.run_vectors(device, corpus.vectors())
    }

    /// Like [`run`](Self::run) over a plain slice; vectors of the other
    /// orientation are skipped.
    pub fn run_vectors<D: ClockedDevice>(
        &mut self,
        device: &mut D,
        vectors: &[Vector],
    ) -> Result<HarnessReport, HarnessError> {
        let orientation = self.config.orientation;
        let mut stimulus = vectors.iter().filter(|v| v.orientation == orientation).peekable();
        if stimulus.peek().is_none() {
            return Err(HarnessError::NoVectors(orientation));
        }
        check_expectations(vectors, orientation)?;

        self.pending.clear();
        self.cycle = 0;
        self.report = HarnessReport::default();
        self.state = HarnessState::Resetting;

        let mut reset_left = self.config.reset_cycles;
        let mut drain_left = self.config.drain_cycles;

        loop {
            match self.state {
                HarnessState::Resetting => {
                    if reset_left == 0 {
                        device.set_reset(false);
                        info!(cycle = self.cycle, %orientation, "reset released");
                        self.state = HarnessState::Streaming;
                        continue;
                    }
                    device.set_reset(true);
                    // Outputs are not meaningful while reset is held.
                    self.tick(device, &InputPort::idle());
                    reset_left -= 1;
                }
                HarnessState::Streaming => match stimulus.next() {
                    Some(vector) => {
                        self.pending.push_back(Pending {
                            vector: *vector,
                            submitted_at: self.cycle,
                        });
                        self.report.vectors_submitted += 1;
                        let out = self.tick(device, &InputPort::drive(vector));
                        self.reconcile(out)?;
                    }
                    None => {
                        debug!(
                            cycle = self.cycle,
                            pending = self.pending.len(),
                            "stimulus complete, draining"
                        );
                        self.state = HarnessState::Draining;
                    }
                },
                HarnessState::Draining => {
                    if drain_left == 0 {
                        self.state = HarnessState::Done;
                        continue;
                    }
                    let out = self.tick(device, &InputPort::idle());
                    self.reconcile(out)?;
                    drain_left -= 1;
                }
                HarnessState::Done => break,
            }
        }

        self.report.cycles = self.cycle;
        if !self.pending.is_empty() {
            return Err(HarnessError::Drain {
                pending: self.pending.len(),
                drain_cycles: self.config.drain_cycles,
            });
        }

        info!(
            vectors = self.report.vectors_submitted,
            cycles = self.report.cycles,
            max_latency = self.report.max_latency,
            "all outputs reconciled"
        );
        Ok(self.report.clone())
    }

    fn tick<D: ClockedDevice>(&mut self, device: &mut D, input: &InputPort) -> (u64, OutputPort) {
        let edge = self.cycle;
        let out = device.clock_edge(input);
        self.cycle += 1;
        (edge, out)
    }

    fn reconcile(&mut self, (edge, out): (u64, OutputPort)) -> Result<(), HarnessError> {
        if !out.valid {
            return Ok(());
        }
        let Some(entry) = self.pending.pop_front() else {
            warn!(cycle = edge, "output valid with no pending vector");
            self.report.unexpected_outputs += 1;
            return Ok(());
        };

        self.report.max_latency = self.report.max_latency.max(edge - entry.submitted_at);
        if let Some(field) = entry.vector.expected.first_difference(&out.output) {
            return Err(HarnessError::FieldMismatch(Box::new(FieldMismatch {
                field,
                expected: entry.vector.expected.get(field),
                actual: out.output.get(field),
                vector: entry.vector,
                actual_output: out.output,
                cycle: edge,
            })));
        }
        self.report.outputs_checked += 1;
        Ok(())
    }
}

/// Re-derive every replayed expectation so a stale row is never blamed on
/// the device.
fn check_expectations(vectors: &[Vector], orientation: Orientation) -> Result<(), HarnessError> {
    let mut stale = vectors
        .iter()
        .enumerate()
        .filter(|(_, v)| v.orientation == orientation)
        .filter_map(|(index, v)| {
            let derived = local_diff(v.flags, v.sample, v.orientation);
            let field = v.expected.first_difference(&derived)?;
            Some((index, field, v.expected.get(field), derived.get(field)))
        });
    let Some((index, field, stored, derived)) = stale.next() else {
        return Ok(());
    };
    let stale_rows = 1 + stale.count();
    warn!(index, %field, stale_rows, "corpus expectations disagree with the model");
    Err(HarnessError::StaleCorpus {
        index,
        field,
        stored,
        derived,
        stale_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Fault, LatencyPipeline};
    use c123_model::{ControlFlags, NeighborhoodSample};

    /// Echoes the expectation of whatever it was given `delay` edges earlier.
    struct ShiftDevice {
        delay: usize,
        line: VecDeque<Option<PredictorOutput>>,
        resets_seen: usize,
    }

    impl ShiftDevice {
        fn new(delay: usize) -> Self {
            Self {
                delay,
                line: VecDeque::new(),
                resets_seen: 0,
            }
        }
    }

    impl ClockedDevice for ShiftDevice {
        fn set_reset(&mut self, asserted: bool) {
            if asserted {
                self.resets_seen += 1;
                self.line.clear();
            }
        }

        fn clock_edge(&mut self, input: &InputPort) -> OutputPort {
            let produced = input.valid.then(|| {
                c123_model::local_diff(input.flags, input.sample, Orientation::Row)
            });
            self.line.push_back(produced);
            if self.line.len() > self.delay {
                if let Some(Some(out)) = self.line.pop_front() {
                    return OutputPort::valid(out);
                }
            }
            OutputPort::idle()
        }
    }

    fn row_vectors(n: usize) -> Vec<Vector> {
        (0..n as i64)
            .map(|i| {
                Vector::from_model(
                    Orientation::Row,
                    ControlFlags::new(i == 0, i % 4 == 0, i % 4 == 3),
                    NeighborhoodSample::new(i, i + 1, i + 2, i + 3, i + 4),
                )
            })
            .collect()
    }

    #[test]
    fn test_zero_latency_device() {
        let mut dev = ShiftDevice::new(0);
        let mut harness = Harness::new(HarnessConfig::default());
        let report = harness.run_vectors(&mut dev, &row_vectors(8)).unwrap();
        assert_eq!(report.outputs_checked, 8);
        assert_eq!(report.max_latency, 0);
        assert_eq!(report.cycles, 3 + 8 + 5);
        assert_eq!(dev.resets_seen, 3);
        assert_eq!(harness.state(), HarnessState::Done);
    }

    #[test]
    fn test_latency_within_drain_window() {
        let mut dev = ShiftDevice::new(5);
        let mut harness = Harness::new(HarnessConfig::default());
        let report = harness.run_vectors(&mut dev, &row_vectors(4)).unwrap();
        assert_eq!(report.outputs_checked, 4);
        assert_eq!(report.max_latency, 5);
    }

    #[test]
    fn test_latency_beyond_drain_window() {
        let mut dev = ShiftDevice::new(3);
        let config = HarnessConfig {
            drain_cycles: 2,
            ..HarnessConfig::default()
        };
        let mut harness = Harness::new(config);
        let err = harness.run_vectors(&mut dev, &row_vectors(10)).unwrap_err();
        assert!(matches!(err, HarnessError::Drain { pending: 1, drain_cycles: 2 }));
        assert_eq!(harness.pending(), 1);
    }

    #[test]
    fn test_no_vectors_for_orientation() {
        let mut dev = ShiftDevice::new(0);
        let mut harness = Harness::new(HarnessConfig::for_orientation(Orientation::Column));
        let err = harness.run_vectors(&mut dev, &row_vectors(3)).unwrap_err();
        assert!(matches!(err, HarnessError::NoVectors(Orientation::Column)));
        // Nothing was driven.
        assert_eq!(dev.resets_seen, 0);
    }

    #[test]
    fn test_mismatch_message_has_context() {
        let mut dev = LatencyPipeline::new(Orientation::Row, 1).with_fault(Fault::Corrupt {
            index: 1,
            field: OutputField::DNW,
            delta: -7,
        });
        let mut harness = Harness::new(HarnessConfig::default());
        let err = harness.run_vectors(&mut dev, &row_vectors(3)).unwrap_err();
        let HarnessError::FieldMismatch(mismatch) = &err else {
            panic!("unexpected error {err}");
        };
        assert_eq!(mismatch.field, OutputField::DNW);
        assert_eq!(mismatch.expected - mismatch.actual, 7);
        let text = err.to_string();
        assert!(text.starts_with("Mismatch for d_nw"), "{text}");
        assert!(text.contains("ctrl=(0, 0, 0) samples=(1, 2, 3, 4, 5)"), "{text}");
    }

    #[test]
    fn test_stale_expectation_rejected_before_stimulus() {
        let mut vectors = row_vectors(6);
        vectors[2].expected.d_c += 1;
        vectors[4].expected.local_sum -= 3;
        let mut dev = ShiftDevice::new(0);
        let mut harness = Harness::new(HarnessConfig::default());
        let err = harness.run_vectors(&mut dev, &vectors).unwrap_err();
        match &err {
            HarnessError::StaleCorpus {
                index,
                field,
                stored,
                derived,
                stale_rows,
            } => {
                assert_eq!(*index, 2);
                assert_eq!(*field, OutputField::DC);
                assert_eq!(stored - derived, 1);
                assert_eq!(*stale_rows, 2);
            }
            other => panic!("unexpected error {other}"),
        }
        // The device was never reset or clocked.
        assert_eq!(dev.resets_seen, 0);
        assert!(dev.line.is_empty());
    }

    #[test]
    fn test_stale_rows_of_other_orientation_are_ignored() {
        let mut vectors = row_vectors(4);
        let mut column = Vector::from_model(
            Orientation::Column,
            ControlFlags::interior(),
            NeighborhoodSample::new(1, 2, 3, 4, 5),
        );
        column.expected.d_w += 9;
        vectors.push(column);
        let mut dev = ShiftDevice::new(0);
        let mut harness = Harness::new(HarnessConfig::default());
        let report = harness.run_vectors(&mut dev, &vectors).unwrap();
        assert_eq!(report.outputs_checked, 4);
    }
}
