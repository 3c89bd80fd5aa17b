use c123_harness::{Fault, Harness, HarnessConfig, HarnessError, LatencyPipeline};
use c123_model::{Orientation, OutputField, SampleFormat};
use c123_vectors::{generate, Corpus, GeneratorConfig};
use proptest::prelude::*;

fn corpus(cases: usize, seed: u64) -> Corpus {
    generate(
        &GeneratorConfig::new(SampleFormat::signed(10).unwrap())
            .with_cases(cases)
            .with_seed(seed),
    )
}

#[test]
fn test_latency_three_drain_two_loses_one() {
    let corpus = corpus(10, 7);
    let mut device = LatencyPipeline::new(Orientation::Row, 3);
    let mut harness = Harness::new(HarnessConfig {
        drain_cycles: 2,
        ..HarnessConfig::default()
    });

    match harness.run(&mut device, &corpus) {
        Err(HarnessError::Drain { pending, .. }) => assert_eq!(pending, 1),
        other => panic!("expected drain failure, got {:?}", other),
    }
}

#[test]
fn test_both_orientations_reconcile() {
    let corpus = corpus(64, 0x1234);
    for orientation in Orientation::ALL {
        let mut device = LatencyPipeline::new(orientation, 4);
        let mut harness = Harness::new(HarnessConfig::for_orientation(orientation));
        let report = harness.run(&mut device, &corpus).unwrap();
        assert_eq!(report.vectors_submitted, 64);
        assert_eq!(report.outputs_checked, 64);
        assert_eq!(report.unexpected_outputs, 0);
        assert_eq!(report.max_latency, 4);
    }
}

#[test]
fn test_variable_latency_keeps_fifo_order() {
    let corpus = corpus(16, 99);
    // Stall the output stage for a few edges in the middle of the stream.
    let mut device = LatencyPipeline::new(Orientation::Column, 1).with_stalls(8..11);
    let mut harness = Harness::new(HarnessConfig::for_orientation(Orientation::Column));
    let report = harness.run(&mut device, &corpus).unwrap();
    assert_eq!(report.outputs_checked, 16);
    assert!(report.max_latency > 1);
}

#[test]
fn test_corrupted_field_is_reported() {
    let corpus = corpus(12, 3);
    let mut device = LatencyPipeline::new(Orientation::Row, 2).with_fault(Fault::Corrupt {
        index: 5,
        field: OutputField::DW,
        delta: -1,
    });
    let mut harness = Harness::new(HarnessConfig::default());

    let err = harness.run(&mut device, &corpus).unwrap_err();
    let HarnessError::FieldMismatch(mismatch) = &err else {
        panic!("expected field mismatch, got {err:?}");
    };
    let rows = corpus.for_orientation(Orientation::Row);
    assert_eq!(mismatch.vector, rows[5]);
    assert_eq!(mismatch.actual, mismatch.expected - 1);
    // Field order is local_sum, d_c, d_n, d_nw, d_w; only d_w was touched.
    assert_eq!(mismatch.field, OutputField::DW);
}

#[test]
fn test_dropped_output_is_a_drain_failure() {
    let corpus = corpus(6, 11);
    // The dropped beat shifts every later output one slot forward, so the
    // first comparison after the drop may already fail on values. Dropping
    // the last beat isolates the lost-output signal.
    let mut device = LatencyPipeline::new(Orientation::Row, 1).with_fault(Fault::Drop { index: 5 });
    let mut harness = Harness::new(HarnessConfig::default());

    let err = harness.run(&mut device, &corpus).unwrap_err();
    assert!(matches!(err, HarnessError::Drain { pending: 1, .. }), "{err}");
}

#[test]
fn test_missing_orientation_aborts_before_stimulus() {
    let row_only = Corpus::new(corpus(4, 1).for_orientation(Orientation::Row));
    let mut device = LatencyPipeline::new(Orientation::Column, 0);
    let mut harness = Harness::new(HarnessConfig::for_orientation(Orientation::Column));
    let err = harness.run(&mut device, &row_only).unwrap_err();
    assert!(matches!(err, HarnessError::NoVectors(Orientation::Column)));
    assert_eq!(err.to_string(), "No vectors loaded for column-oriented mode");
}

proptest! {
    #[test]
    fn prop_latency_up_to_drain_window_passes(
        latency in 0u64..=8,
        cases in 1usize..40,
        seed in any::<u64>()
    ) {
        let corpus = corpus(cases, seed);
        let mut device = LatencyPipeline::new(Orientation::Row, latency);
        let mut harness = Harness::new(HarnessConfig {
            drain_cycles: 8,
            ..HarnessConfig::default()
        });
        let report = harness.run(&mut device, &corpus).unwrap();
        prop_assert_eq!(report.outputs_checked, cases);
        prop_assert_eq!(report.max_latency, latency);
    }

    #[test]
    fn prop_latency_past_drain_window_fails(
        extra in 1u64..5,
        cases in 5usize..20
    ) {
        let drain = 3usize;
        let corpus = corpus(cases, 5);
        let mut device = LatencyPipeline::new(Orientation::Row, drain as u64 + extra);
        let mut harness = Harness::new(HarnessConfig {
            drain_cycles: drain,
            ..HarnessConfig::default()
        });
        let pending = match harness.run(&mut device, &corpus) {
            Err(HarnessError::Drain { pending, .. }) => pending,
            other => panic!("expected drain failure, got {:?}", other),
        };
        prop_assert_eq!(pending as u64, extra);
    }
}
