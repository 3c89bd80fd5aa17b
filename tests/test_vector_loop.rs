// End-to-end: simulation config → corpus → CSV on disk → harness replay
use c123_oracle::harness::{Fault, Harness, HarnessConfig, HarnessError, LatencyPipeline};
use c123_oracle::model::{Orientation, OutputField};
use c123_oracle::vectors::{generate, Corpus, GeneratorConfig, SimulationConfig};
use std::fs;

const CONFIG: &str = r#"{
    "parameters": { "D": 12 },
    "images": [ { "signed": false } ]
}"#;

fn corpus_on_disk(dir: &std::path::Path) -> Corpus {
    let config_path = dir.join("sim.json");
    fs::write(&config_path, CONFIG).unwrap();
    let config = SimulationConfig::load(&config_path).unwrap();
    let format = config.sample_format().unwrap();

    let corpus = generate(&GeneratorConfig::new(format).with_cases(40).with_seed(7));
    let csv = dir.join("out").join("local_diff_vectors.csv");
    corpus.save(&csv).unwrap();
    Corpus::load(&csv).unwrap()
}

#[test]
fn test_saved_corpus_replays_cleanly_in_both_orientations() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = corpus_on_disk(dir.path());
    assert_eq!(corpus.len(), 80);
    assert!(corpus.verify().is_empty());

    for orientation in Orientation::ALL {
        let mut device = LatencyPipeline::new(orientation, 3);
        let mut harness = Harness::new(HarnessConfig::for_orientation(orientation));
        let report = harness.run(&mut device, &corpus).unwrap();
        assert_eq!(report.vectors_submitted, 40);
        assert_eq!(report.outputs_checked, 40);
        assert_eq!(report.unexpected_outputs, 0);
    }
}

#[test]
fn test_corrupted_device_output_is_caught() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = corpus_on_disk(dir.path());

    let mut device = LatencyPipeline::new(Orientation::Column, 2).with_fault(Fault::Corrupt {
        index: 17,
        field: OutputField::DW,
        delta: -1,
    });
    let mut harness = Harness::new(HarnessConfig::for_orientation(Orientation::Column));
    match harness.run(&mut device, &corpus) {
        Err(HarnessError::FieldMismatch(m)) => {
            assert_eq!(m.field, OutputField::DW);
            assert_eq!(m.actual, m.expected - 1);
            assert_eq!(m.vector.orientation, Orientation::Column);
        }
        other => panic!("expected a field mismatch, got {:?}", other),
    }
}

#[test]
fn test_edited_csv_is_rejected_as_stale() {
    let dir = tempfile::tempdir().unwrap();
    corpus_on_disk(dir.path());
    let csv = dir.path().join("out").join("local_diff_vectors.csv");

    // Bump d_c of the second data row by one.
    let text = fs::read_to_string(&csv).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let mut cells: Vec<i128> = lines[2].split(',').map(|c| c.parse().unwrap()).collect();
    cells[10] += 1;
    lines[2] = cells.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(",");
    fs::write(&csv, lines.join("\n")).unwrap();

    let corpus = Corpus::load(&csv).unwrap();
    assert_eq!(corpus.verify().len(), 1);

    let mut device = LatencyPipeline::new(Orientation::Row, 2);
    let mut harness = Harness::new(HarnessConfig::for_orientation(Orientation::Row));
    match harness.run(&mut device, &corpus) {
        Err(HarnessError::StaleCorpus {
            index,
            field,
            stored,
            derived,
            stale_rows,
        }) => {
            assert_eq!((index, field, stale_rows), (1, OutputField::DC, 1));
            assert_eq!(stored, derived + 1);
        }
        other => panic!("expected a stale corpus error, got {:?}", other),
    }
    // The device never saw a beat.
    assert_eq!(device.in_flight(), 0);
}
