use crate::corpus::{Corpus, Vector};
use c123_model::{ControlFlags, NeighborhoodSample, Orientation, SampleFormat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub const DEFAULT_SEED: u64 = 0x1234;
pub const DEFAULT_CASES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub format: SampleFormat,
    /// Vectors drawn per orientation.
    pub cases: usize,
    pub seed: u64,
}

impl GeneratorConfig {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            cases: DEFAULT_CASES,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_cases(mut self, cases: usize) -> Self {
        self.cases = cases;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Draw `cases` row-oriented vectors followed by `cases` column-oriented ones.
///
/// Draw order per vector is fixed (three flag bits, then cur, N, NE, NW, W)
/// so the same config always produces the same corpus.
pub fn generate(config: &GeneratorConfig) -> Corpus {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (lo, hi) = config.format.range();
    let mut vectors = Vec::with_capacity(config.cases * Orientation::ALL.len());

    for orientation in Orientation::ALL {
        for _ in 0..config.cases {
            let flags = ControlFlags::new(rng.gen(), rng.gen(), rng.gen());
            let mut draw = || rng.gen_range(lo..=hi);
            let sample = NeighborhoodSample {
                cur: draw(),
                north: draw(),
                north_east: draw(),
                north_west: draw(),
                west: draw(),
            };
            vectors.push(Vector::from_model(orientation, flags, sample));
        }
    }

    info!(
        depth = config.format.depth,
        signed = config.format.signed,
        cases = config.cases,
        seed = config.seed,
        "generated local-diff vectors"
    );
    Corpus::new(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_order() {
        let config = GeneratorConfig::new(SampleFormat::unsigned(8).unwrap()).with_cases(10);
        let corpus = generate(&config);
        assert_eq!(corpus.len(), 20);
        assert!(corpus.vectors()[..10].iter().all(|v| v.orientation == Orientation::Row));
        assert!(corpus.vectors()[10..].iter().all(|v| v.orientation == Orientation::Column));
    }

    #[test]
    fn test_samples_in_range() {
        let format = SampleFormat::signed(5).unwrap();
        let corpus = generate(&GeneratorConfig::new(format).with_cases(200));
        for v in corpus.vectors() {
            let s = v.sample;
            for value in [s.cur, s.north, s.north_east, s.north_west, s.west] {
                assert!(format.contains(value), "{} out of range", value);
            }
        }
    }

    #[test]
    fn test_generated_rows_self_check() {
        let corpus = generate(&GeneratorConfig::new(SampleFormat::signed(16).unwrap()));
        assert!(corpus.verify().is_empty());
    }

    #[test]
    fn test_seed_changes_output() {
        let format = SampleFormat::unsigned(12).unwrap();
        let a = generate(&GeneratorConfig::new(format).with_seed(1));
        let b = generate(&GeneratorConfig::new(format).with_seed(2));
        assert_ne!(a, b);
    }
}
