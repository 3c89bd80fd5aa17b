use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widest sample depth the pipeline supports.
pub const MAX_DEPTH: u32 = 32;

/// Smallest sample any supported format can hold (signed, 32-bit).
pub const SAMPLE_MIN: i64 = -(1 << (MAX_DEPTH - 1));
/// Largest sample any supported format can hold (unsigned, 32-bit).
pub const SAMPLE_MAX: i64 = (1 << MAX_DEPTH) - 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleFormatError {
    #[error("Sample depth {0} outside 1..=32")]
    InvalidDepth(u32),
}

/// Dynamic range of the input samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFormat {
    pub depth: u32,
    pub signed: bool,
}

impl SampleFormat {
    pub fn new(depth: u32, signed: bool) -> Result<Self, SampleFormatError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(SampleFormatError::InvalidDepth(depth));
        }
        Ok(Self { depth, signed })
    }

    pub fn unsigned(depth: u32) -> Result<Self, SampleFormatError> {
        Self::new(depth, false)
    }

    pub fn signed(depth: u32) -> Result<Self, SampleFormatError> {
        Self::new(depth, true)
    }

    /// Inclusive `(min, max)` of representable samples.
    ///
    /// Signed: `[-2^(D-1), 2^(D-1) - 1]`. Unsigned: `[0, 2^D - 1]`.
    pub fn range(&self) -> (i64, i64) {
        if self.signed {
            let half = 1i64 << (self.depth - 1);
            (-half, half - 1)
        } else {
            (0, (1i64 << self.depth) - 1)
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&value)
    }

    /// Whether some supported format can represent `value`.
    pub fn representable(value: i64) -> bool {
        (SAMPLE_MIN..=SAMPLE_MAX).contains(&value)
    }
}
