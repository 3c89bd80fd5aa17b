//! Band-sequential image dumps: NZ planes of NY rows of NX little-endian
//! u16 samples.

use crate::CompareError;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::fs;
use std::path::Path;

/// Mismatching samples listed individually; the rest are only counted.
pub const SAMPLE_REPORT_LIMIT: usize = 20;

/// Read a BSQ file that must hold exactly `nx * ny * nz` samples.
pub fn read_bsq(path: &Path, nx: usize, ny: usize, nz: usize) -> Result<Vec<u16>, CompareError> {
    let expected = nx
        .checked_mul(ny)
        .and_then(|n| n.checked_mul(nz))
        .and_then(|n| n.checked_mul(2))
        .ok_or(CompareError::BsqDimensions { nx, ny, nz })?;
    let data = fs::read(path)?;
    if data.len() != expected {
        return Err(CompareError::BsqSize {
            path: path.to_path_buf(),
            actual: data.len(),
            expected,
        });
    }
    let mut samples = vec![0u16; data.len() / 2];
    LittleEndian::read_u16_into(&data, &mut samples);
    Ok(samples)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleMismatch {
    pub index: usize,
    pub expected: u16,
    pub actual: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleComparison {
    pub name: String,
    pub expected_len: usize,
    pub actual_len: usize,
    /// Value mismatches plus one per sample of length difference.
    pub mismatches: usize,
    pub reported: Vec<SampleMismatch>,
}

impl SampleComparison {
    pub fn matches(&self) -> bool {
        self.mismatches == 0
    }
}

impl fmt::Display for SampleComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.reported {
            writeln!(
                f,
                "Mismatch in {} at sample {}: expected {}, got {}",
                self.name, m.index, m.expected, m.actual
            )?;
        }
        if self.expected_len != self.actual_len {
            writeln!(
                f,
                "Length mismatch for {}: expected {}, got {}",
                self.name, self.expected_len, self.actual_len
            )?;
        }
        if self.matches() {
            write!(f, "{}: all {} samples match", self.name, self.expected_len)
        } else {
            write!(f, "{}: {} mismatches detected", self.name, self.mismatches)
        }
    }
}

pub fn compare_sequences(name: &str, expected: &[u16], actual: &[u16]) -> SampleComparison {
    let mut mismatches = 0;
    let mut reported = Vec::new();
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        if e != a {
            if reported.len() < SAMPLE_REPORT_LIMIT {
                reported.push(SampleMismatch {
                    index,
                    expected: e,
                    actual: a,
                });
            }
            mismatches += 1;
        }
    }
    mismatches += expected.len().abs_diff(actual.len());
    SampleComparison {
        name: name.to_string(),
        expected_len: expected.len(),
        actual_len: actual.len(),
        mismatches,
        reported,
    }
}
