use crate::VectorError;
use c123_model::{
    local_diff, ControlFlags, NeighborhoodSample, Orientation, PredictorOutput, SampleFormat,
};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Corpus column names, in the order they are written.
pub const COLUMNS: [&str; 14] = [
    "column_oriented",
    "first_line",
    "first_in_line",
    "last_in_line",
    "cur",
    "north",
    "north_east",
    "north_west",
    "west",
    "local_sum",
    "d_c",
    "d_n",
    "d_nw",
    "d_w",
];

/// One row of the corpus: stimulus plus the expectation stored with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub orientation: Orientation,
    pub flags: ControlFlags,
    pub sample: NeighborhoodSample,
    pub expected: PredictorOutput,
}

impl Vector {
    /// Build a vector whose expectation comes straight from the model.
    pub fn from_model(
        orientation: Orientation,
        flags: ControlFlags,
        sample: NeighborhoodSample,
    ) -> Self {
        Self {
            orientation,
            flags,
            sample,
            expected: local_diff(flags, sample, orientation),
        }
    }

    fn to_row(&self) -> [i128; 14] {
        let f = &self.flags;
        let s = &self.sample;
        let e = &self.expected;
        [
            i128::from(self.orientation.is_column()),
            i128::from(f.first_line),
            i128::from(f.first_in_line),
            i128::from(f.last_in_line),
            i128::from(s.cur),
            i128::from(s.north),
            i128::from(s.north_east),
            i128::from(s.north_west),
            i128::from(s.west),
            e.local_sum,
            e.d_c,
            e.d_n,
            e.d_nw,
            e.d_w,
        ]
    }

    fn from_row(row: &[i128; 14], line: usize) -> Result<Self, VectorError> {
        let flag = |idx: usize| -> Result<bool, VectorError> {
            match row[idx] {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(VectorError::Malformed {
                    line,
                    message: format!("column '{}' must be 0 or 1, got {}", COLUMNS[idx], other),
                }),
            }
        };
        let sample = |idx: usize| -> Result<i64, VectorError> {
            i64::try_from(row[idx])
                .ok()
                .filter(|&v| SampleFormat::representable(v))
                .ok_or_else(|| VectorError::Malformed {
                    line,
                    message: format!(
                        "sample '{}' = {} is outside every supported sample format",
                        COLUMNS[idx], row[idx]
                    ),
                })
        };
        Ok(Self {
            orientation: Orientation::from_column_flag(flag(0)?),
            flags: ControlFlags::new(flag(1)?, flag(2)?, flag(3)?),
            sample: NeighborhoodSample::new(
                sample(4)?,
                sample(5)?,
                sample(6)?,
                sample(7)?,
                sample(8)?,
            ),
            expected: PredictorOutput {
                local_sum: row[9],
                d_c: row[10],
                d_n: row[11],
                d_nw: row[12],
                d_w: row[13],
            },
        })
    }
}

/// A stored row whose expectation disagrees with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMismatch {
    pub index: usize,
    pub stored: PredictorOutput,
    pub derived: PredictorOutput,
}

/// Ordered collection of vectors, as stored in the corpus CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    vectors: Vec<Vector>,
}

impl Corpus {
    pub fn new(vectors: Vec<Vector>) -> Self {
        Self { vectors }
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vectors for one orientation, in corpus order.
    pub fn for_orientation(&self, orientation: Orientation) -> Vec<Vector> {
        self.vectors
            .iter()
            .filter(|v| v.orientation == orientation)
            .copied()
            .collect()
    }

    /// Re-derive every row through the model and report disagreements.
    pub fn verify(&self) -> Vec<RowMismatch> {
        self.vectors
            .iter()
            .enumerate()
            .filter_map(|(index, v)| {
                let derived = local_diff(v.flags, v.sample, v.orientation);
                (derived != v.expected).then_some(RowMismatch {
                    index,
                    stored: v.expected,
                    derived,
                })
            })
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), VectorError> {
        let mut out = BufWriter::new(writer);
        writeln!(out, "{}", COLUMNS.join(","))?;
        for vector in &self.vectors {
            let row = vector.to_row();
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}", cells.join(","))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Parse a corpus CSV. Columns are located by header name, so their order
    /// in the file does not matter.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, VectorError> {
        let mut lines = BufReader::new(reader).lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(VectorError::Malformed {
                    line: 1,
                    message: "empty corpus file".to_string(),
                })
            }
        };

        let positions: HashMap<&str, usize> = header
            .trim_end_matches('\r')
            .split(',')
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();
        let mut index = [0usize; 14];
        for (slot, name) in index.iter_mut().zip(COLUMNS.iter()) {
            *slot = *positions.get(name).ok_or(VectorError::MissingColumn(*name))?;
        }

        let mut vectors = Vec::new();
        for (offset, line) in lines.enumerate() {
            let line_no = offset + 2;
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            let mut row = [0i128; 14];
            for (value, (&col, name)) in row.iter_mut().zip(index.iter().zip(COLUMNS.iter())) {
                let cell = cells.get(col).ok_or_else(|| VectorError::Malformed {
                    line: line_no,
                    message: format!("missing value for '{}'", name),
                })?;
                *value = cell.parse().map_err(|_| VectorError::Malformed {
                    line: line_no,
                    message: format!("'{}' is not an integer for '{}'", cell, name),
                })?;
            }
            vectors.push(Vector::from_row(&row, line_no)?);
        }

        Ok(Self { vectors })
    }

    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.write_csv(File::create(path)?)?;
        debug!(path = %path.display(), rows = self.len(), "wrote vector corpus");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, VectorError> {
        if !path.exists() {
            return Err(VectorError::NotFound(path.to_path_buf()));
        }
        let corpus = Self::read_csv(File::open(path)?)?;
        debug!(path = %path.display(), rows = corpus.len(), "loaded vector corpus");
        Ok(corpus)
    }
}
