use serde::{Deserialize, Serialize};

/// Raster position of the sample being predicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlFlags {
    pub first_line: bool,
    pub first_in_line: bool,
    pub last_in_line: bool,
}

impl ControlFlags {
    pub fn new(first_line: bool, first_in_line: bool, last_in_line: bool) -> Self {
        Self {
            first_line,
            first_in_line,
            last_in_line,
        }
    }

    /// Interior pixel: not on the first line and not on either line edge.
    pub fn interior() -> Self {
        Self::default()
    }

    /// First pixel of the image; it has no causal neighbours at all.
    pub fn is_image_start(&self) -> bool {
        self.first_line && self.first_in_line
    }
}

/// Local-sum orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Neighbour-oriented sums over W, NW, N and NE.
    Row,
    /// Column-oriented sums using only N (or W on the first line).
    Column,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Row, Orientation::Column];

    pub fn is_column(&self) -> bool {
        matches!(self, Orientation::Column)
    }

    pub fn from_column_flag(column_oriented: bool) -> Self {
        if column_oriented {
            Orientation::Column
        } else {
            Orientation::Row
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Row => f.write_str("row-oriented"),
            Orientation::Column => f.write_str("column-oriented"),
        }
    }
}

/// Current sample and its causal neighbourhood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeighborhoodSample {
    pub cur: i64,
    pub north: i64,
    pub north_east: i64,
    pub north_west: i64,
    pub west: i64,
}

impl NeighborhoodSample {
    pub fn new(cur: i64, north: i64, north_east: i64, north_west: i64, west: i64) -> Self {
        Self {
            cur,
            north,
            north_east,
            north_west,
            west,
        }
    }
}

/// Local-difference stage outputs, all at ×4 scale.
///
/// Fields are `i128` so every output of an `i64` neighbourhood is exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictorOutput {
    pub local_sum: i128,
    pub d_c: i128,
    pub d_n: i128,
    pub d_nw: i128,
    pub d_w: i128,
}

/// Names one of the five [`PredictorOutput`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputField {
    LocalSum,
    DC,
    DN,
    DNW,
    DW,
}

impl OutputField {
    /// Reconciliation order.
    pub const ALL: [OutputField; 5] = [
        OutputField::LocalSum,
        OutputField::DC,
        OutputField::DN,
        OutputField::DNW,
        OutputField::DW,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputField::LocalSum => "local_sum",
            OutputField::DC => "d_c",
            OutputField::DN => "d_n",
            OutputField::DNW => "d_nw",
            OutputField::DW => "d_w",
        }
    }
}

impl std::fmt::Display for OutputField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl PredictorOutput {
    pub fn get(&self, field: OutputField) -> i128 {
        match field {
            OutputField::LocalSum => self.local_sum,
            OutputField::DC => self.d_c,
            OutputField::DN => self.d_n,
            OutputField::DNW => self.d_nw,
            OutputField::DW => self.d_w,
        }
    }

    pub fn get_mut(&mut self, field: OutputField) -> &mut i128 {
        match field {
            OutputField::LocalSum => &mut self.local_sum,
            OutputField::DC => &mut self.d_c,
            OutputField::DN => &mut self.d_n,
            OutputField::DNW => &mut self.d_nw,
            OutputField::DW => &mut self.d_w,
        }
    }

    /// First field (in reconciliation order) where `self` and `other` differ.
    pub fn first_difference(&self, other: &PredictorOutput) -> Option<OutputField> {
        OutputField::ALL
            .into_iter()
            .find(|&field| self.get(field) != other.get(field))
    }
}

/// The two terms accumulated into the local sum.
///
/// Column orientation ignores the row-position flags except `first_line`.
/// Row-oriented cases are matched in order. The only position left over is the
/// image's first pixel, which contributes no terms; its outputs are forced to
/// zero by [`local_diff`] regardless.
pub fn local_sum_terms(
    flags: ControlFlags,
    sample: NeighborhoodSample,
    orientation: Orientation,
) -> (i128, i128) {
    let ControlFlags {
        first_line,
        first_in_line,
        last_in_line,
    } = flags;
    let (n, ne, nw, w) = (
        i128::from(sample.north),
        i128::from(sample.north_east),
        i128::from(sample.north_west),
        i128::from(sample.west),
    );

    if orientation.is_column() {
        let anchor = if first_line { w } else { n };
        return (4 * anchor, 0);
    }

    match (first_line, first_in_line, last_in_line) {
        (false, false, false) => (w + nw, n + ne),
        (true, false, _) => (4 * w, 0),
        (false, true, _) => (2 * n, 2 * ne),
        (false, false, true) => (w + nw, 2 * n),
        (true, true, _) => (0, 0),
    }
}

/// Expected local-difference outputs for a single pixel.
///
/// # Example
/// ```
/// use c123_model::{local_diff, ControlFlags, NeighborhoodSample, Orientation};
///
/// let out = local_diff(
///     ControlFlags::interior(),
///     NeighborhoodSample::new(10, 5, 6, 4, 3),
///     Orientation::Row,
/// );
/// assert_eq!(out.local_sum, 18);
/// assert_eq!((out.d_c, out.d_n, out.d_nw, out.d_w), (22, 2, -2, -6));
/// ```
pub fn local_diff(
    flags: ControlFlags,
    sample: NeighborhoodSample,
    orientation: Orientation,
) -> PredictorOutput {
    let (term1, term2) = local_sum_terms(flags, sample, orientation);
    let local_sum = term1 + term2;
    let scaled = |v: i64| 4 * i128::from(v) - local_sum;

    let (local_sum_out, d_c) = if flags.is_image_start() {
        (0, 0)
    } else {
        (local_sum, scaled(sample.cur))
    };

    let d_n = if flags.first_line {
        0
    } else {
        scaled(sample.north)
    };

    let (d_w, d_nw) = if flags.first_line {
        (0, 0)
    } else if flags.first_in_line {
        // W and NW do not exist; both reflect the north neighbour.
        let reflected = scaled(sample.north);
        (reflected, reflected)
    } else {
        (scaled(sample.west), scaled(sample.north_west))
    };

    PredictorOutput {
        local_sum: local_sum_out,
        d_c,
        d_n,
        d_nw,
        d_w,
    }
}
