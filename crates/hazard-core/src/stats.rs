//! Elevation extrema of a clipped sample.
use geo::Point;
use serde::Serialize;

use crate::clip::{ClippedCell, ClippedSample};
use crate::error::AnalysisError;

/// Lowest or highest cell of a sample, located at its cell centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremalPoint {
    pub elevation: f64,
    pub location: (f64, f64),
    /// Window-relative row/col of the cell.
    pub row: usize,
    pub col: usize,
}

impl ExtremalPoint {
    pub fn point(&self) -> Point<f64> {
        Point::new(self.location.0, self.location.1)
    }
}

impl From<&ClippedCell> for ExtremalPoint {
    fn from(c: &ClippedCell) -> Self {
        Self {
            elevation: c.elevation as f64,
            location: (c.x, c.y),
            row: c.row,
            col: c.col,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMax {
    pub min: ExtremalPoint,
    pub max: ExtremalPoint,
}

/// Minimum and maximum elevation of `sample`.
///
/// Ties resolve to the first cell in row-major scan order: comparisons are
/// strict, so a later cell with an equal value never replaces the current one.
pub fn min_max(sample: &ClippedSample, label: &'static str) -> Result<MinMax, AnalysisError> {
    let mut cells = sample.cells.iter();
    let first = cells.next().ok_or(AnalysisError::EmptySample(label))?;

    let (mut lo, mut hi) = (first, first);
    for c in cells {
        if c.elevation < lo.elevation {
            lo = c;
        }
        if c.elevation > hi.elevation {
            hi = c;
        }
    }

    Ok(MinMax {
        min: lo.into(),
        max: hi.into(),
    })
}
