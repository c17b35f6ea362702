//! Finite-difference elevation gradient over a crop window.
//! `pub(crate)` only — not re-exported from analysis/mod.rs.
//!
//! Differences are taken on the raw raster values inside the window, not on
//! the polygon-masked cells, so boundary cells of the parcel still have
//! neighbours. Cells on the window edge fall back to one-sided differences,
//! which is the accepted crop-boundary approximation.

use crate::clip::CropWindow;
use crate::raster::RasterWindow;

/// Gradient `(dz_dx, dz_dy)` at window cell `(r, c)`.
///
/// Per axis:
/// ```text
///   central   (z[+1] − z[−1]) / (2 · size)   both neighbours valid
///   one-sided (z[+1] − z[0])  / size         only one neighbour valid
///   zero                                     no valid neighbour
/// ```
///
/// `dz_dy` follows raster row order (positive = elevation rising
/// down the rows); only the magnitude is used downstream.
pub(crate) fn central_gradient(
    raster: &RasterWindow,
    window: &CropWindow,
    r: usize,
    c: usize,
    px: f64,
    py: f64,
) -> (f64, f64) {
    let at = |rr: usize, cc: usize| {
        raster
            .value(window.row_off + rr, window.col_off + cc)
            .map(f64::from)
    };
    let Some(z) = at(r, c) else {
        return (0.0, 0.0);
    };

    let west = c.checked_sub(1).and_then(|cc| at(r, cc));
    let east = (c + 1 < window.width).then(|| at(r, c + 1)).flatten();
    let north = r.checked_sub(1).and_then(|rr| at(rr, c));
    let south = (r + 1 < window.height).then(|| at(r + 1, c)).flatten();

    (axis_diff(west, z, east, px), axis_diff(north, z, south, py))
}

#[inline]
fn axis_diff(before: Option<f64>, z: f64, after: Option<f64>, size: f64) -> f64 {
    match (before, after) {
        (Some(b), Some(a)) => (a - b) / (2.0 * size),
        (None, Some(a)) => (a - z) / size,
        (Some(b), None) => (z - b) / size,
        (None, None) => 0.0,
    }
}

/// Slope angle in degrees from a gradient pair.
#[inline]
pub(crate) fn slope_degrees(dz_dx: f64, dz_dy: f64) -> f64 {
    (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan().to_degrees()
}
