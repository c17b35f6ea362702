//! Slope stability classification.
//!
//! Computes the slope angle (degrees) at every cell of the parcel's crop
//! window, keeps the cells inside the parcel with real data, and classifies
//! on the maximum as the conservative bound:
//!
//! ```text
//!   max > 15°        SUSCEPTIBLE
//!   5° < max ≤ 15°   FLAG FOR REVIEW
//!   max ≤ 5°         SAFE
//! ```
use std::collections::BTreeMap;

use crate::classification::{Assessment, SlopeResult, SlopeStatus};
use crate::clip::clip;
use crate::error::AnalysisError;
use crate::geometry::Parcel;
use crate::raster::RasterWindow;

use super::gradient::{central_gradient, slope_degrees};

pub const SUSCEPTIBLE_ABOVE_DEG: f64 = 15.0;
pub const REVIEW_ABOVE_DEG: f64 = 5.0;

pub const MAX_SLOPE_DEGREES: &str = "max_slope_degrees";
pub const AVG_SLOPE_DEGREES: &str = "avg_slope_degrees";

/// Threshold bucket for a maximum slope angle.
pub fn classify_slope(max_slope_deg: f64) -> SlopeStatus {
    if max_slope_deg > SUSCEPTIBLE_ABOVE_DEG {
        SlopeStatus::Susceptible
    } else if max_slope_deg > REVIEW_ABOVE_DEG {
        SlopeStatus::Review
    } else {
        SlopeStatus::Safe
    }
}

/// Slope angles (degrees) of the selected parcel cells, row-major.
pub fn parcel_slopes(raster: &RasterWindow, site: &Parcel) -> Vec<f64> {
    let sample = clip(raster, site);
    let window = sample.window;
    let (px, py) = raster.resolution();

    let mut slopes = Vec::with_capacity(sample.len());
    for r in 0..window.height {
        for c in 0..window.width {
            if !sample.is_selected(r, c) {
                continue;
            }
            let (dz_dx, dz_dy) = central_gradient(raster, &window, r, c, px, py);
            slopes.push(slope_degrees(dz_dx, dz_dy));
        }
    }
    slopes
}

/// Classify slope stability of `site`.
///
/// Fails with [`AnalysisError::NoValidData`] when the parcel covers no valid
/// cells of the raster.
pub fn analyze_slope(raster: &RasterWindow, site: &Parcel) -> Result<SlopeResult, AnalysisError> {
    let slopes = parcel_slopes(raster, site);
    if slopes.is_empty() {
        return Err(AnalysisError::NoValidData("slope"));
    }

    let max_slope = slopes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg_slope = slopes.iter().sum::<f64>() / slopes.len() as f64;
    let status = classify_slope(max_slope);

    log::info!(
        "slope: {} cells, max {:.2}°, mean {:.2}° → {}",
        slopes.len(),
        max_slope,
        avg_slope,
        status
    );

    Ok(SlopeResult {
        metrics: BTreeMap::from([
            (MAX_SLOPE_DEGREES.to_string(), max_slope),
            (AVG_SLOPE_DEGREES.to_string(), avg_slope),
        ]),
        assessment: Assessment {
            status,
            is_compliant: status.is_compliant(),
            threshold_used: Some("max_slope".to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::AffineTransform;
    use approx::assert_relative_eq;

    /// Planar ramp rising eastward at `target_deg`, 1 m pixels.
    fn make_ramp(n: usize, target_deg: f64) -> RasterWindow {
        let t = AffineTransform::from_origin(0.0, n as f64, 1.0, 1.0);
        let mut r = RasterWindow::new(n, n, t, Some(-9999.0), 0.0).unwrap();
        let rise = target_deg.to_radians().tan();
        for row in 0..n {
            for col in 0..n {
                r.set(row, col, (col as f64 * rise) as f32);
            }
        }
        r
    }

    #[test]
    fn flat_parcel_is_safe() {
        let r = make_ramp(32, 0.0);
        let res = analyze_slope(&r, &Parcel::rect(4.0, 4.0, 28.0, 28.0)).unwrap();
        assert_eq!(res.metric(MAX_SLOPE_DEGREES), Some(0.0));
        assert_eq!(res.metric(AVG_SLOPE_DEGREES), Some(0.0));
        assert_eq!(res.status(), SlopeStatus::Safe);
        assert!(res.assessment.is_compliant);
    }

    #[test]
    fn ramp_recovers_angle() {
        let r = make_ramp(40, 10.0);
        let res = analyze_slope(&r, &Parcel::rect(5.0, 5.0, 35.0, 35.0)).unwrap();
        assert_relative_eq!(res.metric(MAX_SLOPE_DEGREES).unwrap(), 10.0, epsilon = 1e-3);
        assert_relative_eq!(res.metric(AVG_SLOPE_DEGREES).unwrap(), 10.0, epsilon = 1e-3);
        assert_eq!(res.status(), SlopeStatus::Review);
        assert!(!res.assessment.is_compliant);
    }

    #[test]
    fn steep_ramp_is_susceptible() {
        let r = make_ramp(40, 25.0);
        let res = analyze_slope(&r, &Parcel::rect(5.0, 5.0, 35.0, 35.0)).unwrap();
        assert_eq!(res.status(), SlopeStatus::Susceptible);
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(classify_slope(5.0), SlopeStatus::Safe);
        assert_eq!(classify_slope(5.000_001), SlopeStatus::Review);
        assert_eq!(classify_slope(15.0), SlopeStatus::Review);
        assert_eq!(classify_slope(15.000_001), SlopeStatus::Susceptible);
        assert_eq!(classify_slope(0.0), SlopeStatus::Safe);
    }

    #[test]
    fn slope_uses_neighbours_outside_the_parcel() {
        // Single-cell parcel in the middle of a ramp still sees the ramp.
        let r = make_ramp(10, 20.0);
        let slopes = parcel_slopes(&r, &Parcel::rect(4.9, 4.9, 6.1, 6.1));
        assert_eq!(slopes.len(), 1);
        assert_relative_eq!(slopes[0], 20.0, epsilon = 1e-3);
    }

    #[test]
    fn parcel_outside_raster_is_no_valid_data() {
        let r = make_ramp(10, 5.0);
        let err = analyze_slope(&r, &Parcel::rect(50.0, 50.0, 60.0, 60.0)).unwrap_err();
        assert_eq!(err, AnalysisError::NoValidData("slope"));
    }

    #[test]
    fn all_nodata_parcel_is_no_valid_data() {
        let t = AffineTransform::from_origin(0.0, 5.0, 1.0, 1.0);
        let r = RasterWindow::new(5, 5, t, Some(-9999.0), -9999.0).unwrap();
        assert!(analyze_slope(&r, &Parcel::rect(0.0, 0.0, 5.0, 5.0)).is_err());
    }

    #[test]
    fn deterministic() {
        let r = make_ramp(24, 12.0);
        let site = Parcel::rect(3.0, 3.0, 20.0, 17.0);
        assert_eq!(analyze_slope(&r, &site).unwrap(), analyze_slope(&r, &site).unwrap());
    }
}
