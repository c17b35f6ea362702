//! Depositional-zone (debris-flow runout) classification.
//!
//! Geometric reach rule: a parcel is beyond the runout of the highest point
//! in its vicinity when the horizontal distance to that peak exceeds three
//! times the vertical drop from the peak to the parcel's lowest point.
//!
//! ```text
//!   ΔE = z_peak − z_site_min          (may be negative)
//!   H  = |p_site_min − p_peak|        (horizontal, map units)
//!   H > 3·ΔE  →  SAFE (Beyond Runout)
//!   else      →  PRONE (Within Runout Zone)
//! ```
//!
//! The site point is the lowest cell of the parcel rather than its centroid:
//! the lowest point is where an incoming flow ends up.
use std::collections::BTreeMap;

use geo::{Distance, Euclidean};

use crate::classification::{Assessment, RunoutResult, RunoutStatus};
use crate::clip::clip;
use crate::error::AnalysisError;
use crate::geometry::Parcel;
use crate::raster::RasterWindow;
use crate::stats::min_max;

pub const RUNOUT_FACTOR: f64 = 3.0;
pub const DEFAULT_SEARCH_BUFFER_M: f64 = 1000.0;

pub const ELEVATION_PEAK: &str = "elevation_peak";
pub const ELEVATION_SITE: &str = "elevation_site";
pub const DELTA_E: &str = "delta_e";
pub const HORIZONTAL_DISTANCE_H: &str = "horizontal_distance_h";
pub const REQUIRED_RUNOUT_3X: &str = "required_runout_3x";

/// Apply the reach rule to a distance and an elevation drop.
pub fn classify_runout(horizontal_distance: f64, delta_e: f64) -> RunoutStatus {
    if horizontal_distance > RUNOUT_FACTOR * delta_e {
        RunoutStatus::Safe
    } else {
        RunoutStatus::Prone
    }
}

/// Classify depositional hazard for `site`, searching for the hazard source
/// within `search_buffer_m` of the parcel boundary.
///
/// The raster must be in a projected CRS; the buffer and the horizontal
/// distance are taken in raster map units.
pub fn analyze_runout(
    raster: &RasterWindow,
    site: &Parcel,
    search_buffer_m: f64,
) -> Result<RunoutResult, AnalysisError> {
    if !search_buffer_m.is_finite() || search_buffer_m < 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "search buffer must be a non-negative distance, got {search_buffer_m}"
        )));
    }

    let site_sample = clip(raster, site);
    if site_sample.is_empty() {
        return Err(AnalysisError::NoValidData("site elevation"));
    }
    let site_min = min_max(&site_sample, "site")?.min;

    let vicinity = site.buffered(search_buffer_m);
    let vicinity_sample = clip(raster, &vicinity);
    if vicinity_sample.is_empty() {
        return Err(AnalysisError::NoValidData("vicinity elevation"));
    }
    // Locations come from the vicinity window's own cropped transform.
    let peak = min_max(&vicinity_sample, "vicinity")?.max;

    let delta_e = peak.elevation - site_min.elevation;
    let h = Euclidean.distance(site_min.point(), peak.point());
    let required = RUNOUT_FACTOR * delta_e;
    let status = classify_runout(h, delta_e);

    log::debug!(
        "runout: site min {:.2} at {:?}, peak {:.2} at {:?} within {} m",
        site_min.elevation,
        site_min.location,
        peak.elevation,
        peak.location,
        search_buffer_m
    );
    log::info!("runout: H {h:.2}, ΔE {delta_e:.2}, required {required:.2} → {status}");

    Ok(RunoutResult {
        metrics: BTreeMap::from([
            (ELEVATION_PEAK.to_string(), peak.elevation),
            (ELEVATION_SITE.to_string(), site_min.elevation),
            (DELTA_E.to_string(), delta_e),
            (HORIZONTAL_DISTANCE_H.to_string(), h),
            (REQUIRED_RUNOUT_3X.to_string(), required),
        ]),
        assessment: Assessment {
            status,
            is_compliant: status.is_compliant(),
            threshold_used: None,
        },
    })
}
