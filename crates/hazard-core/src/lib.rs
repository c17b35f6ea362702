//! Geotechnical safety assessment of land parcels from a DEM.
//!
//! Two classifiers run over a parcel polygon: slope stability (maximum
//! terrain gradient) and depositional hazard (3× geometric runout rule
//! against the highest point in the vicinity). [`compliance`] folds them into
//! one verdict and [`assessor`] wires DEM lookup, classifiers and the
//! optional hybrid model into a report.
pub mod analysis;
pub mod assessor;
pub mod classification;
pub mod clip;
pub mod compliance;
pub mod config;
pub mod error;
pub mod geometry;
pub mod geotiff;
pub mod hybrid;
pub mod raster;
pub mod source;
pub mod stats;

pub use assessor::{AssessmentPayload, AssessmentReport, Assessor};
pub use classification::{ClassificationResult, Outcome, RunoutStatus, SlopeStatus};
pub use compliance::{aggregate, OverallStatus};
pub use config::AssessmentConfig;
pub use geometry::Parcel;
pub use raster::{AffineTransform, RasterWindow};
