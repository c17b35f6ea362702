//! Terrain classifiers. Each is a pure function of a raster and a parcel.
mod gradient;
pub mod runout;
pub mod slope;

pub use runout::{analyze_runout, classify_runout, DEFAULT_SEARCH_BUFFER_M};
pub use slope::{analyze_slope, classify_slope};
