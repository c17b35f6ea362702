//! Typed errors for each layer of the engine.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("grid holds {actual} cells, expected {expected}")]
    Shape { expected: usize, actual: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("affine transform is not invertible")]
    SingularTransform,
    #[error("GeoTIFF carries no georeferencing (ModelPixelScale/ModelTiepoint or ModelTransformation)")]
    MissingGeoreference,
    #[error("unsupported GeoTIFF: {0}")]
    Unsupported(String),
    #[error("TIFF decode failed: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
    #[error("expected a Polygon or MultiPolygon geometry, got {0}")]
    NotPolygonal(String),
    #[error("parcel has no geometry")]
    Missing,
}

impl From<geojson::Error> for GeometryError {
    fn from(e: geojson::Error) -> Self {
        Self::GeoJson(Box::new(e))
    }
}

/// Failures inside a classifier. These are captured into the report rather
/// than aborting the assessment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("no valid elevation data found inside the {0} geometry")]
    EmptySample(&'static str),
    #[error("no valid {0} data in parcel")]
    NoValidData(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("configured local DEM {0} does not exist")]
    MissingLocal(String),
    #[error("no IfSAR tile in {dir} covers the parcel bounds")]
    NoIfsarCoverage { dir: String },
    #[error("SRTM fallback DEM {0} does not exist")]
    MissingSrtm(String),
    #[error("no DEM source configured for {0}")]
    Unconfigured(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HybridError {
    #[error("physics engine failed: {0}")]
    Physics(String),
    #[error("ML engine failed: {0}")]
    Ml(String),
}
