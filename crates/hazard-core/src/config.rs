//! Assessment configuration. Every option has a default so an empty JSON
//! object is a valid config.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_SEARCH_BUFFER_M;

/// Which DEM source the locator may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemSourceMode {
    /// Local override, then IfSAR tiles, then the SRTM fallback.
    #[default]
    Auto,
    LocalOverride,
    Ifsar,
    Srtm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub dem_source: DemSourceMode,
    /// Explicit DEM file; wins in `auto` mode when it exists.
    pub local_dem_path: Option<PathBuf>,
    /// Directory of high-resolution IfSAR GeoTIFF tiles.
    pub ifsar_dir: Option<PathBuf>,
    /// Global 30 m SRTM GeoTIFF used when nothing better covers the parcel.
    pub srtm_path: Option<PathBuf>,
    /// Vicinity search radius for the runout peak, in map units (metres).
    pub search_buffer_meters: f64,
    /// Coarsest pixel size (metres) accepted as high resolution.
    pub max_review_resolution_m: f64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            dem_source: DemSourceMode::Auto,
            local_dem_path: None,
            ifsar_dir: None,
            srtm_path: None,
            search_buffer_meters: DEFAULT_SEARCH_BUFFER_M,
            max_review_resolution_m: 5.0,
        }
    }
}

impl AssessmentConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.search_buffer_meters.is_finite() && self.search_buffer_meters >= 0.0,
            "search_buffer_meters must be a non-negative distance, got {}",
            self.search_buffer_meters
        );
        anyhow::ensure!(
            self.max_review_resolution_m > 0.0,
            "max_review_resolution_m must be positive, got {}",
            self.max_review_resolution_m
        );
        Ok(())
    }
}
