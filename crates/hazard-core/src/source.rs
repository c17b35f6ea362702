//! DEM source resolution: pick the best GeoTIFF available for a parcel.
//!
//! Preference in `auto` mode: configured local file, then an IfSAR tile
//! covering the parcel, then the global SRTM fallback.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{AssessmentConfig, DemSourceMode};
use crate::error::SourceError;
use crate::geotiff::read_header;
use crate::raster::RasterWindow;

/// Where the DEM for an assessment came from. Reported as `data_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemSourceKind {
    #[serde(rename = "local_override")]
    LocalOverride,
    #[serde(rename = "ifsar")]
    Ifsar,
    #[serde(rename = "srtm_30m_fallback")]
    SrtmFallback,
    /// Raster handed in by the caller.
    #[serde(rename = "supplied")]
    Supplied,
}

impl DemSourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalOverride => "local_override",
            Self::Ifsar => "ifsar",
            Self::SrtmFallback => "srtm_30m_fallback",
            Self::Supplied => "supplied",
        }
    }
}

impl fmt::Display for DemSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DemLocator {
    mode: DemSourceMode,
    local_dem_path: Option<PathBuf>,
    ifsar_dir: Option<PathBuf>,
    srtm_path: Option<PathBuf>,
}

impl DemLocator {
    pub fn new(config: &AssessmentConfig) -> Self {
        Self {
            mode: config.dem_source,
            local_dem_path: config.local_dem_path.clone(),
            ifsar_dir: config.ifsar_dir.clone(),
            srtm_path: config.srtm_path.clone(),
        }
    }

    /// Resolve a DEM path for parcel `bounds` = `(min_x, min_y, max_x, max_y)`.
    pub fn locate(&self, bounds: (f64, f64, f64, f64)) -> Result<(PathBuf, DemSourceKind), SourceError> {
        match self.mode {
            DemSourceMode::LocalOverride => self.local(),
            DemSourceMode::Ifsar => self.ifsar(bounds),
            DemSourceMode::Srtm => self.srtm(),
            DemSourceMode::Auto => {
                if let Ok(found) = self.local() {
                    return Ok(found);
                }
                match self.ifsar(bounds) {
                    Ok(found) => Ok(found),
                    Err(e) => {
                        log::warn!("High-res IfSAR unavailable ({e}); falling back to global SRTM");
                        self.srtm()
                    }
                }
            }
        }
    }

    fn local(&self) -> Result<(PathBuf, DemSourceKind), SourceError> {
        let path = self
            .local_dem_path
            .as_ref()
            .ok_or(SourceError::Unconfigured("local_override"))?;
        if !path.exists() {
            return Err(SourceError::MissingLocal(path.display().to_string()));
        }
        Ok((path.clone(), DemSourceKind::LocalOverride))
    }

    fn ifsar(&self, bounds: (f64, f64, f64, f64)) -> Result<(PathBuf, DemSourceKind), SourceError> {
        let dir = self.ifsar_dir.as_ref().ok_or(SourceError::Unconfigured("ifsar"))?;
        let mut tiles: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| is_tiff(p))
            .collect();
        tiles.sort();

        for tile in tiles {
            match read_header(&tile) {
                Ok(h) if h.covers(bounds) => {
                    log::info!("IfSAR tile {} covers parcel", tile.display());
                    return Ok((tile, DemSourceKind::Ifsar));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping {} ({e})", tile.display()),
            }
        }
        Err(SourceError::NoIfsarCoverage {
            dir: dir.display().to_string(),
        })
    }

    fn srtm(&self) -> Result<(PathBuf, DemSourceKind), SourceError> {
        let path = self.srtm_path.as_ref().ok_or(SourceError::Unconfigured("srtm"))?;
        if !path.exists() {
            return Err(SourceError::MissingSrtm(path.display().to_string()));
        }
        Ok((path.clone(), DemSourceKind::SrtmFallback))
    }
}

fn is_tiff(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}

/// Whether the raster's pixels are at most `limit_m` on both axes.
/// Returns the verdict and the x resolution formatted as e.g. `"30m"`.
pub fn validate_resolution(raster: &RasterWindow, limit_m: f64) -> (bool, String) {
    let (res_x, res_y) = raster.resolution();
    (res_x <= limit_m && res_y <= limit_m, format!("{res_x}m"))
}
