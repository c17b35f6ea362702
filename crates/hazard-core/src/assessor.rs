//! Assessment pipeline: locate DEM → load → slope → runout → verdict →
//! optional phase 2.
use std::path::Path;

use anyhow::{Context, Result};
use geo::BoundingRect;
use serde::{Deserialize, Serialize};

use crate::analysis::{analyze_runout, analyze_slope};
use crate::classification::{Outcome, RunoutStatus, SlopeStatus};
use crate::compliance::{aggregate, OverallStatus};
use crate::config::AssessmentConfig;
use crate::geometry::Parcel;
use crate::geotiff::read_geotiff;
use crate::hybrid::{HybridModel, HybridOutcome, UnavailableHybridModel};
use crate::raster::RasterWindow;
use crate::source::{validate_resolution, DemLocator, DemSourceKind};

/// Pixels finer than this look like degrees rather than metres.
const GEOGRAPHIC_PIXEL_HINT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMode {
    #[default]
    Compliance,
    /// Compliance plus the phase 2 hybrid model.
    Research,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadOptions {
    pub mode: AssessmentMode,
}

/// One parcel to assess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPayload {
    #[serde(default)]
    pub project_id: Option<String>,
    /// GeoJSON Polygon/MultiPolygon, bare or wrapped in a Feature.
    pub geometry: serde_json::Value,
    #[serde(default)]
    pub config: PayloadOptions,
}

impl AssessmentPayload {
    pub fn parcel(&self) -> Result<Parcel> {
        Parcel::from_geojson_value(self.geometry.clone()).with_context(|| {
            format!(
                "Invalid site geometry for project {}",
                self.project_id.as_deref().unwrap_or("<unnamed>")
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase1Compliance {
    pub slope_stability: Outcome<SlopeStatus>,
    pub depositional_hazard: Outcome<RunoutStatus>,
    pub overall_status: OverallStatus,
}

/// Pixel size of the DEM used, checked against `max_review_resolution_m`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemResolution {
    pub resolution: String,
    pub high_resolution: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub project_id: Option<String>,
    pub data_source: DemSourceKind,
    pub dem_resolution: DemResolution,
    pub phase_1_compliance: Phase1Compliance,
    pub phase_2_scientific: Option<HybridOutcome>,
}

/// Runs assessments against a fixed configuration and hybrid backend.
pub struct Assessor {
    config: AssessmentConfig,
    locator: DemLocator,
    hybrid: Box<dyn HybridModel>,
}

impl Assessor {
    pub fn new(config: AssessmentConfig, hybrid: Box<dyn HybridModel>) -> Self {
        let locator = DemLocator::new(&config);
        Self {
            config,
            locator,
            hybrid,
        }
    }

    /// Assessor with no hybrid backend; research mode skips phase 2.
    pub fn compliance_only(config: AssessmentConfig) -> Self {
        Self::new(config, Box::new(UnavailableHybridModel))
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Locate and load the DEM for the payload, then assess.
    pub fn run(&self, payload: &AssessmentPayload) -> Result<AssessmentReport> {
        let parcel = payload.parcel()?;
        let rect = parcel
            .polygon
            .bounding_rect()
            .context("Site geometry is empty")?;
        let bounds = (rect.min().x, rect.min().y, rect.max().x, rect.max().y);

        let (path, kind) = self
            .locator
            .locate(bounds)
            .context("No DEM source available for parcel")?;
        log::info!("Using {kind} DEM {}", path.display());

        let raster = load_dem(&path)?;
        Ok(self.assess(payload, &parcel, &raster, kind))
    }

    /// Assess against a raster the caller already holds.
    pub fn run_with_raster(&self, payload: &AssessmentPayload, raster: &RasterWindow) -> Result<AssessmentReport> {
        let parcel = payload.parcel()?;
        Ok(self.assess(payload, &parcel, raster, DemSourceKind::Supplied))
    }

    /// Assess many parcels. Order of results matches `payloads`.
    #[cfg(feature = "threading")]
    pub fn run_batch(&self, payloads: &[AssessmentPayload]) -> Vec<Result<AssessmentReport>> {
        use rayon::prelude::*;
        payloads.par_iter().map(|p| self.run(p)).collect()
    }

    /// Assess many parcels. Order of results matches `payloads`.
    #[cfg(not(feature = "threading"))]
    pub fn run_batch(&self, payloads: &[AssessmentPayload]) -> Vec<Result<AssessmentReport>> {
        payloads.iter().map(|p| self.run(p)).collect()
    }

    fn assess(
        &self,
        payload: &AssessmentPayload,
        parcel: &Parcel,
        raster: &RasterWindow,
        data_source: DemSourceKind,
    ) -> AssessmentReport {
        let (res_x, res_y) = raster.resolution();
        if res_x < GEOGRAPHIC_PIXEL_HINT || res_y < GEOGRAPHIC_PIXEL_HINT {
            log::warn!(
                "DEM pixel size {res_x}×{res_y} looks geographic; buffer and distances assume metres"
            );
        }
        let (high_resolution, resolution) =
            validate_resolution(raster, self.config.max_review_resolution_m);
        if !high_resolution {
            log::warn!(
                "DEM resolution {resolution} is coarser than {}m; results need manual review",
                self.config.max_review_resolution_m
            );
        }

        let slope: Outcome<SlopeStatus> = analyze_slope(raster, parcel).into();
        let runout: Outcome<RunoutStatus> =
            analyze_runout(raster, parcel, self.config.search_buffer_meters).into();
        if let Outcome::Failed { error } = &slope {
            log::warn!("Slope classifier failed: {error}");
        }
        if let Outcome::Failed { error } = &runout {
            log::warn!("Runout classifier failed: {error}");
        }
        let overall_status = aggregate(&slope, &runout);
        log::info!(
            "Project {}: {overall_status}",
            payload.project_id.as_deref().unwrap_or("<unnamed>")
        );

        let phase_2_scientific: Option<HybridOutcome> = match payload.config.mode {
            AssessmentMode::Research if self.hybrid.is_available() => {
                Some(self.hybrid.evaluate(parcel, raster).into())
            }
            AssessmentMode::Research => {
                log::warn!("Research mode requested but hybrid model '{}' is unavailable", self.hybrid.name());
                None
            }
            AssessmentMode::Compliance => None,
        };

        AssessmentReport {
            project_id: payload.project_id.clone(),
            data_source,
            dem_resolution: DemResolution {
                resolution,
                high_resolution,
            },
            phase_1_compliance: Phase1Compliance {
                slope_stability: slope,
                depositional_hazard: runout,
                overall_status,
            },
            phase_2_scientific,
        }
    }
}

/// Load a DEM from GeoTIFF, or from serialised JSON when the extension is `.json`.
pub fn load_dem(path: &Path) -> Result<RasterWindow> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse DEM JSON {}", path.display()));
    }
    read_geotiff(path).with_context(|| format!("Failed to read DEM {}", path.display()))
}
