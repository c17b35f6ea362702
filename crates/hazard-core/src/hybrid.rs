//! Phase 2 "hybrid" stability model seam: a physics factor-of-safety estimate
//! corrected by a learned residual.
//!
//! No real physics or ML backend ships with the engine. Callers inject a
//! [`HybridModel`]; [`FixedHybridModel`] returns calibrated constants and
//! [`UnavailableHybridModel`] reports itself as absent so phase 2 is skipped.
use serde::{Deserialize, Serialize};

use crate::error::HybridError;
use crate::geometry::Parcel;
use crate::raster::RasterWindow;

/// Factor of safety above which the hybrid verdict is SAFE.
pub const FOS_SAFE_ABOVE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HybridVerdict {
    Safe,
    Unsafe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridResult {
    pub physics_fos: f64,
    pub ml_correction: f64,
    pub final_fos: f64,
    pub assessment: HybridVerdict,
    pub note: String,
}

impl HybridResult {
    pub fn from_components(physics_fos: f64, ml_correction: f64, note: impl Into<String>) -> Self {
        let final_fos = physics_fos + ml_correction;
        Self {
            physics_fos,
            ml_correction,
            final_fos,
            assessment: if final_fos > FOS_SAFE_ABOVE {
                HybridVerdict::Safe
            } else {
                HybridVerdict::Unsafe
            },
            note: note.into(),
        }
    }
}

/// Phase 2 result or the reason it failed; serialises as `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HybridOutcome {
    Evaluated(HybridResult),
    Failed { error: String },
}

impl From<Result<HybridResult, HybridError>> for HybridOutcome {
    fn from(r: Result<HybridResult, HybridError>) -> Self {
        match r {
            Ok(v) => Self::Evaluated(v),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

pub trait HybridModel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a usable backend is present. Phase 2 is skipped otherwise.
    fn is_available(&self) -> bool;

    fn evaluate(&self, site: &Parcel, raster: &RasterWindow) -> Result<HybridResult, HybridError>;
}

/// Returns fixed physics and correction terms regardless of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedHybridModel {
    pub physics_fos: f64,
    pub ml_correction: f64,
}

impl Default for FixedHybridModel {
    fn default() -> Self {
        Self {
            physics_fos: 1.2,
            ml_correction: -0.1,
        }
    }
}

impl HybridModel for FixedHybridModel {
    fn name(&self) -> &str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn evaluate(&self, _site: &Parcel, _raster: &RasterWindow) -> Result<HybridResult, HybridError> {
        if !self.physics_fos.is_finite() {
            return Err(HybridError::Physics(format!("non-finite factor of safety {}", self.physics_fos)));
        }
        if !self.ml_correction.is_finite() {
            return Err(HybridError::Ml(format!("non-finite correction {}", self.ml_correction)));
        }
        Ok(HybridResult::from_components(
            self.physics_fos,
            self.ml_correction,
            "Output generated using HYBRID (Physics + ML) logic.",
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableHybridModel;

impl HybridModel for UnavailableHybridModel {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn evaluate(&self, _site: &Parcel, _raster: &RasterWindow) -> Result<HybridResult, HybridError> {
        Err(HybridError::Physics("no hybrid backend installed".into()))
    }
}
