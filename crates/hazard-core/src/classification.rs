//! Classifier output records and status enums.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Slope stability class, evaluated on the maximum slope in the parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlopeStatus {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "FLAG FOR REVIEW")]
    Review,
    #[serde(rename = "SUSCEPTIBLE")]
    Susceptible,
}

impl SlopeStatus {
    pub fn is_compliant(self) -> bool {
        matches!(self, Self::Safe)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Review => "FLAG FOR REVIEW",
            Self::Susceptible => "SUSCEPTIBLE",
        }
    }
}

/// Depositional (runout) hazard class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunoutStatus {
    #[serde(rename = "SAFE (Beyond Runout)")]
    Safe,
    #[serde(rename = "PRONE (Within Runout Zone)")]
    Prone,
}

impl RunoutStatus {
    pub fn is_compliant(self) -> bool {
        matches!(self, Self::Safe)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE (Beyond Runout)",
            Self::Prone => "PRONE (Within Runout Zone)",
        }
    }
}

impl fmt::Display for SlopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RunoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment<S> {
    pub status: S,
    pub is_compliant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_used: Option<String>,
}

/// Metrics plus verdict of one classifier. Metric keys are stable wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult<S> {
    pub metrics: BTreeMap<String, f64>,
    pub assessment: Assessment<S>,
}

impl<S: Copy> ClassificationResult<S> {
    pub fn status(&self) -> S {
        self.assessment.status
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

pub type SlopeResult = ClassificationResult<SlopeStatus>;
pub type RunoutResult = ClassificationResult<RunoutStatus>;

/// A classifier's result, or the reason it could not produce one.
/// Serialises as the result itself or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<S> {
    Classified(ClassificationResult<S>),
    Failed { error: String },
}

impl<S: Copy> Outcome<S> {
    /// Status of a successful classification; None when the classifier failed.
    pub fn status(&self) -> Option<S> {
        match self {
            Self::Classified(r) => Some(r.status()),
            Self::Failed { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&ClassificationResult<S>> {
        match self {
            Self::Classified(r) => Some(r),
            Self::Failed { .. } => None,
        }
    }
}

impl<S> From<Result<ClassificationResult<S>, AnalysisError>> for Outcome<S> {
    fn from(r: Result<ClassificationResult<S>, AnalysisError>) -> Self {
        match r {
            Ok(res) => Self::Classified(res),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(SlopeStatus::Review).unwrap(), json!("FLAG FOR REVIEW"));
        assert_eq!(
            serde_json::to_value(RunoutStatus::Prone).unwrap(),
            json!("PRONE (Within Runout Zone)")
        );
        for s in [SlopeStatus::Safe, SlopeStatus::Review, SlopeStatus::Susceptible] {
            assert_eq!(serde_json::to_value(s).unwrap(), json!(s.to_string()));
        }
    }

    #[test]
    fn failed_outcome_serialises_as_error_object() {
        let o: Outcome<SlopeStatus> = Err(AnalysisError::NoValidData("slope")).into();
        assert_eq!(o.status(), None);
        assert_eq!(
            serde_json::to_value(&o).unwrap(),
            json!({"error": "no valid slope data in parcel"})
        );
    }

    #[test]
    fn classified_outcome_serialises_flat() {
        let r = ClassificationResult {
            metrics: BTreeMap::from([("max_slope_degrees".to_string(), 3.0)]),
            assessment: Assessment {
                status: SlopeStatus::Safe,
                is_compliant: true,
                threshold_used: Some("max_slope".into()),
            },
        };
        let o = Outcome::Classified(r);
        assert_eq!(
            serde_json::to_value(&o).unwrap(),
            json!({
                "metrics": {"max_slope_degrees": 3.0},
                "assessment": {"status": "SAFE", "is_compliant": true, "threshold_used": "max_slope"}
            })
        );
        let back: Outcome<SlopeStatus> = serde_json::from_value(serde_json::to_value(&o).unwrap()).unwrap();
        assert_eq!(back, o);
    }
}
