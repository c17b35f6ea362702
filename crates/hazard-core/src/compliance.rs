//! Phase 1 compliance verdict from the two classifier outcomes.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classification::{Outcome, RunoutStatus, SlopeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "CERTIFIED SAFE")]
    CertifiedSafe,
    #[serde(rename = "MANUAL REVIEW REQUIRED")]
    ManualReview,
    #[serde(rename = "NOT CERTIFIED")]
    NotCertified,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CertifiedSafe => "CERTIFIED SAFE",
            Self::ManualReview => "MANUAL REVIEW REQUIRED",
            Self::NotCertified => "NOT CERTIFIED",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict table. `None` is a classifier that failed (UNKNOWN): it can never
/// certify, but a hard failure on the other axis still wins.
///
/// | slope \ runout | Safe      | Prone | None      |
/// |----------------|-----------|-------|-----------|
/// | Safe           | CERTIFIED | NOT   | REVIEW    |
/// | Review         | REVIEW    | NOT   | REVIEW    |
/// | Susceptible    | NOT       | NOT   | NOT       |
/// | None           | REVIEW    | NOT   | REVIEW    |
pub fn overall_status(slope: Option<SlopeStatus>, runout: Option<RunoutStatus>) -> OverallStatus {
    use OverallStatus::*;
    match (slope, runout) {
        (Some(SlopeStatus::Susceptible), _) | (_, Some(RunoutStatus::Prone)) => NotCertified,
        (Some(SlopeStatus::Review), _) => ManualReview,
        (None, _) | (_, None) => ManualReview,
        (Some(SlopeStatus::Safe), Some(RunoutStatus::Safe)) => CertifiedSafe,
    }
}

/// Combine a slope outcome and a runout outcome into the overall verdict.
pub fn aggregate(slope: &Outcome<SlopeStatus>, runout: &Outcome<RunoutStatus>) -> OverallStatus {
    overall_status(slope.status(), runout.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{Assessment, ClassificationResult};
    use std::collections::BTreeMap;

    fn outcome<S: Copy>(status: S, compliant: bool) -> Outcome<S> {
        Outcome::Classified(ClassificationResult {
            metrics: BTreeMap::new(),
            assessment: Assessment {
                status,
                is_compliant: compliant,
                threshold_used: None,
            },
        })
    }

    #[test]
    fn slope_failure_dominates_safe_runout() {
        let v = aggregate(
            &outcome(SlopeStatus::Susceptible, false),
            &outcome(RunoutStatus::Safe, true),
        );
        assert_eq!(v, OverallStatus::NotCertified);
    }

    #[test]
    fn both_safe_certifies() {
        let v = aggregate(&outcome(SlopeStatus::Safe, true), &outcome(RunoutStatus::Safe, true));
        assert_eq!(v, OverallStatus::CertifiedSafe);
    }

    #[test]
    fn prone_beats_review() {
        assert_eq!(
            overall_status(Some(SlopeStatus::Review), Some(RunoutStatus::Prone)),
            OverallStatus::NotCertified
        );
        assert_eq!(
            overall_status(Some(SlopeStatus::Review), Some(RunoutStatus::Safe)),
            OverallStatus::ManualReview
        );
    }

    #[test]
    fn unknown_never_certifies() {
        let failed: Outcome<RunoutStatus> = Outcome::Failed {
            error: "no data".into(),
        };
        assert_eq!(
            aggregate(&outcome(SlopeStatus::Safe, true), &failed),
            OverallStatus::ManualReview
        );
        assert_eq!(overall_status(None, Some(RunoutStatus::Safe)), OverallStatus::ManualReview);
        assert_eq!(overall_status(None, None), OverallStatus::ManualReview);
        assert_eq!(overall_status(None, Some(RunoutStatus::Prone)), OverallStatus::NotCertified);
        assert_eq!(
            overall_status(Some(SlopeStatus::Susceptible), None),
            OverallStatus::NotCertified
        );
    }

    #[test]
    fn full_table() {
        let slopes = [
            Some(SlopeStatus::Safe),
            Some(SlopeStatus::Review),
            Some(SlopeStatus::Susceptible),
            None,
        ];
        let runouts = [Some(RunoutStatus::Safe), Some(RunoutStatus::Prone), None];
        let mut certified = 0;
        for s in slopes {
            for r in runouts {
                if overall_status(s, r) == OverallStatus::CertifiedSafe {
                    certified += 1;
                }
            }
        }
        assert_eq!(certified, 1, "only SAFE/SAFE may certify");
    }
}
