use serde::{Deserialize, Serialize};

use crate::models::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Trusted,
    Flagged,
    /// No usable profile evidence. Not an accusation: flagging needs a positive mismatch.
    Unverifiable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
}

impl Severity {
    /// Contribution to the aggregate severity. Major outweighs any single minor finding.
    pub fn weight(self) -> f32 {
        match self {
            Severity::Minor => 1.0,
            Severity::Major => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    InflatedTitle,
    UnknownEmployer,
    DateInconsistency,
    EducationMismatch,
    #[serde(other)]
    Other,
}

impl DiscrepancyKind {
    pub fn label(self) -> &'static str {
        match self {
            DiscrepancyKind::InflatedTitle => "inflated title",
            DiscrepancyKind::UnknownEmployer => "unknown employer",
            DiscrepancyKind::DateInconsistency => "date inconsistency",
            DiscrepancyKind::EducationMismatch => "education mismatch",
            DiscrepancyKind::Other => "other",
        }
    }
}

/// One mismatch between what the applicant claims and what the evidence shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    /// Which claim is affected, e.g. `experiences[0].title`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub claimed: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub observed: String,
    pub severity: Severity,
}

impl Discrepancy {
    pub fn describe(&self) -> String {
        format!(
            "{} ({:?}): claimed \"{}\", evidence shows \"{}\"",
            self.kind.label(),
            self.severity,
            self.claimed,
            self.observed
        )
    }
}

/// Sum of severity weights. Never decreases when a finding is added or upgraded.
pub fn aggregate_severity(discrepancies: &[Discrepancy]) -> f32 {
    discrepancies.iter().map(|d| d.severity.weight()).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustVerdict {
    pub status: VerdictStatus,
    pub discrepancies: Vec<Discrepancy>,
    pub aggregate_severity: f32,
    pub summary: Option<String>,
}

impl TrustVerdict {
    pub fn unverifiable(summary: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Unverifiable,
            discrepancies: vec![],
            aggregate_severity: 0.0,
            summary: Some(summary.into()),
        }
    }

    /// Flagged when the aggregate strictly exceeds `flag_threshold`; otherwise trusted.
    /// Findings are kept either way.
    pub fn from_findings(
        discrepancies: Vec<Discrepancy>,
        flag_threshold: f32,
        summary: Option<String>,
    ) -> Self {
        let aggregate = aggregate_severity(&discrepancies);
        let status = if aggregate > flag_threshold {
            VerdictStatus::Flagged
        } else {
            VerdictStatus::Trusted
        };
        Self {
            status,
            discrepancies,
            aggregate_severity: aggregate,
            summary,
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.status == VerdictStatus::Flagged
    }
}
