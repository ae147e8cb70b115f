//! Consistency Checker: compares self-reported claims against profile evidence and
//! produces a trust verdict.
//!
//! - No evidence, or evidence below the confidence floor → `Unverifiable`, no detector call.
//! - Otherwise a pluggable `DiscrepancyDetector` lists mismatches; the verdict is `Flagged`
//!   when their summed severity exceeds the flag threshold, `Trusted` otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;
use crate::models::{null_as_default, CandidateRecord, Discrepancy, ProfileEvidence, TrustVerdict};

pub mod detectors;
pub mod prompts;

pub use detectors::{HeuristicDetector, LlmDetector};

/// Findings from one detector run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectionReport {
    #[serde(deserialize_with = "null_as_default")]
    pub discrepancies: Vec<Discrepancy>,
    pub summary: Option<String>,
}

/// Implement this to swap detection backends without touching the checker or pipeline.
#[async_trait]
pub trait DiscrepancyDetector: Send + Sync {
    async fn detect(
        &self,
        candidate: &CandidateRecord,
        evidence: &ProfileEvidence,
    ) -> Result<DetectionReport, AppError>;

    fn backend(&self) -> &'static str;
}

pub struct ConsistencyChecker {
    detector: Arc<dyn DiscrepancyDetector>,
    min_confidence: f32,
    flag_threshold: f32,
}

impl ConsistencyChecker {
    pub fn new(detector: Arc<dyn DiscrepancyDetector>, min_confidence: f32, flag_threshold: f32) -> Self {
        Self {
            detector,
            min_confidence,
            flag_threshold,
        }
    }

    pub async fn check(
        &self,
        candidate: &CandidateRecord,
        evidence: Option<&ProfileEvidence>,
    ) -> Result<TrustVerdict, AppError> {
        let Some(evidence) = evidence else {
            return Ok(TrustVerdict::unverifiable("No public profile evidence was found."));
        };

        if evidence.confidence < self.min_confidence {
            return Ok(TrustVerdict::unverifiable(format!(
                "Matched profile confidence {:.2} is below the {:.2} minimum.",
                evidence.confidence, self.min_confidence
            )));
        }

        let report = self.detector.detect(candidate, evidence).await?;
        let verdict = TrustVerdict::from_findings(report.discrepancies, self.flag_threshold, report.summary);

        debug!(
            "{} checked by {} detector: {:?} (severity {:.1})",
            candidate.display_name(),
            self.detector.backend(),
            verdict.status,
            verdict.aggregate_severity
        );

        Ok(verdict)
    }
}
