use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CandidateRecord, LookupStatus, ProfileEvidence, ScoreResult, TrustVerdict, VerdictStatus};
use crate::pipeline::stage::CandidateStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Flagged,
    UnverifiablePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: CandidateStage,
    pub message: String,
}

/// Everything the pipeline learned about one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Position in the input.
    pub index: usize,
    pub candidate: CandidateRecord,
    pub evidence: Option<ProfileEvidence>,
    pub lookup: LookupStatus,
    pub verdict: TrustVerdict,
    pub score: Option<ScoreResult>,
    pub stage: CandidateStage,
    pub skip_reason: Option<SkipReason>,
    pub failure: Option<StageFailure>,
    pub notes: Vec<String>,
}

impl PipelineOutcome {
    /// Outcome for a candidate whose task died before producing one.
    pub fn aborted(index: usize, candidate: CandidateRecord, error: AppError) -> Self {
        Self {
            index,
            candidate,
            evidence: None,
            lookup: LookupStatus::Failed {
                reason: "candidate task aborted".to_string(),
            },
            verdict: TrustVerdict::unverifiable("Processing aborted before the trust check completed."),
            score: None,
            stage: CandidateStage::Error,
            skip_reason: None,
            failure: Some(StageFailure {
                stage: CandidateStage::Pending,
                message: error.to_string(),
            }),
            notes: Vec::new(),
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.stage == CandidateStage::Done && self.score.is_some()
    }

    pub fn composite(&self) -> Option<f64> {
        self.score.as_ref().map(|s| s.composite)
    }

    /// Short status for log lines.
    pub fn status_line(&self) -> String {
        match (&self.failure, &self.score, self.skip_reason) {
            (Some(failure), _, _) => format!("FAILED at {}: {}", failure.stage.label(), failure.message),
            (None, Some(score), _) => format!("score {:.0}, verdict {:?}", score.percent(), self.verdict.status),
            (None, None, Some(SkipReason::Flagged)) => {
                format!("flagged (severity {:.1}), not scored", self.verdict.aggregate_severity)
            }
            (None, None, Some(SkipReason::UnverifiablePolicy)) => "unverifiable, not scored".to_string(),
            (None, None, None) => format!("{:?}", self.stage),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub scored: usize,
    pub trusted: usize,
    pub flagged: usize,
    pub unverifiable: usize,
    pub unscored_by_policy: usize,
    pub errored: usize,
}

/// One screening run: outcomes in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_secs", serialize_with = "secs_f64")]
    pub elapsed: Duration,
    pub outcomes: Vec<PipelineOutcome>,
}

fn secs_f64<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl ScreeningRun {
    /// Scored candidates, composite descending, ties by input order.
    pub fn ranked(&self) -> Vec<&PipelineOutcome> {
        let mut ranked: Vec<&PipelineOutcome> = self.outcomes.iter().filter(|o| o.is_ranked()).collect();
        ranked.sort_by(|a, b| {
            b.composite()
                .unwrap_or(0.0)
                .total_cmp(&a.composite().unwrap_or(0.0))
                .then(a.index.cmp(&b.index))
        });
        ranked
    }

    pub fn flagged(&self) -> Vec<&PipelineOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.skip_reason == Some(SkipReason::Flagged))
            .collect()
    }

    pub fn unscored(&self) -> Vec<&PipelineOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.skip_reason == Some(SkipReason::UnverifiablePolicy))
            .collect()
    }

    pub fn errored(&self) -> Vec<&PipelineOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.stage == CandidateStage::Error)
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        let count = |status: VerdictStatus| self.outcomes.iter().filter(|o| o.verdict.status == status).count();
        RunSummary {
            total: self.outcomes.len(),
            scored: self.outcomes.iter().filter(|o| o.is_ranked()).count(),
            trusted: count(VerdictStatus::Trusted),
            flagged: count(VerdictStatus::Flagged),
            unverifiable: count(VerdictStatus::Unverifiable),
            unscored_by_policy: self.unscored().len(),
            errored: self.errored().len(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::{DimensionScores, FitTier};

    pub fn scored(index: usize, name: &str, composite: f64) -> PipelineOutcome {
        PipelineOutcome {
            index,
            candidate: CandidateRecord {
                name: name.to_string(),
                ..Default::default()
            },
            evidence: None,
            lookup: LookupStatus::SearchDisabled,
            verdict: TrustVerdict::unverifiable("No public profile evidence was found."),
            score: Some(ScoreResult {
                dimensions: DimensionScores::default(),
                composite,
                tier: FitTier::from_composite(composite),
                rationale: format!("{name} rationale"),
                strengths: vec!["Rust".to_string()],
                concerns: vec![],
                scorer_backend: "keyword".to_string(),
            }),
            stage: CandidateStage::Done,
            skip_reason: None,
            failure: None,
            notes: vec![],
        }
    }

    pub fn skipped(index: usize, name: &str, reason: SkipReason) -> PipelineOutcome {
        let mut outcome = scored(index, name, 0.0);
        outcome.score = None;
        outcome.skip_reason = Some(reason);
        if reason == SkipReason::Flagged {
            outcome.verdict.status = VerdictStatus::Flagged;
            outcome.verdict.aggregate_severity = 6.0;
        }
        outcome
    }

    pub fn errored(index: usize, name: &str) -> PipelineOutcome {
        let mut outcome = scored(index, name, 0.0);
        outcome.score = None;
        outcome.stage = CandidateStage::Error;
        outcome.failure = Some(StageFailure {
            stage: CandidateStage::Scoring,
            message: "LLM error: boom".to_string(),
        });
        outcome
    }

    pub fn run(outcomes: Vec<PipelineOutcome>) -> ScreeningRun {
        ScreeningRun {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1500),
            outcomes,
        }
    }
}
