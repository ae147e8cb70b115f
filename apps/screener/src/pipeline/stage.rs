use serde::{Deserialize, Serialize};

/// Where a candidate is in the pipeline. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStage {
    Pending,
    EvidenceLookup,
    TrustCheck,
    Scoring,
    Skipped,
    Done,
    Error,
}

impl CandidateStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, CandidateStage::Done | CandidateStage::Error)
    }

    pub fn can_transition_to(self, next: CandidateStage) -> bool {
        use CandidateStage::*;
        matches!(
            (self, next),
            (Pending, EvidenceLookup)
                | (EvidenceLookup, TrustCheck)
                | (TrustCheck, Scoring)
                | (TrustCheck, Skipped)
                | (Scoring, Done)
                | (Skipped, Done)
                | (EvidenceLookup, Error)
                | (TrustCheck, Error)
                | (Scoring, Error)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            CandidateStage::Pending => "pending",
            CandidateStage::EvidenceLookup => "evidence_lookup",
            CandidateStage::TrustCheck => "trust_check",
            CandidateStage::Scoring => "scoring",
            CandidateStage::Skipped => "skipped",
            CandidateStage::Done => "done",
            CandidateStage::Error => "error",
        }
    }
}
