use serde::{Deserialize, Serialize};

use crate::models::candidate::{Education, Experience};

/// Professional history recovered from public sources for one candidate.
/// Owned by the run and attached to the candidate's outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileEvidence {
    pub profile_url: Option<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    /// 0.0 – 1.0: how sure the extraction is that the profile belongs to this person.
    pub confidence: f32,
    pub summary: Option<String>,
    /// URLs of the search hits the extraction looked at.
    pub sources: Vec<String>,
}

/// Why evidence is present or absent for a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupStatus {
    Matched,
    /// Search returned pages but none of them was this person's profile.
    NoMatch,
    /// Search ran and returned zero results.
    NoResults,
    /// No search credential configured; enrichment is off for the whole run.
    SearchDisabled,
    Failed { reason: String },
}

impl LookupStatus {
    pub fn describe(&self) -> String {
        match self {
            LookupStatus::Matched => "profile matched".to_string(),
            LookupStatus::NoMatch => "no matching profile in search results".to_string(),
            LookupStatus::NoResults => "web search returned no results".to_string(),
            LookupStatus::SearchDisabled => "web search disabled (no credential)".to_string(),
            LookupStatus::Failed { reason } => format!("evidence lookup failed: {reason}"),
        }
    }
}
