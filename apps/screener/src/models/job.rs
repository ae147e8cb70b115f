use serde::{Deserialize, Serialize};

use crate::models::levels::{DegreeLevel, SeniorityLevel};

/// The role candidates are scored against. Always supplied as data; nothing in the
/// scorers is specific to one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDescription {
    /// Full free text, passed verbatim to the LLM scorer.
    pub text: String,
    pub title: Option<String>,
    /// Named technologies / competencies, e.g. "Rust", "Kubernetes".
    pub required_skills: Vec<String>,
    /// Requirement sentences, e.g. "5+ years building distributed systems".
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub seniority: Option<SeniorityLevel>,
    pub min_years: Option<u32>,
    pub education_level: Option<DegreeLevel>,
}

impl JobDescription {
    /// Seniority stated explicitly, otherwise inferred from the title.
    pub fn target_seniority(&self) -> Option<SeniorityLevel> {
        self.seniority
            .or_else(|| self.title.as_deref().and_then(SeniorityLevel::from_title))
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled role")
    }
}
