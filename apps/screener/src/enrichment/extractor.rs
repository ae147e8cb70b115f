use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::enrichment::prompts::{MAX_HIT_CHARS, PROFILE_EXTRACTION_PROMPT, PROFILE_EXTRACTION_ROLE};
use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, EVIDENCE_INSTRUCTION};
use crate::llm_client::{complete_json, LanguageModel};
use crate::models::candidate::{numbered, CandidateRecord, Education, Experience};
use crate::models::null_as_default;
use crate::search::SearchHit;

/// Structured reading of a set of search hits.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractedProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub found: bool,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub experiences: Vec<Experience>,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    pub summary: Option<String>,
}

impl ExtractedProfile {
    /// Confidence in 0.0 – 1.0. Values above 2 are read as percentages, values just over 1
    /// are clamped; NaN counts as no confidence.
    pub fn normalized_confidence(&self) -> f32 {
        let c = self.confidence;
        if !c.is_finite() || c <= 0.0 {
            0.0
        } else if c > 2.0 {
            (c / 100.0).min(1.0)
        } else {
            c.min(1.0)
        }
    }
}

/// Text-understanding capability that turns raw hits into a profile.
#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(
        &self,
        candidate: &CandidateRecord,
        hits: &[SearchHit],
    ) -> Result<ExtractedProfile, AppError>;
}

pub struct LlmProfileExtractor {
    llm: Arc<dyn LanguageModel>,
}

impl LlmProfileExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ProfileExtractor for LlmProfileExtractor {
    async fn extract(
        &self,
        candidate: &CandidateRecord,
        hits: &[SearchHit],
    ) -> Result<ExtractedProfile, AppError> {
        let prompt = build_extraction_prompt(candidate, hits);
        complete_json::<ExtractedProfile>(
            self.llm.as_ref(),
            &prompt,
            &system_prompt(PROFILE_EXTRACTION_ROLE),
        )
        .await
        .map_err(|e| AppError::Llm(format!("profile extraction failed: {e}")))
    }
}

fn build_extraction_prompt(candidate: &CandidateRecord, hits: &[SearchHit]) -> String {
    let candidate_block = format!(
        "- Name: {}\n- Headline: {}\n- Location: {}\n- LinkedIn URL (from application): {}\n- Experiences:\n{}\n- Education:\n{}",
        candidate.name,
        candidate.headline,
        candidate.location.as_deref().unwrap_or("not provided"),
        candidate.linkedin_url().unwrap_or("not provided"),
        numbered(&candidate.experiences, Experience::one_line),
        numbered(&candidate.education, Education::one_line),
    );

    let search_results = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[{}] {} <{}>\n{}",
                i + 1,
                hit.title,
                hit.url,
                truncate_chars(&hit.content, MAX_HIT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    PROFILE_EXTRACTION_PROMPT
        .replace("{candidate_block}", &candidate_block)
        .replace("{search_results}", &search_results)
        .replace("{evidence_instruction}", EVIDENCE_INSTRUCTION)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
