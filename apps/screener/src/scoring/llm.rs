use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{complete_json, LanguageModel};
use crate::models::candidate::numbered;
use crate::models::null_as_default;
use crate::models::{
    CandidateRecord, DimensionScores, Education, Experience, JobDescription, ProfileEvidence, ScoreResult,
};
use crate::scoring::prompts::{SCORING_PROMPT, SCORING_ROLE};
use crate::scoring::{assemble_score, RelevanceScorer, ScoringWeights};

/// Semantic relevance scorer via Claude. Dimensions come back on a 0 – 100 scale
/// and are normalised; the composite always uses the configured weights.
pub struct LlmRelevanceScorer {
    llm: Arc<dyn LanguageModel>,
    weights: ScoringWeights,
}

impl LlmRelevanceScorer {
    pub fn new(llm: Arc<dyn LanguageModel>, weights: ScoringWeights) -> Self {
        Self { llm, weights }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScoringReply {
    #[serde(deserialize_with = "null_as_default")]
    skills_match: f64,
    #[serde(deserialize_with = "null_as_default")]
    experience_relevance: f64,
    #[serde(deserialize_with = "null_as_default")]
    seniority_fit: f64,
    #[serde(deserialize_with = "null_as_default")]
    education_fit: f64,
    rationale: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    strengths: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    concerns: Vec<String>,
}

#[async_trait]
impl RelevanceScorer for LlmRelevanceScorer {
    async fn score(
        &self,
        candidate: &CandidateRecord,
        evidence: Option<&ProfileEvidence>,
        job: &JobDescription,
    ) -> Result<ScoreResult, AppError> {
        let prompt = build_scoring_prompt(candidate, evidence, job);
        let reply: ScoringReply = complete_json(self.llm.as_ref(), &prompt, &system_prompt(SCORING_ROLE))
            .await
            .map_err(|e| AppError::Llm(format!("relevance scoring failed: {e}")))?;

        let dimensions = DimensionScores {
            skills_match: normalize(reply.skills_match),
            experience_relevance: normalize(reply.experience_relevance),
            seniority_fit: normalize(reply.seniority_fit),
            education_fit: normalize(reply.education_fit),
        };

        Ok(assemble_score(
            dimensions,
            &self.weights,
            reply.rationale,
            reply.strengths,
            reply.concerns,
            self.backend(),
        ))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// 0 – 100 → 0.0 – 1.0. NaN counts as zero.
fn normalize(raw: f64) -> f64 {
    if raw.is_finite() {
        (raw / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none stated)".to_string();
    }
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

fn build_scoring_prompt(
    candidate: &CandidateRecord,
    evidence: Option<&ProfileEvidence>,
    job: &JobDescription,
) -> String {
    let mut job_block = format!("Title: {}\n", job.display_title());
    if let Some(level) = job.target_seniority() {
        job_block.push_str(&format!("Seniority: {}\n", level.label()));
    }
    if let Some(years) = job.min_years {
        job_block.push_str(&format!("Minimum years of experience: {years}\n"));
    }
    if let Some(level) = job.education_level {
        job_block.push_str(&format!("Education requirement: {level:?}\n"));
    }
    job_block.push_str(&format!("Required skills:\n{}\n", bullet_list(&job.required_skills)));
    job_block.push_str(&format!("Requirements:\n{}\n", bullet_list(&job.requirements)));
    job_block.push_str(&format!("\nFull text:\n{}", job.text.trim()));

    let skills = candidate.skills.iter().cloned().collect::<Vec<_>>().join(", ");
    let candidate_block = format!(
        "- Headline: {}\n- Summary: {}\n- Skills: {}\n- Keywords: {}\n- Experiences:\n{}\n- Education:\n{}",
        candidate.headline,
        candidate.summary,
        skills,
        candidate.keywords,
        numbered(&candidate.experiences, Experience::one_line),
        numbered(&candidate.education, Education::one_line),
    );

    let evidence_block = match evidence {
        Some(e) => format!(
            "- Experiences:\n{}\n- Education:\n{}",
            numbered(&e.experiences, Experience::one_line),
            numbered(&e.education, Education::one_line),
        ),
        None => "(not available; rely on the application only)".to_string(),
    };

    SCORING_PROMPT
        .replace("{job_block}", &job_block)
        .replace("{candidate_block}", &candidate_block)
        .replace("{evidence_block}", &evidence_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedLlm;
    use crate::models::FitTier;

    fn job() -> JobDescription {
        JobDescription {
            text: "We need a Rust engineer.".to_string(),
            title: Some("Rust Engineer".to_string()),
            required_skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_scale() {
        assert_eq!(normalize(75.0), 0.75);
        assert_eq!(normalize(140.0), 1.0);
        assert_eq!(normalize(-5.0), 0.0);
        assert_eq!(normalize(f64::NAN), 0.0);
    }

    #[test]
    fn test_prompt_includes_job_and_evidence() {
        let evidence = ProfileEvidence {
            experiences: vec![Experience {
                title: "Engineer".to_string(),
                employer: "Oxide".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let prompt = build_scoring_prompt(&CandidateRecord::default(), Some(&evidence), &job());
        assert!(prompt.contains("Title: Rust Engineer"));
        assert!(prompt.contains("- Rust"));
        assert!(prompt.contains("Engineer at Oxide"));
        assert!(!prompt.contains("{evidence_block}"));
    }

    #[tokio::test]
    async fn test_composite_uses_local_weights() {
        let llm = Arc::new(ScriptedLlm::replying(&[r#"{
            "skills_match": 100,
            "experience_relevance": 50,
            "seniority_fit": 100,
            "education_fit": 0,
            "rationale": "Solid Rust background.",
            "strengths": ["Rust"],
            "concerns": ["No degree"]
        }"#]));
        let scorer = LlmRelevanceScorer::new(llm, ScoringWeights::default());
        let result = scorer.score(&CandidateRecord::default(), None, &job()).await.unwrap();
        assert!((result.composite - 0.75).abs() < 1e-9);
        assert_eq!(result.rationale, "Solid Rust background.");
        assert_eq!(result.scorer_backend, "llm");
    }

    #[tokio::test]
    async fn test_missing_rationale_is_generated() {
        let llm = Arc::new(ScriptedLlm::replying(&[r#"{"skills_match": 10}"#]));
        let scorer = LlmRelevanceScorer::new(llm, ScoringWeights::default());
        let result = scorer.score(&CandidateRecord::default(), None, &job()).await.unwrap();
        assert_eq!(result.tier, FitTier::Poor);
        assert!(!result.rationale.is_empty());
    }

    #[tokio::test]
    async fn test_null_rationale_and_lists_are_tolerated() {
        let llm = Arc::new(ScriptedLlm::replying(&[r#"{
            "skills_match": 80,
            "experience_relevance": null,
            "seniority_fit": 60,
            "education_fit": 40,
            "rationale": null,
            "strengths": null,
            "concerns": ["Short tenure"]
        }"#]));
        let scorer = LlmRelevanceScorer::new(llm, ScoringWeights::default());
        let result = scorer.score(&CandidateRecord::default(), None, &job()).await.unwrap();
        assert_eq!(result.dimensions.experience_relevance, 0.0);
        assert!(result.strengths.is_empty());
        assert!(result.rationale.contains("Short tenure"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_error() {
        let scorer = LlmRelevanceScorer::new(Arc::new(ScriptedLlm::failing(500)), ScoringWeights::default());
        let result = scorer.score(&CandidateRecord::default(), None, &job()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
