//! Relevance Scorer: pluggable, trait-based scoring of a candidate against a job description.
//!
//! Default: `LlmRelevanceScorer` (Claude rates each dimension, composite computed here).
//! Alternative: `KeywordRelevanceScorer` (pure-Rust, fast, deterministic, fully testable).
//!
//! The pipeline holds an `Arc<dyn RelevanceScorer>`, chosen at startup via config.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{CandidateRecord, DimensionScores, FitTier, JobDescription, ProfileEvidence, ScoreResult};

pub mod keyword;
pub mod llm;
pub mod prompts;

pub use keyword::KeywordRelevanceScorer;
pub use llm::LlmRelevanceScorer;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub skills_match: f64,
    pub experience_relevance: f64,
    pub seniority_fit: f64,
    pub education_fit: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills_match: 0.4,
            experience_relevance: 0.3,
            seniority_fit: 0.2,
            education_fit: 0.1,
        }
    }
}

impl ScoringWeights {
    fn as_array(&self) -> [(&'static str, f64); 4] {
        [
            ("skills_match", self.skills_match),
            ("experience_relevance", self.experience_relevance),
            ("seniority_fit", self.seniority_fit),
            ("education_fit", self.education_fit),
        ]
    }

    /// Weights must be finite, non-negative and sum to 1.0.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, weight) in self.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Config(format!(
                    "scoring weight {name} must be a non-negative number, got {weight}"
                )));
            }
        }
        let sum: f64 = self.as_array().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AppError::Config(format!(
                "scoring weights must sum to 1.0, got {sum:.4}"
            )));
        }
        Ok(())
    }
}

/// Composite: Σ weight × dimension, clamped to 0.0 – 1.0.
pub fn compute_composite(dimensions: &DimensionScores, weights: &ScoringWeights) -> f64 {
    (weights.skills_match * dimensions.skills_match
        + weights.experience_relevance * dimensions.experience_relevance
        + weights.seniority_fit * dimensions.seniority_fit
        + weights.education_fit * dimensions.education_fit)
        .clamp(0.0, 1.0)
}

/// The relevance scorer trait. Implement this to swap backends without touching
/// the pipeline or report code.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// `evidence` is only passed for trusted candidates, to corroborate claims.
    async fn score(
        &self,
        candidate: &CandidateRecord,
        evidence: Option<&ProfileEvidence>,
        job: &JobDescription,
    ) -> Result<ScoreResult, AppError>;

    fn backend(&self) -> &'static str;
}

/// Assembles a `ScoreResult` from raw dimension scores. Dimensions are clamped,
/// the composite is computed locally and an empty rationale is replaced by a generated one.
pub fn assemble_score(
    dimensions: DimensionScores,
    weights: &ScoringWeights,
    rationale: Option<String>,
    strengths: Vec<String>,
    concerns: Vec<String>,
    backend: &str,
) -> ScoreResult {
    let dimensions = dimensions.clamped();
    let composite = compute_composite(&dimensions, weights);
    let tier = FitTier::from_composite(composite);
    let rationale = rationale
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| build_rationale(tier, composite, &strengths, &concerns));

    ScoreResult {
        dimensions,
        composite,
        tier,
        rationale,
        strengths,
        concerns,
        scorer_backend: backend.to_string(),
    }
}

/// Human-readable summary from tier, composite and the top strengths and concerns.
pub fn build_rationale(tier: FitTier, composite: f64, strengths: &[String], concerns: &[String]) -> String {
    let score = (composite * 100.0).round() as u32;
    let mut rationale = format!("{} ({score}/100).", tier.label());

    let top = |items: &[String]| items.iter().take(3).cloned().collect::<Vec<_>>().join("; ");
    if !strengths.is_empty() {
        rationale.push_str(&format!(" Strengths: {}.", top(strengths)));
    }
    if !concerns.is_empty() {
        rationale.push_str(&format!(" Concerns: {}.", top(concerns)));
    }
    if strengths.is_empty() && concerns.is_empty() {
        rationale.push_str(" Not enough information in the application to assess fit.");
    }
    rationale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_is_weighted_sum() {
        let dims = DimensionScores {
            skills_match: 1.0,
            experience_relevance: 0.5,
            seniority_fit: 1.0,
            education_fit: 0.0,
        };
        let composite = compute_composite(&dims, &ScoringWeights::default());
        assert!((composite - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoringWeights {
            skills_match: 0.5,
            ..Default::default()
        };
        assert!(matches!(weights.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = ScoringWeights {
            skills_match: 0.6,
            experience_relevance: -0.1,
            seniority_fit: 0.4,
            education_fit: 0.1,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_assemble_fills_missing_rationale() {
        let result = assemble_score(
            DimensionScores::default(),
            &ScoringWeights::default(),
            Some("   ".to_string()),
            vec![],
            vec![],
            "keyword",
        );
        assert_eq!(result.tier, FitTier::Poor);
        assert!(result.rationale.starts_with("Poor fit (0/100)."));
    }

    #[test]
    fn test_assemble_clamps_out_of_range_dimensions() {
        let result = assemble_score(
            DimensionScores {
                skills_match: 3.0,
                experience_relevance: 1.0,
                seniority_fit: 1.0,
                education_fit: 1.0,
            },
            &ScoringWeights::default(),
            None,
            vec!["Rust".to_string()],
            vec![],
            "llm",
        );
        assert_eq!(result.dimensions.skills_match, 1.0);
        assert!((result.composite - 1.0).abs() < 1e-9);
        assert_eq!(result.tier, FitTier::Strong);
        assert!(result.rationale.contains("Strengths: Rust."));
    }
}
