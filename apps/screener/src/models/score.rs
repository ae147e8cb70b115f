use serde::{Deserialize, Serialize};

/// Per-dimension relevance, each in 0.0 – 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub skills_match: f64,
    pub experience_relevance: f64,
    pub seniority_fit: f64,
    pub education_fit: f64,
}

impl DimensionScores {
    pub fn clamped(self) -> Self {
        Self {
            skills_match: self.skills_match.clamp(0.0, 1.0),
            experience_relevance: self.experience_relevance.clamp(0.0, 1.0),
            seniority_fit: self.seniority_fit.clamp(0.0, 1.0),
            education_fit: self.education_fit.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitTier {
    Poor,
    Weak,
    Moderate,
    Strong,
}

impl FitTier {
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 0.75 {
            FitTier::Strong
        } else if composite >= 0.5 {
            FitTier::Moderate
        } else if composite >= 0.25 {
            FitTier::Weak
        } else {
            FitTier::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FitTier::Strong => "Strong fit",
            FitTier::Moderate => "Moderate fit",
            FitTier::Weak => "Weak fit",
            FitTier::Poor => "Poor fit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub dimensions: DimensionScores,
    /// Weighted sum of `dimensions` using the configured weights.
    pub composite: f64,
    pub tier: FitTier,
    pub rationale: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub scorer_backend: String, // "keyword" | "llm"
}

impl ScoreResult {
    /// Composite on the 0 – 100 scale used in reports.
    pub fn percent(&self) -> f64 {
        (self.composite * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(FitTier::from_composite(0.75), FitTier::Strong);
        assert_eq!(FitTier::from_composite(0.749), FitTier::Moderate);
        assert_eq!(FitTier::from_composite(0.5), FitTier::Moderate);
        assert_eq!(FitTier::from_composite(0.25), FitTier::Weak);
        assert_eq!(FitTier::from_composite(0.0), FitTier::Poor);
    }

    #[test]
    fn test_clamped_bounds_every_dimension() {
        let scores = DimensionScores {
            skills_match: 1.4,
            experience_relevance: -0.2,
            seniority_fit: 0.5,
            education_fit: f64::INFINITY,
        }
        .clamped();
        assert_eq!(scores.skills_match, 1.0);
        assert_eq!(scores.experience_relevance, 0.0);
        assert_eq!(scores.seniority_fit, 0.5);
        assert_eq!(scores.education_fit, 1.0);
    }
}
