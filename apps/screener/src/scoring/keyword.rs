use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::levels::words;
use crate::models::{
    CandidateRecord, DegreeLevel, DimensionScores, Education, Experience, JobDescription,
    ProfileEvidence, ScoreResult, SeniorityLevel,
};
use crate::scoring::{assemble_score, RelevanceScorer, ScoringWeights};

/// Pure-Rust keyword-based relevance scorer. Fast, deterministic, no LLM call.
///
/// Algorithm:
/// 1. Skills: for each required skill
///    - listed skill exact match → strength 1.0
///    - mentioned anywhere in the history → strength 0.6
///    - no match → strength 0.0
/// 2. Experience: share of JD terms present in titles and descriptions (half coverage = 1.0)
/// 3. Seniority: most recent title rank vs the JD level, averaged with years vs `min_years`
/// 4. Education: highest claimed degree level vs the JD requirement
pub struct KeywordRelevanceScorer {
    weights: ScoringWeights,
}

impl KeywordRelevanceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

#[async_trait]
impl RelevanceScorer for KeywordRelevanceScorer {
    async fn score(
        &self,
        candidate: &CandidateRecord,
        evidence: Option<&ProfileEvidence>,
        job: &JobDescription,
    ) -> Result<ScoreResult, AppError> {
        Ok(compute_keyword_relevance(candidate, evidence, job, &self.weights))
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

const STOP_WORDS: &[&str] = &[
    "and", "the", "for", "with", "you", "your", "our", "are", "will", "have", "has", "that",
    "this", "from", "into", "who", "what", "about", "able", "must", "should", "can", "plus",
    "years", "year", "experience", "experienced", "strong", "good", "great", "excellent",
    "work", "working", "team", "teams", "role", "ability", "skills", "knowledge", "including",
    "etc", "using", "use", "other", "such", "well", "least", "more", "than", "all", "any",
    "new", "across", "within", "their", "they", "them", "we", "us", "ideal", "candidate",
    "required", "preferred", "nice", "bonus",
];

/// Half of the JD's distinct terms appearing in the history counts as full coverage.
const FULL_COVERAGE_SHARE: f64 = 0.5;
const MENTION_STRENGTH: f64 = 0.6;
const NEUTRAL: f64 = 0.5;

fn compute_keyword_relevance(
    candidate: &CandidateRecord,
    evidence: Option<&ProfileEvidence>,
    job: &JobDescription,
    weights: &ScoringWeights,
) -> ScoreResult {
    let mut experiences: Vec<&Experience> = candidate.experiences.iter().collect();
    let mut education: Vec<&Education> = candidate.education.iter().collect();
    if let Some(evidence) = evidence {
        experiences.extend(evidence.experiences.iter());
        education.extend(evidence.education.iter());
    }

    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    let skills_match = score_skills(candidate, &experiences, job, &mut strengths, &mut concerns);
    let experience_relevance = score_experience(&experiences, job, &mut strengths, &mut concerns);
    let seniority_fit = score_seniority(candidate, job, &mut strengths, &mut concerns);
    let education_fit = score_education(&education, job, &mut strengths, &mut concerns);

    let dimensions = DimensionScores {
        skills_match,
        experience_relevance,
        seniority_fit,
        education_fit,
    };
    assemble_score(dimensions, weights, None, strengths, concerns, "keyword")
}

fn score_skills(
    candidate: &CandidateRecord,
    experiences: &[&Experience],
    job: &JobDescription,
    strengths: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> f64 {
    let listed: BTreeSet<String> = candidate.skills.iter().map(|s| s.trim().to_lowercase()).collect();

    if job.required_skills.is_empty() {
        return if listed.is_empty() {
            concerns.push("No skills listed".to_string());
            0.0
        } else {
            NEUTRAL
        };
    }

    let history = format!(
        "{} {} {} {}",
        candidate.headline,
        candidate.summary,
        candidate.keywords,
        experiences
            .iter()
            .map(|e| format!("{} {}", e.title, e.description))
            .collect::<Vec<_>>()
            .join(" ")
    )
    .to_lowercase();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut total = 0.0;

    for skill in &job.required_skills {
        let skill_lower = skill.trim().to_lowercase();
        if skill_lower.is_empty() {
            continue;
        }
        let strength = if listed.contains(&skill_lower) {
            1.0
        } else if mentions_term(&history, &skill_lower) {
            MENTION_STRENGTH
        } else {
            0.0
        };
        total += strength;
        if strength > 0.0 {
            matched.push(skill.trim().to_string());
        } else {
            missing.push(skill.trim().to_string());
        }
    }

    let counted = matched.len() + missing.len();
    if counted == 0 {
        return NEUTRAL;
    }
    if !matched.is_empty() {
        strengths.push(format!("Covers {}", matched.join(", ")));
    }
    if !missing.is_empty() {
        concerns.push(format!("No evidence of {}", missing.join(", ")));
    }
    total / counted as f64
}

/// Substring match on word boundaries, so "go" does not match "google".
fn mentions_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn job_terms(job: &JobDescription) -> BTreeSet<String> {
    let mut source: Vec<&str> = job
        .requirements
        .iter()
        .chain(job.responsibilities.iter())
        .chain(job.required_skills.iter())
        .map(String::as_str)
        .collect();
    if let Some(title) = job.title.as_deref() {
        source.push(title);
    }
    if source.is_empty() {
        source.push(&job.text);
    }

    source
        .iter()
        .flat_map(|s| words(s))
        .filter(|w| w.len() >= 3 && !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

fn score_experience(
    experiences: &[&Experience],
    job: &JobDescription,
    strengths: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> f64 {
    if experiences.is_empty() {
        concerns.push("No work experience listed".to_string());
        return 0.0;
    }

    let terms = job_terms(job);
    if terms.is_empty() {
        return NEUTRAL;
    }

    let history: BTreeSet<String> = experiences
        .iter()
        .flat_map(|e| words(&format!("{} {}", e.title, e.description)))
        .collect();
    let covered = terms.iter().filter(|t| history.contains(*t)).count();
    let share = covered as f64 / terms.len() as f64;
    let score = (share / FULL_COVERAGE_SHARE).min(1.0);

    if score >= 0.6 {
        strengths.push("Work history closely matches the role".to_string());
    } else if score < 0.3 {
        concerns.push("Little overlap between work history and the role".to_string());
    }
    score
}

fn score_seniority(
    candidate: &CandidateRecord,
    job: &JobDescription,
    strengths: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> f64 {
    let Some(latest) = candidate.experiences.first() else {
        return 0.0;
    };

    let mut parts = Vec::new();

    if let (Some(target), Some(level)) = (job.target_seniority(), SeniorityLevel::from_title(&latest.title)) {
        let gap = level.rank() - target.rank();
        let fit = match gap {
            g if g >= 0 => 1.0,
            -1 => 0.6,
            -2 => 0.3,
            _ => 0.0,
        };
        if gap < 0 {
            concerns.push(format!(
                "Most recent title is {} while the role is {}",
                level.label(),
                target.label()
            ));
        }
        parts.push(fit);
    }

    if let Some(min_years) = job.min_years.filter(|y| *y > 0) {
        let years: u32 = candidate
            .experiences
            .iter()
            .filter_map(|e| e.dates.duration_years())
            .sum();
        if years >= min_years {
            strengths.push(format!("{years} years of experience (role asks for {min_years}+)"));
        } else {
            concerns.push(format!("{years} years of experience (role asks for {min_years}+)"));
        }
        parts.push((years as f64 / min_years as f64).min(1.0));
    }

    if parts.is_empty() {
        NEUTRAL
    } else {
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}

fn score_education(
    education: &[&Education],
    job: &JobDescription,
    strengths: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> f64 {
    if education.is_empty() {
        if job.education_level.is_some() {
            concerns.push("No education listed".to_string());
        }
        return 0.0;
    }

    let Some(required) = job.education_level else {
        return 1.0;
    };

    let Some(highest) = education
        .iter()
        .filter_map(|e| DegreeLevel::highest_in(&e.degree))
        .max()
    else {
        return NEUTRAL;
    };

    let gap = highest.rank() - required.rank();
    if gap >= 0 {
        strengths.push("Meets the education requirement".to_string());
        1.0
    } else {
        concerns.push("Degree level below the requirement".to_string());
        if gap == -1 {
            0.5
        } else {
            0.2
        }
    }
}
