use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, EVIDENCE_INSTRUCTION};
use crate::llm_client::{complete_json, LanguageModel};
use crate::models::candidate::numbered;
use crate::models::levels::words;
use crate::models::{
    CandidateRecord, DegreeLevel, Discrepancy, DiscrepancyKind, Education, Experience,
    ProfileEvidence, SeniorityLevel, Severity,
};
use crate::verification::prompts::{CONSISTENCY_PROMPT, CONSISTENCY_ROLE};
use crate::verification::{DetectionReport, DiscrepancyDetector};

// ────────────────────────────────────────────────────────────────────────────
// LlmDetector: default backend
// ────────────────────────────────────────────────────────────────────────────

/// Reasoning-capability detector. Non-deterministic; callers only rely on the
/// severity boundaries, never on exact findings.
pub struct LlmDetector {
    llm: Arc<dyn LanguageModel>,
}

impl LlmDetector {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl DiscrepancyDetector for LlmDetector {
    async fn detect(
        &self,
        candidate: &CandidateRecord,
        evidence: &ProfileEvidence,
    ) -> Result<DetectionReport, AppError> {
        let prompt = build_consistency_prompt(candidate, evidence);
        complete_json::<DetectionReport>(self.llm.as_ref(), &prompt, &system_prompt(CONSISTENCY_ROLE))
            .await
            .map_err(|e| AppError::Llm(format!("consistency check failed: {e}")))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

fn build_consistency_prompt(candidate: &CandidateRecord, evidence: &ProfileEvidence) -> String {
    let skills = candidate.skills.iter().cloned().collect::<Vec<_>>().join(", ");
    let claimed_block = format!(
        "- Name: {}\n- Email: {}\n- Headline: {}\n- Summary: {}\n- Skills: {}\n- Experiences:\n{}\n- Education:\n{}",
        candidate.name,
        candidate.email,
        candidate.headline,
        candidate.summary,
        skills,
        numbered(&candidate.experiences, Experience::one_line),
        numbered(&candidate.education, Education::one_line),
    );
    let observed_block = format!(
        "- Profile URL: {}\n- Match confidence: {:.2}\n- Summary: {}\n- Experiences:\n{}\n- Education:\n{}",
        evidence.profile_url.as_deref().unwrap_or("unknown"),
        evidence.confidence,
        evidence.summary.as_deref().unwrap_or(""),
        numbered(&evidence.experiences, Experience::one_line),
        numbered(&evidence.education, Education::one_line),
    );

    CONSISTENCY_PROMPT
        .replace("{claimed_block}", &claimed_block)
        .replace("{observed_block}", &observed_block)
        .replace("{evidence_instruction}", EVIDENCE_INSTRUCTION)
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicDetector: deterministic rule-based backend
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust comparison of claimed vs observed history. Fast, deterministic, no LLM call.
///
/// Rules:
/// 1. Claimed employer missing from a non-empty observed history → unknown employer
///    (major for the most recent role, minor for older ones).
/// 2. Same employer, claimed title ranks above observed → inflated title
///    (1 level minor, 2+ levels major).
/// 3. Same employer, claimed tenure stretched by more than a year → date inconsistency
///    (2 years minor, 3+ years major).
/// 4. Claimed institution missing from a non-empty observed education → minor;
///    same institution with a higher claimed degree level → major.
pub struct HeuristicDetector;

const ORG_STOP_WORDS: &[&str] = &[
    "the", "inc", "llc", "ltd", "limited", "corp", "corporation", "co", "company", "gmbh", "plc",
    "ag", "sa", "group", "of",
];

#[async_trait]
impl DiscrepancyDetector for HeuristicDetector {
    async fn detect(
        &self,
        candidate: &CandidateRecord,
        evidence: &ProfileEvidence,
    ) -> Result<DetectionReport, AppError> {
        let mut discrepancies = compare_experiences(&candidate.experiences, &evidence.experiences);
        discrepancies.extend(compare_education(&candidate.education, &evidence.education));

        let summary = if discrepancies.is_empty() {
            "Claims are consistent with the public profile.".to_string()
        } else {
            format!(
                "{} discrepancies found by rule-based comparison with the public profile.",
                discrepancies.len()
            )
        };

        Ok(DetectionReport {
            discrepancies,
            summary: Some(summary),
        })
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

fn compare_experiences(claimed: &[Experience], observed: &[Experience]) -> Vec<Discrepancy> {
    let mut findings = Vec::new();
    if observed.is_empty() {
        return findings;
    }

    for (i, claim) in claimed.iter().enumerate() {
        if claim.employer.trim().is_empty() {
            continue;
        }

        let Some(seen) = observed
            .iter()
            .find(|o| same_organization(&o.employer, &claim.employer))
        else {
            findings.push(Discrepancy {
                kind: DiscrepancyKind::UnknownEmployer,
                field: format!("experiences[{i}].employer"),
                claimed: claim.employer.clone(),
                observed: "not listed on profile".to_string(),
                severity: if i == 0 { Severity::Major } else { Severity::Minor },
            });
            continue;
        };

        if let (Some(claimed_level), Some(seen_level)) = (
            SeniorityLevel::from_title(&claim.title),
            SeniorityLevel::from_title(&seen.title),
        ) {
            let gap = claimed_level.rank() - seen_level.rank();
            if gap >= 1 {
                findings.push(Discrepancy {
                    kind: DiscrepancyKind::InflatedTitle,
                    field: format!("experiences[{i}].title"),
                    claimed: claim.title.clone(),
                    observed: seen.title.clone(),
                    severity: if gap >= 2 { Severity::Major } else { Severity::Minor },
                });
            }
        }

        let drift = tenure_drift(claim, seen);
        if drift > 1 {
            findings.push(Discrepancy {
                kind: DiscrepancyKind::DateInconsistency,
                field: format!("experiences[{i}].dates"),
                claimed: claim.dates.raw.clone(),
                observed: seen.dates.raw.clone(),
                severity: if drift >= 3 { Severity::Major } else { Severity::Minor },
            });
        }
    }

    findings
}

/// Years by which the claimed tenure extends past the observed one, at either end.
fn tenure_drift(claim: &Experience, seen: &Experience) -> i32 {
    let early_start = match (claim.dates.start_year, seen.dates.start_year) {
        (Some(c), Some(s)) => s - c,
        _ => 0,
    };
    let late_end = match (claim.dates.effective_end(), seen.dates.effective_end()) {
        (Some(c), Some(s)) if seen.dates.start_year.is_some() => c - s,
        _ => 0,
    };
    early_start.max(late_end).max(0)
}

fn compare_education(claimed: &[Education], observed: &[Education]) -> Vec<Discrepancy> {
    let mut findings = Vec::new();
    if observed.is_empty() {
        return findings;
    }

    for (i, claim) in claimed.iter().enumerate() {
        if claim.institution.trim().is_empty() {
            continue;
        }

        match observed
            .iter()
            .find(|o| same_organization(&o.institution, &claim.institution))
        {
            None => findings.push(Discrepancy {
                kind: DiscrepancyKind::EducationMismatch,
                field: format!("education[{i}].institution"),
                claimed: claim.institution.clone(),
                observed: "not listed on profile".to_string(),
                severity: Severity::Minor,
            }),
            Some(seen) => {
                if let (Some(claimed_level), Some(seen_level)) = (
                    DegreeLevel::highest_in(&claim.degree),
                    DegreeLevel::highest_in(&seen.degree),
                ) {
                    if claimed_level > seen_level {
                        findings.push(Discrepancy {
                            kind: DiscrepancyKind::EducationMismatch,
                            field: format!("education[{i}].degree"),
                            claimed: claim.degree.clone(),
                            observed: seen.degree.clone(),
                            severity: Severity::Major,
                        });
                    }
                }
            }
        }
    }

    findings
}

fn normalize_org(name: &str) -> String {
    words(name)
        .into_iter()
        .filter(|w| !ORG_STOP_WORDS.contains(&w.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Acme Corp." matches "ACME Corporation" and "Acme Robotics" matches "Acme".
fn same_organization(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_org(a), normalize_org(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.starts_with(&format!("{b} ")) || b.starts_with(&format!("{a} "))
}
