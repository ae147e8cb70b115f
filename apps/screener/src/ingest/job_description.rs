//! JD loader: heuristic Markdown section parse, with optional LLM refinement.
//!
//! The raw text is always kept verbatim for the LLM scorer. Structured fields are
//! recovered from headings and bullets: title, requirements, responsibilities,
//! required skills, minimum years and degree level.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{complete_json, LanguageModel};
use crate::models::levels::words;
use crate::models::{DegreeLevel, JobDescription, SeniorityLevel};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Intro,
    Requirements,
    Responsibilities,
    Skills,
    Other,
}

const REQUIREMENT_HEADINGS: &[&str] = &[
    "requirement", "qualification", "must have", "you have", "what you bring", "looking for",
    "about you", "who you are",
];
const RESPONSIBILITY_HEADINGS: &[&str] = &[
    "responsibilit", "what you'll do", "what you will do", "you will", "duties", "the role",
    "day to day",
];
const SKILL_HEADINGS: &[&str] = &["skills", "tech stack", "technologies", "tools"];
const OPTIONAL_HEADINGS: &[&str] = &["nice to have", "preferred", "bonus", "plus"];

pub fn load_job_description(path: &Path) -> Result<JobDescription, AppError> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "job description {} is empty",
            path.display()
        )));
    }
    Ok(parse_job_description(&text))
}

pub fn parse_job_description(text: &str) -> JobDescription {
    let mut jd = JobDescription {
        text: text.trim().to_string(),
        ..Default::default()
    };

    let mut section = Section::Intro;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(heading) = heading_text(line) {
            if jd.title.is_none() && section == Section::Intro && line.starts_with("# ") {
                jd.title = Some(heading.to_string());
                continue;
            }
            section = classify_heading(heading);
            continue;
        }

        if jd.title.is_none() && section == Section::Intro {
            jd.title = Some(strip_label(line, "job title").to_string());
            continue;
        }

        let Some(item) = bullet_text(line) else {
            continue;
        };
        match section {
            Section::Requirements => jd.requirements.push(item.to_string()),
            Section::Responsibilities => jd.responsibilities.push(item.to_string()),
            Section::Skills => jd.required_skills.extend(split_list(item)),
            Section::Intro | Section::Other => {}
        }
    }

    jd.seniority = jd.title.as_deref().and_then(SeniorityLevel::from_title);
    jd.min_years = jd
        .requirements
        .iter()
        .find_map(|r| years_in(r))
        .or_else(|| years_in(text));
    jd.education_level = education_requirement(&jd.requirements, text);
    dedup_case_insensitive(&mut jd.required_skills);

    debug!(
        "Parsed JD '{}': {} requirements, {} responsibilities, {} skills",
        jd.display_title(),
        jd.requirements.len(),
        jd.responsibilities.len(),
        jd.required_skills.len()
    );
    jd
}

/// `# Title`, `## Requirements`, `**Requirements**` and `Requirements:` all count as headings.
fn heading_text(line: &str) -> Option<&str> {
    if line.starts_with('#') {
        return Some(line.trim_start_matches('#').trim());
    }
    if line.starts_with("**") && line.ends_with("**") && line.len() > 4 {
        return Some(line.trim_matches('*').trim().trim_end_matches(':'));
    }
    if line.ends_with(':') && line.split_whitespace().count() <= 6 && bullet_text(line).is_none() {
        return Some(line.trim_end_matches(':').trim());
    }
    None
}

fn classify_heading(heading: &str) -> Section {
    let lower = heading.to_lowercase();
    let has = |list: &[&str]| list.iter().any(|k| lower.contains(k));
    if has(OPTIONAL_HEADINGS) {
        Section::Other
    } else if has(SKILL_HEADINGS) {
        Section::Skills
    } else if has(REQUIREMENT_HEADINGS) {
        Section::Requirements
    } else if has(RESPONSIBILITY_HEADINGS) {
        Section::Responsibilities
    } else {
        Section::Other
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    // "1. item" / "2) item"
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

fn strip_label<'a>(line: &'a str, label: &str) -> &'a str {
    match line.split_once(':') {
        Some((head, tail)) if head.trim().eq_ignore_ascii_case(label) => tail.trim(),
        _ => line,
    }
}

fn split_list(item: &str) -> Vec<String> {
    item.split([',', ';', '/'])
        .map(|s| s.trim().trim_end_matches('.').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// First "N+ years" / "N years" / "N yrs" mention.
fn years_in(text: &str) -> Option<u32> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '+').to_lowercase())
        .collect();
    tokens.windows(2).find_map(|pair| {
        let unit = pair[1].trim_end_matches(|c: char| !c.is_alphabetic());
        if !matches!(unit, "years" | "year" | "yrs" | "yr") {
            return None;
        }
        pair[0].trim_end_matches('+').parse::<u32>().ok().filter(|n| *n <= 40)
    })
}

/// Lowest degree level named in the requirements ("Bachelor's or Master's" → Bachelor).
fn education_requirement(requirements: &[String], text: &str) -> Option<DegreeLevel> {
    let from_requirements = requirements
        .iter()
        .flat_map(|r| DegreeLevel::mentions(r))
        .min();
    from_requirements.or_else(|| {
        text.lines()
            .filter(|l| words(l).iter().any(|w| w == "degree"))
            .flat_map(DegreeLevel::mentions)
            .min()
    })
}

fn dedup_case_insensitive(items: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    items.retain(|item| seen.insert(item.to_lowercase()));
}

// ────────────────────────────────────────────────────────────────────────────
// LLM refinement
// ────────────────────────────────────────────────────────────────────────────

const JD_REFINE_ROLE: &str = "You are an expert job description analyst.";

/// Replace `{jd_text}` before sending.
const JD_REFINE_PROMPT: &str = r#"Parse the following job description and extract structured information.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Senior Backend Engineer",
  "required_skills": ["Rust", "PostgreSQL"],
  "requirements": ["5+ years building distributed systems"],
  "responsibilities": ["Design and operate the billing platform"],
  "seniority": "intern" | "junior" | "mid" | "senior" | "staff" | "principal" | "executive" | null,
  "min_years": 5,
  "education_level": "certificate" | "associate" | "bachelor" | "master" | "doctorate" | null
}

Rules:
- "required_skills": named technologies, tools and competencies that are REQUIRED. Exclude nice-to-haves.
- "requirements": the must-have qualification sentences, verbatim where possible.
- "min_years": the minimum years of experience asked for, or null.
- "education_level": the LOWEST degree level that satisfies the requirement, or null if none is required.

JOB DESCRIPTION:
{jd_text}"#;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefinedJd {
    title: Option<String>,
    required_skills: Vec<String>,
    requirements: Vec<String>,
    responsibilities: Vec<String>,
    seniority: Option<SeniorityLevel>,
    min_years: Option<u32>,
    education_level: Option<DegreeLevel>,
}

/// Fills structured JD fields via the LLM. Non-empty LLM fields replace heuristic ones;
/// on failure the heuristic parse is kept.
pub struct JobDescriptionRefiner {
    llm: Arc<dyn LanguageModel>,
}

impl JobDescriptionRefiner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn refine(&self, jd: JobDescription) -> JobDescription {
        let prompt = JD_REFINE_PROMPT.replace("{jd_text}", &jd.text);
        match complete_json::<RefinedJd>(self.llm.as_ref(), &prompt, &system_prompt(JD_REFINE_ROLE)).await {
            Ok(refined) => merge(jd, refined),
            Err(e) => {
                warn!("JD refinement failed, keeping heuristic parse: {e}");
                jd
            }
        }
    }
}

fn merge(mut jd: JobDescription, refined: RefinedJd) -> JobDescription {
    let non_empty = |v: Vec<String>| {
        let v: Vec<String> = v.into_iter().filter(|s| !s.trim().is_empty()).collect();
        Some(v).filter(|v| !v.is_empty())
    };

    if let Some(title) = refined.title.filter(|t| !t.trim().is_empty()) {
        jd.title = Some(title);
    }
    if let Some(skills) = non_empty(refined.required_skills) {
        jd.required_skills = skills;
    }
    if let Some(requirements) = non_empty(refined.requirements) {
        jd.requirements = requirements;
    }
    if let Some(responsibilities) = non_empty(refined.responsibilities) {
        jd.responsibilities = responsibilities;
    }
    jd.seniority = refined.seniority.or(jd.seniority);
    jd.min_years = refined.min_years.or(jd.min_years);
    jd.education_level = refined.education_level.or(jd.education_level);
    jd
}
