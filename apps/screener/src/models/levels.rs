//! Ordinal scales inferred from free text: job-title seniority and degree level.
//! Both are used by the heuristic discrepancy detector and the keyword scorer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
    Executive,
}

const EXECUTIVE_WORDS: &[&str] = &[
    "chief", "cto", "ceo", "cfo", "coo", "cio", "vp", "vice", "president", "director", "head",
    "founder", "cofounder", "partner",
];
const PRINCIPAL_WORDS: &[&str] = &["principal", "distinguished", "architect", "fellow"];
const STAFF_WORDS: &[&str] = &["staff", "lead", "manager"];
const SENIOR_WORDS: &[&str] = &["senior", "sr", "iii"];
const INTERN_WORDS: &[&str] = &["intern", "internship", "trainee", "apprentice", "student"];
const JUNIOR_WORDS: &[&str] = &["junior", "jr", "associate", "graduate", "entry", "i"];

impl SeniorityLevel {
    /// Infers seniority from a job title. `None` for blank titles.
    pub fn from_title(title: &str) -> Option<Self> {
        let words = words(title);
        if words.is_empty() {
            return None;
        }
        let has = |list: &[&str]| words.iter().any(|w| list.contains(&w.as_str()));

        let level = if has(EXECUTIVE_WORDS) {
            SeniorityLevel::Executive
        } else if has(PRINCIPAL_WORDS) {
            SeniorityLevel::Principal
        } else if has(STAFF_WORDS) {
            SeniorityLevel::Staff
        } else if has(SENIOR_WORDS) {
            SeniorityLevel::Senior
        } else if has(INTERN_WORDS) {
            SeniorityLevel::Intern
        } else if has(JUNIOR_WORDS) {
            SeniorityLevel::Junior
        } else {
            SeniorityLevel::Mid
        };
        Some(level)
    }

    pub fn rank(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            SeniorityLevel::Intern => "intern",
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Mid => "mid-level",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Staff => "staff/lead",
            SeniorityLevel::Principal => "principal",
            SeniorityLevel::Executive => "executive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    Certificate,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

const DOCTORATE_WORDS: &[&str] = &["phd", "doctorate", "doctoral", "dphil", "edd"];
const MASTER_WORDS: &[&str] = &[
    "master", "masters", "msc", "ms", "ma", "mba", "meng", "mphil", "mres", "mtech",
];
const BACHELOR_WORDS: &[&str] = &[
    "bachelor", "bachelors", "bsc", "bs", "ba", "beng", "btech", "bba", "undergraduate",
];
const ASSOCIATE_WORDS: &[&str] = &["associate", "associates", "aas"];
const CERTIFICATE_WORDS: &[&str] = &["certificate", "certification", "diploma", "bootcamp"];

impl DegreeLevel {
    /// Every degree level mentioned in `text`, lowest first, deduplicated.
    pub fn mentions(text: &str) -> Vec<Self> {
        let words = words(&text.replace('.', ""));
        let has = |list: &[&str]| words.iter().any(|w| list.contains(&w.as_str()));

        let mut found = Vec::new();
        if has(CERTIFICATE_WORDS) {
            found.push(DegreeLevel::Certificate);
        }
        if has(ASSOCIATE_WORDS) {
            found.push(DegreeLevel::Associate);
        }
        if has(BACHELOR_WORDS) {
            found.push(DegreeLevel::Bachelor);
        }
        if has(MASTER_WORDS) {
            found.push(DegreeLevel::Master);
        }
        if has(DOCTORATE_WORDS) {
            found.push(DegreeLevel::Doctorate);
        }
        found
    }

    /// Highest level named in a degree string, e.g. "BSc, then MSc Computer Science".
    pub fn highest_in(text: &str) -> Option<Self> {
        Self::mentions(text).into_iter().max()
    }

    pub fn rank(self) -> i32 {
        self as i32
    }
}

/// Lowercased alphanumeric words.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
