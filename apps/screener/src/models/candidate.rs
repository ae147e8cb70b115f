use std::collections::BTreeSet;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::null_as_default;

/// A period of employment or study as written by the applicant, plus the years
/// recovered from it. "2019 - Present" → start 2019, current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DateSpanRepr")]
pub struct DateSpan {
    pub raw: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub current: bool,
}

/// Accepts either a bare string (`"2019 - 2021"`) or the structured form.
#[derive(Deserialize)]
#[serde(untagged)]
enum DateSpanRepr {
    Text(String),
    Structured {
        #[serde(default, deserialize_with = "null_as_default")]
        raw: String,
        #[serde(default)]
        start_year: Option<i32>,
        #[serde(default)]
        end_year: Option<i32>,
        #[serde(default, deserialize_with = "null_as_default")]
        current: bool,
    },
}

impl From<DateSpanRepr> for DateSpan {
    fn from(repr: DateSpanRepr) -> Self {
        match repr {
            DateSpanRepr::Text(raw) => DateSpan::parse(&raw),
            DateSpanRepr::Structured {
                raw,
                start_year,
                end_year,
                current,
            } => {
                if start_year.is_none() && end_year.is_none() && !current && !raw.is_empty() {
                    DateSpan::parse(&raw)
                } else {
                    DateSpan {
                        raw,
                        start_year,
                        end_year,
                        current,
                    }
                }
            }
        }
    }
}

const ONGOING_MARKERS: &[&str] = &["present", "current", "now", "today", "ongoing"];

impl DateSpan {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let lower = raw.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let years: Vec<i32> = tokens
            .iter()
            .filter(|t| t.len() == 4)
            .filter_map(|t| t.parse::<i32>().ok())
            .filter(|y| (1950..=2100).contains(y))
            .collect();
        let current = tokens.iter().any(|t| ONGOING_MARKERS.contains(t));

        DateSpan {
            raw: raw.to_string(),
            start_year: years.first().copied(),
            end_year: years.get(1).copied(),
            current,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.start_year.is_none() && self.end_year.is_none()
    }

    /// Last year covered by the span; ongoing spans end this year.
    pub fn effective_end(&self) -> Option<i32> {
        if self.current {
            Some(Utc::now().year())
        } else {
            self.end_year.or(self.start_year)
        }
    }

    /// Whole years covered, when the start is known.
    pub fn duration_years(&self) -> Option<u32> {
        let start = self.start_year?;
        let end = self.effective_end()?;
        Some(end.saturating_sub(start).max(0) as u32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub employer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dates: DateSpan,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

impl Experience {
    /// "Title at Employer (dates): description", skipping empty parts. Used in prompts and reports.
    pub fn one_line(&self) -> String {
        let mut line = match (self.title.trim(), self.employer.trim()) {
            ("", "") => String::from("(untitled role)"),
            (title, "") => title.to_string(),
            ("", employer) => format!("Role at {employer}"),
            (title, employer) => format!("{title} at {employer}"),
        };
        if !self.dates.raw.is_empty() {
            line.push_str(&format!(" ({})", self.dates.raw));
        }
        if !self.description.trim().is_empty() {
            line.push_str(": ");
            line.push_str(self.description.trim());
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dates: DateSpan,
}

impl Education {
    pub fn one_line(&self) -> String {
        let mut line = match (self.degree.trim(), self.institution.trim()) {
            ("", institution) => institution.to_string(),
            (degree, "") => degree.to_string(),
            (degree, institution) => format!("{degree}, {institution}"),
        };
        if !self.dates.raw.is_empty() {
            line.push_str(&format!(" ({})", self.dates.raw));
        }
        line
    }
}

/// Renders a numbered list, or "(none)" when empty.
pub fn numbered<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, render(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One applicant, normalized from the export. Never mutated after parsing:
/// the pipeline moves it into a task and back out inside the outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub headline: String,
    /// Most recent first, as exported.
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub social_profiles: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl CandidateRecord {
    /// First social profile link pointing at LinkedIn.
    pub fn linkedin_url(&self) -> Option<&str> {
        self.social_profiles
            .iter()
            .map(|p| p.trim())
            .find(|p| p.to_lowercase().contains("linkedin.com"))
    }

    pub fn most_recent_employer(&self) -> Option<&str> {
        self.experiences
            .iter()
            .map(|e| e.employer.trim())
            .find(|e| !e.is_empty())
    }

    /// Name plus email, for log lines and report rows.
    pub fn display_name(&self) -> String {
        match (self.name.trim(), self.email.trim()) {
            ("", email) => email.to_string(),
            (name, "") => name.to_string(),
            (name, email) => format!("{name} <{email}>"),
        }
    }
}
