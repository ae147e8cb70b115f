//! Workable-style CSV export → `CandidateRecord`s.
//!
//! Columns are found by alias (case-insensitive header match); `[column_mapping]` in the
//! config pins a field to an exact header instead. Blank rows and rows with neither a
//! name nor an email are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::ingest::history::{parse_education, parse_experiences};
use crate::models::CandidateRecord;

/// Field → accepted headers, lowercase, first match wins.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["name", "candidate name", "full name", "candidate"]),
    ("email", &["email", "email address", "e-mail"]),
    ("headline", &["headline", "title", "professional headline"]),
    ("summary", &["summary", "bio", "about"]),
    ("keywords", &["keywords"]),
    ("educations", &["educations", "education"]),
    ("experiences", &["experiences", "experience", "work experience"]),
    ("skills", &["skills", "skill set"]),
    (
        "social_profiles",
        &["social profiles", "linkedin", "linkedin url", "social links", "social"],
    ),
    ("address", &["address", "location", "city"]),
    ("source", &["source", "sourced from", "channel"]),
];

/// Header positions per field.
#[derive(Debug, Default)]
struct ColumnIndex(BTreeMap<&'static str, usize>);

impl ColumnIndex {
    fn build(headers: &csv::StringRecord, overrides: &BTreeMap<String, String>) -> Self {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        for field in overrides.keys() {
            if !COLUMN_ALIASES.iter().any(|(name, _)| name == field) {
                warn!("Ignoring column mapping for unknown field '{field}'");
            }
        }

        let mut index = BTreeMap::new();
        for (field, aliases) in COLUMN_ALIASES {
            let position = match overrides.get(*field) {
                Some(header) => {
                    let header = header.trim().to_lowercase();
                    lower.iter().position(|h| *h == header)
                }
                None => aliases
                    .iter()
                    .find_map(|alias| lower.iter().position(|h| h == alias)),
            };
            if let Some(position) = position {
                index.insert(*field, position);
            }
        }
        debug!("CSV column index: {:?}", index);
        Self(index)
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, field: &str) -> &'r str {
        self.0
            .get(field)
            .and_then(|i| row.get(*i))
            .map(str::trim)
            .unwrap_or("")
    }
}

pub fn load_candidates(
    path: &Path,
    overrides: &BTreeMap<String, String>,
) -> Result<Vec<CandidateRecord>, AppError> {
    let bytes = std::fs::read(path)?;
    parse_candidates(&decode(&bytes), overrides)
}

/// UTF-8 (BOM stripped), otherwise Latin-1.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("CSV is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

pub fn parse_candidates(
    text: &str,
    overrides: &BTreeMap<String, String>,
) -> Result<Vec<CandidateRecord>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::build(&headers, overrides);
    if !index.0.contains_key("name") && !index.0.contains_key("email") {
        return Err(AppError::Validation(
            "CSV has neither a name nor an email column".to_string(),
        ));
    }

    let mut candidates = Vec::new();
    for record in reader.records() {
        let row = record?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let name = index.get(&row, "name");
        let email = index.get(&row, "email");
        if name.is_empty() && email.is_empty() {
            continue;
        }

        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());

        candidates.push(CandidateRecord {
            name: name.to_string(),
            email: email.to_string(),
            headline: index.get(&row, "headline").to_string(),
            experiences: parse_experiences(index.get(&row, "experiences")),
            skills: split_skills(index.get(&row, "skills")),
            education: parse_education(index.get(&row, "educations")),
            summary: index.get(&row, "summary").to_string(),
            keywords: index.get(&row, "keywords").to_string(),
            social_profiles: split_links(index.get(&row, "social_profiles")),
            location: non_empty(index.get(&row, "address")),
            source: non_empty(index.get(&row, "source")),
        });
    }

    Ok(candidates)
}

fn split_skills(cell: &str) -> BTreeSet<String> {
    cell.split([',', ';', '\n', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_links(cell: &str) -> Vec<String> {
    cell.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = "\
Name,Email,Headline,Experiences,Educations,Skills,Social profiles,Address,Source
Ada Lovelace,ada@example.com,Analyst,Analyst at Babbage & Co (1842 - Present),\"Mathematics, University of London\",\"Python, SQL; Rust\",https://linkedin.com/in/ada,London,Referral
,,,,,,,,
,,Orphan headline,,,,,,
Grace Hopper,,Rear Admiral,,,,,,
";

    #[test]
    fn test_parses_rows_and_skips_blank_and_anonymous() {
        let candidates = parse_candidates(EXPORT, &BTreeMap::new()).unwrap();
        assert_eq!(candidates.len(), 2);

        let ada = &candidates[0];
        assert_eq!(ada.name, "Ada Lovelace");
        assert_eq!(ada.experiences[0].employer, "Babbage & Co");
        assert_eq!(ada.education[0].institution, "University of London");
        assert_eq!(ada.skills.len(), 3);
        assert!(ada.skills.contains("Rust"));
        assert_eq!(ada.linkedin_url(), Some("https://linkedin.com/in/ada"));
        assert_eq!(ada.location.as_deref(), Some("London"));
        assert_eq!(ada.source.as_deref(), Some("Referral"));

        assert_eq!(candidates[1].name, "Grace Hopper");
        assert!(candidates[1].location.is_none());
    }

    #[test]
    fn test_header_aliases_are_case_insensitive() {
        let csv = "FULL NAME,E-mail,Work Experience\nLinus,linus@example.com,Maintainer at Linux Foundation\n";
        let candidates = parse_candidates(csv, &BTreeMap::new()).unwrap();
        assert_eq!(candidates[0].name, "Linus");
        assert_eq!(candidates[0].email, "linus@example.com");
        assert_eq!(candidates[0].experiences[0].title, "Maintainer");
    }

    #[test]
    fn test_column_override_wins_over_alias() {
        let csv = "Name,Applicant,Bio\nRecruiter Bob,Margaret Hamilton,Apollo software\n";
        let overrides = BTreeMap::from([
            ("name".to_string(), "Applicant".to_string()),
            ("summary".to_string(), "bio".to_string()),
        ]);
        let candidates = parse_candidates(csv, &overrides).unwrap();
        assert_eq!(candidates[0].name, "Margaret Hamilton");
        assert_eq!(candidates[0].summary, "Apollo software");
    }

    #[test]
    fn test_missing_identity_columns_is_validation_error() {
        let result = parse_candidates("Skills,Summary\nRust,Hi\n", &BTreeMap::new());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let csv = "Name,Email,Skills\nKen Thompson\n";
        let candidates = parse_candidates(csv, &BTreeMap::new()).unwrap();
        assert_eq!(candidates[0].name, "Ken Thompson");
        assert!(candidates[0].skills.is_empty());
    }

    #[test]
    fn test_load_handles_bom_and_latin1() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFName,Email\nAda,ada@example.com\n").unwrap();
        let candidates = load_candidates(file.path(), &BTreeMap::new()).unwrap();
        assert_eq!(candidates[0].name, "Ada");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Name,Email\nJos\xE9 Valim,jose@example.com\n").unwrap();
        let candidates = load_candidates(file.path(), &BTreeMap::new()).unwrap();
        assert_eq!(candidates[0].name, "José Valim");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_candidates(Path::new("/nonexistent/export.csv"), &BTreeMap::new());
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
