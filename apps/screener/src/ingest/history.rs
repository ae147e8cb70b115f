//! Free-text experience and education cells → structured entries.
//!
//! Exports put one entry per line (or `|` / `;` separated):
//! - `Senior Engineer at Initech (2019 - Present): Built the billing platform`
//! - `BSc Computer Science, State University (2012 - 2016)`

use crate::models::{DateSpan, DegreeLevel, Education, Experience};

const ENTRY_SEPARATORS: &[char] = &['\n', '|', ';'];
const TITLE_EMPLOYER_SEPARATORS: &[&str] = &[" at ", " @ ", ", ", " - ", " – "];

pub fn parse_experiences(cell: &str) -> Vec<Experience> {
    entries(cell).map(parse_experience).collect()
}

pub fn parse_education(cell: &str) -> Vec<Education> {
    entries(cell).map(parse_education_entry).collect()
}

fn entries(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(ENTRY_SEPARATORS)
        .map(|e| e.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|e| !e.is_empty())
}

fn parse_experience(entry: &str) -> Experience {
    let (head, dates, description) = split_dates(entry);
    let (title, employer) = split_pair(&head, TITLE_EMPLOYER_SEPARATORS);
    Experience {
        title,
        employer,
        dates,
        description,
    }
}

fn parse_education_entry(entry: &str) -> Education {
    let (head, dates, _) = split_dates(entry);
    let (first, second) = split_pair(&head, &[", ", " at ", " - ", " – "]);

    // "State University, BSc" is as common as "BSc, State University".
    let (degree, institution) = if second.is_empty() {
        if DegreeLevel::highest_in(&first).is_some() {
            (first, String::new())
        } else {
            (String::new(), first)
        }
    } else if DegreeLevel::highest_in(&first).is_none() && DegreeLevel::highest_in(&second).is_some() {
        (second, first)
    } else {
        (first, second)
    };

    Education {
        institution,
        degree,
        dates,
    }
}

/// Pulls a parenthesised date range out of an entry. Returns the remaining head,
/// the dates, and any `: description` tail after the parenthesis.
fn split_dates(entry: &str) -> (String, DateSpan, String) {
    let Some(open) = entry.find('(') else {
        return split_description(entry);
    };
    let Some(close) = entry[open..].find(')').map(|i| open + i) else {
        return split_description(entry);
    };

    let dates = DateSpan::parse(&entry[open + 1..close]);
    if dates.start_year.is_none() && !dates.current {
        return split_description(entry);
    }

    let head = entry[..open].trim().to_string();
    let description = entry[close + 1..]
        .trim()
        .trim_start_matches([':', '-', '–'])
        .trim()
        .to_string();
    (head, dates, description)
}

fn split_description(entry: &str) -> (String, DateSpan, String) {
    match entry.split_once(": ") {
        Some((head, tail)) => (head.trim().to_string(), DateSpan::default(), tail.trim().to_string()),
        None => (entry.trim().to_string(), DateSpan::default(), String::new()),
    }
}

/// Splits on the first separator present, in priority order.
fn split_pair(text: &str, separators: &[&str]) -> (String, String) {
    for sep in separators {
        if let Some((left, right)) = text.split_once(sep) {
            let (left, right) = (left.trim(), right.trim());
            if !left.is_empty() && !right.is_empty() {
                return (left.to_string(), right.to_string());
            }
        }
    }
    (text.trim().to_string(), String::new())
}
