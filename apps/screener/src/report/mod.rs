//! Markdown screening report.
//!
//! Sections: header with counts, Top N table, detailed profiles for the top N,
//! remaining ranked candidates, flagged candidates with reasons, candidates left
//! unscored by policy, and candidates that could not be processed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{JobDescription, VerdictStatus};
use crate::pipeline::{PipelineOutcome, ScreeningRun};

fn badge(status: VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Trusted => "VERIFIED",
        VerdictStatus::Flagged => "FLAGGED",
        VerdictStatus::Unverifiable => "UNVERIFIED",
    }
}

/// Table cells cannot hold pipes or newlines.
fn cell(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "-".to_string();
    }
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn pct(value: f64) -> String {
    format!("{:.0}", value * 100.0)
}

pub fn render_report(run: &ScreeningRun, job: &JobDescription, jd_source: &str, top_n: usize) -> String {
    let ranked = run.ranked();
    let split = top_n.min(ranked.len());
    let (top, rest) = ranked.split_at(split);
    let summary = run.summary();

    let mut out = String::new();

    out.push_str("# Candidate Screening Report\n\n");
    out.push_str(&format!("**Run:** `{}`  \n", run.run_id));
    out.push_str(&format!("**Generated:** {}  \n", run.started_at.format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!("**Role:** {}  \n", job.display_title()));
    out.push_str(&format!("**Job Description:** `{jd_source}`  \n"));
    out.push_str(&format!("**Total Candidates:** {}  \n", summary.total));
    out.push_str(&format!("**Scored:** {}  \n", summary.scored));
    out.push_str(&format!("**Verified / Flagged / Unverified:** {} / {} / {}  \n", summary.trusted, summary.flagged, summary.unverifiable));
    out.push_str(&format!("**Could Not Be Processed:** {}  \n", summary.errored));
    out.push_str(&format!("**Elapsed:** {:.1}s\n\n", run.elapsed.as_secs_f64()));

    out.push_str("---\n\n## Top Candidates\n\n");
    if top.is_empty() {
        out.push_str("*No candidates could be ranked.*\n\n");
    } else {
        out.push_str("| Rank | Name | Score | Tier | Skills | Experience | Seniority | Education | Verification | Key Strengths |\n");
        out.push_str("|------|------|-------|------|--------|------------|-----------|-----------|--------------|---------------|\n");
        for (rank, outcome) in top.iter().enumerate() {
            render_top_row(&mut out, rank + 1, outcome);
        }
        out.push('\n');

        out.push_str("---\n\n## Detailed Candidate Profiles\n\n");
        for (rank, outcome) in top.iter().enumerate() {
            render_profile(&mut out, rank + 1, outcome);
        }
    }

    if !rest.is_empty() {
        out.push_str("## Other Candidates (Ranked)\n\n");
        out.push_str("| Rank | Name | Score | Tier | Verification |\n");
        out.push_str("|------|------|-------|------|--------------|\n");
        for (offset, outcome) in rest.iter().enumerate() {
            if let Some(score) = &outcome.score {
                out.push_str(&format!(
                    "| {} | {} | {:.0} | {} | {} |\n",
                    split + offset + 1,
                    cell(&outcome.candidate.display_name()),
                    score.percent(),
                    score.tier.label(),
                    badge(outcome.verdict.status),
                ));
            }
        }
        out.push('\n');
    }

    let flagged = run.flagged();
    if !flagged.is_empty() {
        out.push_str("## Flagged Candidates\n\n");
        out.push_str("| Name | Email | Severity | Reasons |\n");
        out.push_str("|------|-------|----------|---------|\n");
        for outcome in flagged {
            let reasons = outcome
                .verdict
                .discrepancies
                .iter()
                .take(3)
                .map(|d| d.describe())
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(&format!(
                "| {} | {} | {:.1} | {} |\n",
                cell(&outcome.candidate.name),
                cell(&outcome.candidate.email),
                outcome.verdict.aggregate_severity,
                cell(&reasons),
            ));
        }
        out.push('\n');
    }

    let unscored = run.unscored();
    if !unscored.is_empty() {
        out.push_str("## Unverified, Not Scored\n\n");
        out.push_str("Identity could not be verified and scoring of unverified candidates is disabled.\n\n");
        out.push_str("| Name | Email | Lookup |\n");
        out.push_str("|------|-------|--------|\n");
        for outcome in unscored {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&outcome.candidate.name),
                cell(&outcome.candidate.email),
                cell(&outcome.lookup.describe()),
            ));
        }
        out.push('\n');
    }

    let errored = run.errored();
    if !errored.is_empty() {
        out.push_str("## Could Not Be Processed\n\n");
        out.push_str("| Name | Email | Stage | Error |\n");
        out.push_str("|------|-------|-------|-------|\n");
        for outcome in errored {
            let (stage, message) = outcome
                .failure
                .as_ref()
                .map(|f| (f.stage.label(), f.message.as_str()))
                .unwrap_or(("unknown", ""));
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(&outcome.candidate.name),
                cell(&outcome.candidate.email),
                stage,
                cell(message),
            ));
        }
        out.push('\n');
    }

    out
}

fn render_top_row(out: &mut String, rank: usize, outcome: &PipelineOutcome) {
    let Some(score) = &outcome.score else {
        return;
    };
    let strengths = score.strengths.iter().take(2).cloned().collect::<Vec<_>>().join("; ");
    let d = &score.dimensions;
    out.push_str(&format!(
        "| {rank} | {} | **{:.0}** | {} | {} | {} | {} | {} | {} | {} |\n",
        cell(&outcome.candidate.name),
        score.percent(),
        score.tier.label(),
        pct(d.skills_match),
        pct(d.experience_relevance),
        pct(d.seniority_fit),
        pct(d.education_fit),
        badge(outcome.verdict.status),
        cell(&strengths),
    ));
}

fn render_profile(out: &mut String, rank: usize, outcome: &PipelineOutcome) {
    let Some(score) = &outcome.score else {
        return;
    };
    let candidate = &outcome.candidate;

    out.push_str(&format!("### {rank}. {}\n\n", candidate.name));
    out.push_str(&format!("- **Score:** {:.0}/100 ({})\n", score.percent(), score.tier.label()));
    if !candidate.email.is_empty() {
        out.push_str(&format!("- **Email:** {}\n", candidate.email));
    }
    if !candidate.headline.is_empty() {
        out.push_str(&format!("- **Headline:** {}\n", candidate.headline));
    }
    if let Some(location) = &candidate.location {
        out.push_str(&format!("- **Location:** {location}\n"));
    }
    if let Some(source) = &candidate.source {
        out.push_str(&format!("- **Source:** {source}\n"));
    }
    let profile_url = outcome
        .evidence
        .as_ref()
        .and_then(|e| e.profile_url.as_deref())
        .or_else(|| candidate.linkedin_url());
    if let Some(url) = profile_url {
        out.push_str(&format!("- **LinkedIn:** {url}\n"));
    }
    out.push_str(&format!(
        "- **Verification:** {} ({})\n\n",
        badge(outcome.verdict.status),
        outcome.lookup.describe(),
    ));

    let d = &score.dimensions;
    out.push_str(&format!(
        "**Scores:** Skills: {} | Experience: {} | Seniority: {} | Education: {} | Composite: {:.0}\n\n",
        pct(d.skills_match),
        pct(d.experience_relevance),
        pct(d.seniority_fit),
        pct(d.education_fit),
        score.percent(),
    ));
    out.push_str(&format!("**Assessment:** {}\n\n", score.rationale));
    if !score.strengths.is_empty() {
        out.push_str(&format!("**Strengths:** {}\n", score.strengths.join(", ")));
    }
    if !score.concerns.is_empty() {
        out.push_str(&format!("**Concerns:** {}\n", score.concerns.join(", ")));
    }

    let mut notes: Vec<String> = outcome.verdict.discrepancies.iter().map(|d| d.describe()).collect();
    if let Some(summary) = &outcome.verdict.summary {
        notes.insert(0, summary.clone());
    }
    notes.extend(outcome.notes.iter().cloned());
    if !notes.is_empty() {
        out.push_str(&format!("\n**Verification Notes:** {}\n", notes.join("; ")));
    }
    out.push_str("\n---\n\n");
}

/// `<dir>/report_<UTC timestamp>.md`
pub fn default_report_path(dir: &Path, at: DateTime<Utc>) -> PathBuf {
    dir.join(format!("report_{}.md", at.format("%Y%m%d_%H%M%S")))
}

/// Writes the report, creating parent directories.
pub fn save_report(content: &str, path: &Path) -> Result<PathBuf, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Discrepancy, DiscrepancyKind, Severity};
    use crate::pipeline::outcome::fixtures::{errored, run, scored, skipped};
    use crate::pipeline::SkipReason;

    fn job() -> JobDescription {
        JobDescription {
            text: "Rust Engineer".to_string(),
            title: Some("Rust Engineer".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_sections_render() {
        let mut liar = skipped(3, "Mallory", SkipReason::Flagged);
        liar.verdict.discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::UnknownEmployer,
            field: "experiences[0].employer".to_string(),
            claimed: "Hooli".to_string(),
            observed: "not listed on profile".to_string(),
            severity: Severity::Major,
        });
        let run = run(vec![
            scored(0, "Ada", 0.9),
            scored(1, "Bob", 0.6),
            scored(2, "Cy", 0.3),
            liar,
            skipped(4, "Dee", SkipReason::UnverifiablePolicy),
            errored(5, "Eve"),
        ]);

        let report = render_report(&run, &job(), "jd.md", 2);
        assert!(report.contains("## Top Candidates"));
        assert!(report.contains("| 1 | Ada | **90**"));
        assert!(report.contains("| 2 | Bob | **60**"));
        assert!(report.contains("### 1. Ada"));
        assert!(!report.contains("### 3. Cy"));
        assert!(report.contains("## Other Candidates (Ranked)"));
        assert!(report.contains("| 3 | Cy | 30"));
        assert!(report.contains("## Flagged Candidates"));
        assert!(report.contains("Hooli"));
        assert!(report.contains("## Unverified, Not Scored"));
        assert!(report.contains("| Dee |"));
        assert!(report.contains("## Could Not Be Processed"));
        assert!(report.contains("| Eve | - | scoring | LLM error: boom |"));
        assert!(report.contains("**Job Description:** `jd.md`"));
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let report = render_report(&run(vec![scored(0, "Ada", 0.9)]), &job(), "jd.md", 20);
        assert!(!report.contains("## Flagged Candidates"));
        assert!(!report.contains("## Other Candidates"));
        assert!(!report.contains("## Could Not Be Processed"));
    }

    #[test]
    fn test_empty_run_says_nothing_ranked() {
        let report = render_report(&run(vec![]), &job(), "jd.md", 20);
        assert!(report.contains("*No candidates could be ranked.*"));
    }

    #[test]
    fn test_cells_escape_pipes() {
        assert_eq!(cell("a|b\nc"), "a\\|b c");
        assert_eq!(cell("  "), "-");
    }

    #[test]
    fn test_default_path_uses_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            default_report_path(Path::new("output"), at),
            PathBuf::from("output/report_20240309_140507.md")
        );
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.md");
        let saved = save_report("# Report", &path).unwrap();
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "# Report");
    }
}
