// Prompt constants for the fraud / consistency check.

pub const CONSISTENCY_ROLE: &str =
    "You are an expert recruiter screening job applications for fabricated or inflated claims.";

/// Replace `{claimed_block}`, `{observed_block}` and `{evidence_instruction}` before sending.
pub const CONSISTENCY_PROMPT: &str = r#"Compare the applicant's CLAIMS with the OBSERVED public profile and list every discrepancy.

CLAIMS (from the application):
{claimed_block}

OBSERVED (public profile found by web search):
{observed_block}

{evidence_instruction}

Check these axes:
1. inflated_title: a claimed title is more senior than the observed title at the same employer.
2. unknown_employer: a claimed employer does not appear in the observed history, or looks fabricated.
3. date_inconsistency: claimed start/end dates, overlaps or gaps disagree with the observed history.
4. education_mismatch: a claimed institution or degree does not match, or the degree level is higher than observed.

Severity:
- "major": the claim is contradicted outright or materially inflated.
- "minor": small drift, missing detail, or something that could be an honest difference.

Return a JSON object with this EXACT schema:
{
  "discrepancies": [
    {
      "kind": "inflated_title" | "unknown_employer" | "date_inconsistency" | "education_mismatch",
      "field": "experiences[0].title",
      "claimed": "what the applicant wrote",
      "observed": "what the profile shows",
      "severity": "minor" | "major"
    }
  ],
  "summary": "1-2 sentence assessment"
}

Return an empty "discrepancies" array when the claims are consistent with the profile."#;
