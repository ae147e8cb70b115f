// Prompt constants for relevance scoring.

pub const SCORING_ROLE: &str =
    "You are an experienced technical recruiter scoring how well an applicant fits a specific role.";

/// Replace `{job_block}`, `{candidate_block}` and `{evidence_block}` before sending.
pub const SCORING_PROMPT: &str = r#"Score how well the applicant fits the job below.

JOB DESCRIPTION:
{job_block}

APPLICANT:
{candidate_block}

CORROBORATED PUBLIC PROFILE:
{evidence_block}

Rate each dimension from 0 to 100:
- "skills_match": required skills and technologies the applicant demonstrably has.
- "experience_relevance": how closely past roles and responsibilities match this role.
- "seniority_fit": whether the applicant's level and years of experience match the role's level.
- "education_fit": whether the applicant's education meets the role's requirement (100 when the role has none and the applicant lists any education).

Return a JSON object with this EXACT schema:
{
  "skills_match": 0,
  "experience_relevance": 0,
  "seniority_fit": 0,
  "education_fit": 0,
  "rationale": "2-3 sentences explaining the overall fit",
  "strengths": ["short phrase", "..."],
  "concerns": ["short phrase", "..."]
}

Judge only from the material above. Missing information counts against the applicant; do not assume skills that are not stated."#;
