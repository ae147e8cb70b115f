// Prompt constants for profile extraction.

/// Role for the extraction call; `llm_client::prompts::system_prompt` adds the JSON rule.
pub const PROFILE_EXTRACTION_ROLE: &str =
    "You are a careful research assistant who reads web search results about a job applicant \
    and extracts their public professional profile.";

/// Replace `{candidate_block}`, `{search_results}` and `{evidence_instruction}` before sending.
pub const PROFILE_EXTRACTION_PROMPT: &str = r#"Decide whether these web search results contain the professional profile (LinkedIn or similar) of the applicant below, and if so extract it.

APPLICANT (self-reported):
{candidate_block}

WEB SEARCH RESULTS:
{search_results}

{evidence_instruction}

Return a JSON object with this EXACT schema:
{
  "found": true,
  "url": "https://www.linkedin.com/in/...",
  "confidence": 0.0,
  "experiences": [
    {"title": "...", "employer": "...", "dates": "2019 - Present", "description": "..."}
  ],
  "education": [
    {"institution": "...", "degree": "...", "dates": "2012 - 2016"}
  ],
  "summary": "one or two sentences describing the profile"
}

Rules:
- "confidence" is between 0.0 and 1.0: how sure you are that the profile belongs to THIS applicant (name, employers, location agree).
- List experiences most recent first, exactly as the profile states them, NOT as the applicant claims them.
- If no result is this applicant's profile, return {"found": false, "url": null, "confidence": 0.0, "experiences": [], "education": [], "summary": null}."#;

/// Maximum characters of page content forwarded per search hit.
pub const MAX_HIT_CHARS: usize = 1500;
