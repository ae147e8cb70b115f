// Shared prompt constants.
// Each stage that calls the LLM defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that mixes applicant claims with third-party evidence.
pub const EVIDENCE_INSTRUCTION: &str = "\
    Treat the web search material as evidence of uneven quality. \
    Only rely on facts that are explicitly stated in it. \
    Do NOT invent employers, titles, dates or degrees that are not present. \
    When the evidence is silent about something, say so instead of guessing.";

/// Builds a system prompt from a role description plus the JSON-only rule.
pub fn system_prompt(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}
