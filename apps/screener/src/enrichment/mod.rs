//! Evidence Lookup: finds a candidate's public professional profile and extracts
//! a structured history from it.
//!
//! Flow: build query → web search (bounded result count) → LLM extraction → ProfileEvidence.
//! Every failure is soft: the candidate continues with null evidence and a `LookupStatus`
//! saying why. Without a search credential the lookup is disabled for the whole run.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{CandidateRecord, LookupStatus, ProfileEvidence};
use crate::search::SearchProvider;

pub mod extractor;
pub mod prompts;

pub use extractor::{ExtractedProfile, LlmProfileExtractor, ProfileExtractor};

/// Evidence (or the null marker) plus the reason.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub evidence: Option<ProfileEvidence>,
    pub status: LookupStatus,
}

impl LookupResult {
    fn without_evidence(status: LookupStatus) -> Self {
        Self {
            evidence: None,
            status,
        }
    }
}

pub struct EvidenceLookup {
    search: Option<Arc<dyn SearchProvider>>,
    extractor: Arc<dyn ProfileExtractor>,
    max_results: usize,
}

impl EvidenceLookup {
    /// `search = None` puts the lookup in degrade mode: every call returns null evidence.
    pub fn new(
        search: Option<Arc<dyn SearchProvider>>,
        extractor: Arc<dyn ProfileExtractor>,
        max_results: usize,
    ) -> Self {
        if search.is_none() {
            warn!("No search credential configured. Skipping profile enrichment for all candidates.");
        }
        Self {
            search,
            extractor,
            max_results: max_results.max(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.search.is_some()
    }

    pub async fn lookup(&self, candidate: &CandidateRecord) -> LookupResult {
        let Some(search) = &self.search else {
            return LookupResult::without_evidence(LookupStatus::SearchDisabled);
        };

        let query = build_query(candidate);
        debug!("Searching: {query}");

        let hits = match search.search(&query, self.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search failed for {}: {e}", candidate.display_name());
                return LookupResult::without_evidence(LookupStatus::Failed {
                    reason: format!("search: {e}"),
                });
            }
        };

        if hits.is_empty() {
            return LookupResult::without_evidence(LookupStatus::NoResults);
        }

        let profile = match self.extractor.extract(candidate, &hits).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile extraction failed for {}: {e}", candidate.display_name());
                return LookupResult::without_evidence(LookupStatus::Failed {
                    reason: format!("extraction: {e}"),
                });
            }
        };

        if !profile.found {
            return LookupResult::without_evidence(LookupStatus::NoMatch);
        }

        let confidence = profile.normalized_confidence();
        let evidence = ProfileEvidence {
            profile_url: profile.url.filter(|u| !u.trim().is_empty()),
            experiences: profile.experiences,
            education: profile.education,
            confidence,
            summary: profile.summary.filter(|s| !s.trim().is_empty()),
            sources: hits.into_iter().map(|h| h.url).collect(),
        };

        LookupResult {
            evidence: Some(evidence),
            status: LookupStatus::Matched,
        }
    }
}

/// Quoted name plus the strongest identity hints the applicant gave us.
pub fn build_query(candidate: &CandidateRecord) -> String {
    let mut parts = vec![format!("\"{}\"", candidate.name.trim())];

    if let Some(employer) = candidate.most_recent_employer() {
        parts.push(employer.to_string());
    } else if !candidate.headline.trim().is_empty() {
        parts.push(candidate.headline.trim().to_string());
    }

    if let Some(location) = candidate.location.as_deref().map(str::trim) {
        if !location.is_empty() {
            parts.push(location.to_string());
        }
    }

    parts.push("LinkedIn".to_string());
    parts.join(" ")
}
