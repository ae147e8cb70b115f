//! Web search capability used by evidence lookup.
//!
//! "Unavailable" (no credential) is not an error here: the lookup simply holds no
//! provider. A provider that runs and finds nothing returns an empty list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Transient;

pub mod tavily;

pub use tavily::TavilyClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Snippet or extracted page content.
    pub content: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl Transient for SearchError {
    fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(e) => !e.is_builder() && !e.is_decode(),
            SearchError::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ordered hits, at most `max_results`.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Returns the same hits for every query and records what was asked.
    pub struct FixedSearch {
        pub hits: Vec<SearchHit>,
        pub fail_with: Option<u16>,
        pub queries: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        pub fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                fail_with: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                hits: vec![],
                fail_with: Some(status),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    pub fn hit(url: &str, content: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            title: "Profile".to_string(),
            content: content.to_string(),
        }
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(status) = self.fail_with {
                return Err(SearchError::Api {
                    status,
                    message: "scripted failure".to_string(),
                });
            }
            Ok(self.hits.iter().take(max_results).cloned().collect())
        }
    }
}
