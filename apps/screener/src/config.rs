use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client;
use crate::retry::RetryPolicy;
use crate::scoring::ScoringWeights;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "screener.toml";

/// Application configuration: optional TOML file, then `.env` / environment overrides.
/// Credentials only ever come from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
    #[serde(skip)]
    pub tavily_api_key: Option<String>,
    pub model: String,
    pub port: u16,
    pub rust_log: String,
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub verification: VerificationConfig,
    pub pipeline: PipelineConfig,
    pub report: ReportConfig,
    pub retry: RetryConfig,
    /// Internal field name → exact CSV header, overriding the built-in aliases.
    pub column_mapping: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            tavily_api_key: None,
            model: llm_client::MODEL.to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            search: SearchConfig::default(),
            scoring: ScoringConfig::default(),
            verification: VerificationConfig::default(),
            pipeline: PipelineConfig::default(),
            report: ReportConfig::default(),
            retry: RetryConfig::default(),
            column_mapping: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerBackend {
    #[default]
    Llm,
    Keyword,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub backend: ScorerBackend,
    pub weights: ScoringWeights,
    /// Ask the LLM to fill structured JD fields. Only used by the keyword backend.
    pub refine_job_description: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            backend: ScorerBackend::default(),
            weights: ScoringWeights::default(),
            refine_job_description: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    #[default]
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub detector: DetectorBackend,
    pub flag_threshold: f32,
    pub min_profile_confidence: f32,
    /// Score candidates whose identity could not be verified.
    pub score_unverifiable: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            detector: DetectorBackend::default(),
            flag_threshold: 2.5,
            min_profile_confidence: 0.5,
            score_unverifiable: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { batch_size: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, std::time::Duration::from_millis(self.base_delay_ms))
    }
}

impl Config {
    /// Loads `.env`, the TOML file (explicit path, else `screener.toml` if present),
    /// then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.anthropic_api_key = get("ANTHROPIC_API_KEY");
        self.tavily_api_key = get("TAVILY_API_KEY");
        if let Some(model) = get("SCREENER_MODEL") {
            self.model = model;
        }
        if let Some(batch) = get("SCREENER_BATCH_SIZE") {
            self.pipeline.batch_size = batch
                .parse()
                .context("SCREENER_BATCH_SIZE must be a positive integer")?;
        }
        if let Some(port) = get("PORT") {
            self.port = port.parse().context("PORT must be a valid port number")?;
        }
        if let Some(level) = get("RUST_LOG") {
            self.rust_log = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.pipeline.batch_size == 0 {
            return Err(AppError::Config("pipeline.batch_size must be at least 1".to_string()));
        }
        if self.report.top_n == 0 {
            return Err(AppError::Config("report.top_n must be at least 1".to_string()));
        }
        if self.search.max_results == 0 {
            return Err(AppError::Config("search.max_results must be at least 1".to_string()));
        }
        if !self.verification.flag_threshold.is_finite() || self.verification.flag_threshold < 0.0 {
            return Err(AppError::Config(
                "verification.flag_threshold must be a non-negative number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.verification.min_profile_confidence) {
            return Err(AppError::Config(
                "verification.min_profile_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        self.scoring.weights.validate()
    }

    /// The reasoning capability is required for every run.
    pub fn require_anthropic_key(&self) -> Result<&str, AppError> {
        self.anthropic_api_key
            .as_deref()
            .ok_or(AppError::MissingCredential("ANTHROPIC_API_KEY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.report.top_n, 20);
        assert_eq!(config.search.max_results, 5);
        assert!(config.verification.score_unverifiable);
        assert_eq!(config.scoring.backend, ScorerBackend::Llm);
    }

    #[test]
    fn test_toml_sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scoring]
            backend = "keyword"
            [scoring.weights]
            skills_match = 0.25
            experience_relevance = 0.25
            seniority_fit = 0.25
            education_fit = 0.25
            [verification]
            detector = "heuristic"
            score_unverifiable = false
            [pipeline]
            batch_size = 2
            [column_mapping]
            name = "Applicant"
            "#,
        )
        .unwrap();
        assert_eq!(config.scoring.backend, ScorerBackend::Keyword);
        assert_eq!(config.scoring.weights.education_fit, 0.25);
        assert_eq!(config.verification.detector, DetectorBackend::Heuristic);
        assert!(!config.verification.score_unverifiable);
        assert_eq!(config.verification.flag_threshold, 2.5);
        assert_eq!(config.pipeline.batch_size, 2);
        assert_eq!(config.column_mapping.get("name").map(String::as_str), Some("Applicant"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::from_toml_str("[scoring]\nbackend = \"magic\"\n").is_err());
    }

    #[test]
    fn test_env_overrides_and_blank_keys() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("ANTHROPIC_API_KEY", "sk-test"),
                ("TAVILY_API_KEY", "  "),
                ("SCREENER_BATCH_SIZE", "3"),
                ("PORT", "9000"),
            ]))
            .unwrap();
        assert_eq!(config.require_anthropic_key().unwrap(), "sk-test");
        assert!(config.tavily_api_key.is_none());
        assert_eq!(config.pipeline.batch_size, 3);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_bad_env_number_is_error() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn test_missing_anthropic_key_is_missing_credential() {
        let config = Config::default();
        assert!(matches!(
            config.require_anthropic_key(),
            Err(AppError::MissingCredential("ANTHROPIC_API_KEY"))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.pipeline.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.verification.min_profile_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.weights.skills_match = 0.9;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screener.toml");
        std::fs::write(&path, "[report]\ntop_n = 3\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.report.top_n, 3);
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
