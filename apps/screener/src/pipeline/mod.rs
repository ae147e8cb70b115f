//! Pipeline Orchestrator: drives every candidate through
//! evidence lookup → trust check → scoring with bounded concurrency.
//!
//! - Each candidate runs in its own spawned task; a panic becomes an error outcome.
//!   Tasks are aborted if the run itself is dropped.
//! - At most `batch_size` tasks are in flight (`buffer_unordered`).
//! - Results land in slots indexed by input position, so output order = input order.
//! - Per-candidate failures never abort the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{Config, DetectorBackend, ScorerBackend};
use crate::enrichment::{EvidenceLookup, LlmProfileExtractor};
use crate::errors::AppError;
use crate::ingest::JobDescriptionRefiner;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::models::{CandidateRecord, JobDescription, LookupStatus, TrustVerdict, VerdictStatus};
use crate::scoring::{KeywordRelevanceScorer, LlmRelevanceScorer, RelevanceScorer};
use crate::search::{SearchProvider, TavilyClient};
use crate::verification::{ConsistencyChecker, DiscrepancyDetector, HeuristicDetector, LlmDetector};

pub mod handlers;
pub mod outcome;
pub mod stage;

pub use outcome::{PipelineOutcome, RunSummary, ScreeningRun, SkipReason, StageFailure};
pub use stage::CandidateStage;

/// The three stage services plus optional JD refinement, shared by every candidate task.
pub struct Services {
    pub lookup: EvidenceLookup,
    pub checker: ConsistencyChecker,
    pub scorer: Arc<dyn RelevanceScorer>,
    pub refiner: Option<JobDescriptionRefiner>,
}

impl Services {
    /// Builds the service graph. A missing Anthropic key is fatal; a missing Tavily key
    /// disables evidence lookup for the whole run.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let api_key = config.require_anthropic_key()?;
        let retry = config.retry.policy();

        let llm: Arc<dyn LanguageModel> = Arc::new(
            LlmClient::new(api_key.to_string(), config.model.clone(), retry)
                .map_err(|e| AppError::Llm(e.to_string()))?,
        );
        info!("LLM client initialized (model: {})", config.model);

        let search: Option<Arc<dyn SearchProvider>> = match &config.tavily_api_key {
            Some(key) => Some(Arc::new(
                TavilyClient::new(key.clone(), retry).map_err(|e| AppError::Search(e.to_string()))?,
            )),
            None => None,
        };

        let lookup = EvidenceLookup::new(
            search,
            Arc::new(LlmProfileExtractor::new(llm.clone())),
            config.search.max_results,
        );

        let detector: Arc<dyn DiscrepancyDetector> = match config.verification.detector {
            DetectorBackend::Llm => Arc::new(LlmDetector::new(llm.clone())),
            DetectorBackend::Heuristic => Arc::new(HeuristicDetector),
        };
        let checker = ConsistencyChecker::new(
            detector,
            config.verification.min_profile_confidence,
            config.verification.flag_threshold,
        );

        let weights = config.scoring.weights.clone();
        let scorer: Arc<dyn RelevanceScorer> = match config.scoring.backend {
            ScorerBackend::Llm => Arc::new(LlmRelevanceScorer::new(llm.clone(), weights)),
            ScorerBackend::Keyword => Arc::new(KeywordRelevanceScorer::new(weights)),
        };
        info!("Relevance scorer: {}", scorer.backend());

        let refiner = (config.scoring.backend == ScorerBackend::Keyword
            && config.scoring.refine_job_description)
            .then(|| JobDescriptionRefiner::new(llm));

        Ok(Self {
            lookup,
            checker,
            scorer,
            refiner,
        })
    }

    /// Applies LLM refinement to the JD when configured.
    pub async fn prepare_job(&self, job: JobDescription) -> JobDescription {
        match &self.refiner {
            Some(refiner) => refiner.refine(job).await,
            None => job,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub score_unverifiable: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.pipeline.batch_size,
            score_unverifiable: config.verification.score_unverifiable,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            score_unverifiable: true,
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    services: Arc<Services>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(services: Arc<Services>, settings: PipelineSettings) -> Self {
        Self { services, settings }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Screens every candidate. Always returns exactly one outcome per input, in input order.
    pub async fn run(&self, candidates: Vec<CandidateRecord>, job: JobDescription) -> ScreeningRun {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let total = candidates.len();
        let batch_size = self.settings.batch_size.max(1);

        info!(%run_id, "Screening {total} candidates against '{}' (batch size {batch_size})", job.display_title());

        let job = Arc::new(job);
        let mut slots: Vec<Option<PipelineOutcome>> = (0..total).map(|_| None).collect();

        let tasks = candidates.into_iter().enumerate().map(|(index, candidate)| {
            let services = self.services.clone();
            let job = job.clone();
            let settings = self.settings;
            let fallback = candidate.clone();
            async move {
                // Dropping the run aborts candidates still in flight.
                let handle = AbortOnDropHandle::new(tokio::spawn(async move {
                    process_candidate(index, candidate, &services, &job, settings).await
                }));
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{}: task failed: {e}", fallback.display_name());
                        let error = AppError::Internal(anyhow::anyhow!("candidate task failed: {e}"));
                        PipelineOutcome::aborted(index, fallback, error)
                    }
                }
            }
        });

        let mut results = stream::iter(tasks).buffer_unordered(batch_size);
        let mut completed = 0;
        while let Some(outcome) = results.next().await {
            completed += 1;
            if !outcome.stage.is_terminal() {
                warn!("{}: finished in non-terminal stage {}", outcome.candidate.display_name(), outcome.stage.label());
            }
            info!(
                "[{completed}/{total}] {}: {}",
                outcome.candidate.display_name(),
                outcome.status_line()
            );
            let index = outcome.index;
            slots[index] = Some(outcome);
        }

        let outcomes: Vec<PipelineOutcome> = slots.into_iter().flatten().collect();
        let elapsed = clock.elapsed();
        info!(%run_id, "Processed {} candidates in {:.1}s", outcomes.len(), elapsed.as_secs_f64());

        ScreeningRun {
            run_id,
            started_at,
            elapsed,
            outcomes,
        }
    }
}

/// Validates and logs stage transitions for one candidate.
struct StageTracker {
    name: String,
    stage: CandidateStage,
}

impl StageTracker {
    fn new(name: String) -> Self {
        Self {
            name,
            stage: CandidateStage::Pending,
        }
    }

    fn advance(&mut self, next: CandidateStage) -> CandidateStage {
        if !self.stage.can_transition_to(next) {
            warn!("{}: unexpected transition {} → {}", self.name, self.stage.label(), next.label());
        }
        debug!("{}: {} → {}", self.name, self.stage.label(), next.label());
        self.stage = next;
        next
    }
}

async fn process_candidate(
    index: usize,
    candidate: CandidateRecord,
    services: &Services,
    job: &JobDescription,
    settings: PipelineSettings,
) -> PipelineOutcome {
    let mut tracker = StageTracker::new(candidate.display_name());
    let mut notes = Vec::new();

    tracker.advance(CandidateStage::EvidenceLookup);
    let lookup = services.lookup.lookup(&candidate).await;
    if let LookupStatus::Failed { reason } = &lookup.status {
        notes.push(format!("Evidence lookup failed: {reason}"));
    }

    tracker.advance(CandidateStage::TrustCheck);
    let verdict = match services.checker.check(&candidate, lookup.evidence.as_ref()).await {
        Ok(verdict) => verdict,
        Err(e) => {
            error!("{}: trust check failed: {e}", tracker.name);
            let stage = tracker.advance(CandidateStage::Error);
            return PipelineOutcome {
                index,
                candidate,
                evidence: lookup.evidence,
                lookup: lookup.status,
                verdict: TrustVerdict::unverifiable("The trust check could not be completed."),
                score: None,
                stage,
                skip_reason: None,
                failure: Some(StageFailure {
                    stage: CandidateStage::TrustCheck,
                    message: e.to_string(),
                }),
                notes,
            };
        }
    };

    let skip_reason = match verdict.status {
        VerdictStatus::Flagged => Some(SkipReason::Flagged),
        VerdictStatus::Unverifiable if !settings.score_unverifiable => Some(SkipReason::UnverifiablePolicy),
        _ => None,
    };

    if let Some(reason) = skip_reason {
        tracker.advance(CandidateStage::Skipped);
        let stage = tracker.advance(CandidateStage::Done);
        return PipelineOutcome {
            index,
            candidate,
            evidence: lookup.evidence,
            lookup: lookup.status,
            verdict,
            score: None,
            stage,
            skip_reason: Some(reason),
            failure: None,
            notes,
        };
    }

    tracker.advance(CandidateStage::Scoring);
    // Only corroborated evidence feeds the scorer.
    let evidence = match verdict.status {
        VerdictStatus::Trusted => lookup.evidence.as_ref(),
        _ => None,
    };
    let (score, failure) = match services.scorer.score(&candidate, evidence, job).await {
        Ok(score) => (Some(score), None),
        Err(e) => {
            error!("{}: scoring failed: {e}", tracker.name);
            let failure = StageFailure {
                stage: CandidateStage::Scoring,
                message: e.to_string(),
            };
            (None, Some(failure))
        }
    };
    let stage = tracker.advance(if failure.is_some() {
        CandidateStage::Error
    } else {
        CandidateStage::Done
    });

    PipelineOutcome {
        index,
        candidate,
        evidence: lookup.evidence,
        lookup: lookup.status,
        verdict,
        score,
        stage,
        skip_reason: None,
        failure,
        notes,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::enrichment::{ExtractedProfile, ProfileExtractor};
    use crate::models::{Discrepancy, DiscrepancyKind, ProfileEvidence, ScoreResult, Severity};
    use crate::scoring::ScoringWeights;
    use crate::search::{SearchError, SearchHit};
    use crate::verification::DetectionReport;

    /// Sleeps before answering; candidates named "slow…" wait longest.
    pub struct DelayedSearch;

    #[async_trait]
    impl SearchProvider for DelayedSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            let delay = if query.contains("slow") { 50 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![SearchHit {
                url: "https://linkedin.com/in/someone".to_string(),
                title: "profile".to_string(),
                content: query.to_string(),
            }])
        }
    }

    /// Echoes the candidate's own history back as a confident match.
    pub struct EchoExtractor;

    #[async_trait]
    impl ProfileExtractor for EchoExtractor {
        async fn extract(
            &self,
            candidate: &CandidateRecord,
            _hits: &[SearchHit],
        ) -> Result<ExtractedProfile, AppError> {
            Ok(ExtractedProfile {
                found: true,
                url: Some("https://linkedin.com/in/someone".to_string()),
                confidence: 0.9,
                experiences: candidate.experiences.clone(),
                education: candidate.education.clone(),
                summary: None,
            })
        }
    }

    /// Fails for "broken…" candidates, flags "liar…" candidates, trusts everyone else.
    pub struct ScriptedDetector;

    #[async_trait]
    impl DiscrepancyDetector for ScriptedDetector {
        async fn detect(
            &self,
            candidate: &CandidateRecord,
            _evidence: &ProfileEvidence,
        ) -> Result<DetectionReport, AppError> {
            if candidate.name.starts_with("broken") {
                return Err(AppError::Llm("reasoning unavailable".to_string()));
            }
            let discrepancies = if candidate.name.starts_with("liar") {
                vec![Discrepancy {
                    kind: DiscrepancyKind::InflatedTitle,
                    field: "experiences[0].title".to_string(),
                    claimed: "CTO".to_string(),
                    observed: "Intern".to_string(),
                    severity: Severity::Major,
                }]
            } else {
                vec![]
            };
            Ok(DetectionReport {
                discrepancies,
                summary: None,
            })
        }

        fn backend(&self) -> &'static str {
            "scripted"
        }
    }

    /// Keyword scoring, except "panic…" candidates panic and "unscorable…" ones fail.
    pub struct TrippingScorer(pub KeywordRelevanceScorer);

    #[async_trait]
    impl RelevanceScorer for TrippingScorer {
        async fn score(
            &self,
            candidate: &CandidateRecord,
            evidence: Option<&ProfileEvidence>,
            job: &JobDescription,
        ) -> Result<ScoreResult, AppError> {
            if candidate.name.starts_with("panic") {
                panic!("scorer blew up");
            }
            if candidate.name.starts_with("unscorable") {
                return Err(AppError::Llm("overloaded".to_string()));
            }
            self.0.score(candidate, evidence, job).await
        }

        fn backend(&self) -> &'static str {
            "tripping"
        }
    }

    pub fn services(search: Option<Arc<dyn SearchProvider>>) -> Services {
        Services {
            lookup: EvidenceLookup::new(search, Arc::new(EchoExtractor), 5),
            checker: ConsistencyChecker::new(Arc::new(ScriptedDetector), 0.5, 2.5),
            scorer: Arc::new(TrippingScorer(KeywordRelevanceScorer::new(ScoringWeights::default()))),
            refiner: None,
        }
    }

    pub fn pipeline(search: Option<Arc<dyn SearchProvider>>, settings: PipelineSettings) -> Pipeline {
        Pipeline::new(Arc::new(services(search)), settings)
    }

    pub fn candidates(names: &[&str]) -> Vec<CandidateRecord> {
        names
            .iter()
            .map(|name| CandidateRecord {
                name: name.to_string(),
                skills: ["rust".to_string()].into_iter().collect(),
                ..Default::default()
            })
            .collect()
    }

    pub fn job() -> JobDescription {
        JobDescription {
            text: "Rust engineer".to_string(),
            title: Some("Rust Engineer".to_string()),
            required_skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::testing::*;
    use super::*;
    use crate::search::{SearchError, SearchHit};

    /// Slow search that records how many calls overlap and how many ran to completion.
    struct CountingSearch {
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
    }

    impl CountingSearch {
        fn new(delay_ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for CountingSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SearchHit {
                url: "https://linkedin.com/in/someone".to_string(),
                title: "profile".to_string(),
                content: query.to_string(),
            }])
        }
    }

    fn names(run: &ScreeningRun) -> Vec<String> {
        run.outcomes.iter().map(|o| o.candidate.name.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_keep_input_order_under_delays() {
        let input = ["slow-a", "b", "slow-c", "d", "e", "slow-f", "g"];
        let pipeline = pipeline(
            Some(Arc::new(DelayedSearch)),
            PipelineSettings {
                batch_size: 3,
                score_unverifiable: true,
            },
        );
        let run = pipeline.run(candidates(&input), job()).await;

        assert_eq!(run.outcomes.len(), input.len());
        assert_eq!(names(&run), input.to_vec());
        for (i, outcome) in run.outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(outcome.verdict.status, VerdictStatus::Trusted);
            assert!(outcome.score.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_candidates_never_exceed_batch_size() {
        let search = Arc::new(CountingSearch::new(10));
        let pipeline = pipeline(
            Some(search.clone() as Arc<dyn SearchProvider>),
            PipelineSettings {
                batch_size: 3,
                score_unverifiable: true,
            },
        );
        let names: Vec<String> = (0..20).map(|i| format!("c{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let run = pipeline.run(candidates(&names), job()).await;

        assert_eq!(run.outcomes.len(), 20);
        assert_eq!(search.peak.load(Ordering::SeqCst), 3);
        assert_eq!(search.finished.load(Ordering::SeqCst), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_run_aborts_in_flight_candidates() {
        let search = Arc::new(CountingSearch::new(1_000));
        let pipeline = pipeline(
            Some(search.clone() as Arc<dyn SearchProvider>),
            PipelineSettings {
                batch_size: 2,
                score_unverifiable: true,
            },
        );

        let cut_short = tokio::time::timeout(
            Duration::from_millis(10),
            pipeline.run(candidates(&["a", "b", "c"]), job()),
        )
        .await;
        assert!(cut_short.is_err());
        assert_eq!(search.peak.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(search.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_input_is_empty_run() {
        let run = pipeline(None, PipelineSettings::default()).run(vec![], job()).await;
        assert!(run.outcomes.is_empty());
        assert_eq!(run.summary().total, 0);
    }

    #[tokio::test]
    async fn test_disabled_search_scores_everyone_as_unverifiable() {
        let run = pipeline(None, PipelineSettings::default())
            .run(candidates(&["a", "b", "c"]), job())
            .await;
        for outcome in &run.outcomes {
            assert_eq!(outcome.lookup, LookupStatus::SearchDisabled);
            assert_eq!(outcome.verdict.status, VerdictStatus::Unverifiable);
            assert_eq!(outcome.stage, CandidateStage::Done);
            assert!(outcome.score.is_some());
            assert!(outcome.failure.is_none());
        }
        assert!(run.errored().is_empty());
    }

    #[tokio::test]
    async fn test_unverifiable_policy_off_skips_scoring() {
        let settings = PipelineSettings {
            batch_size: 2,
            score_unverifiable: false,
        };
        let run = pipeline(None, settings).run(candidates(&["a", "b"]), job()).await;
        for outcome in &run.outcomes {
            assert_eq!(outcome.skip_reason, Some(SkipReason::UnverifiablePolicy));
            assert!(outcome.score.is_none());
            assert_eq!(outcome.stage, CandidateStage::Done);
        }
        assert_eq!(run.unscored().len(), 2);
        assert!(run.ranked().is_empty());
    }

    #[tokio::test]
    async fn test_flagged_candidates_are_not_scored() {
        let run = pipeline(Some(Arc::new(DelayedSearch)), PipelineSettings::default())
            .run(candidates(&["honest", "liar"]), job())
            .await;
        assert!(run.outcomes[0].score.is_some());
        assert_eq!(run.outcomes[1].verdict.status, VerdictStatus::Flagged);
        assert_eq!(run.outcomes[1].skip_reason, Some(SkipReason::Flagged));
        assert!(run.outcomes[1].score.is_none());
        assert_eq!(run.flagged().len(), 1);
    }

    #[tokio::test]
    async fn test_trust_check_failure_is_isolated() {
        let run = pipeline(Some(Arc::new(DelayedSearch)), PipelineSettings::default())
            .run(candidates(&["a", "broken", "c"]), job())
            .await;

        let broken = &run.outcomes[1];
        assert_eq!(broken.stage, CandidateStage::Error);
        assert_eq!(broken.verdict.status, VerdictStatus::Unverifiable);
        assert!(broken.score.is_none());
        assert_eq!(
            broken.failure.as_ref().map(|f| f.stage),
            Some(CandidateStage::TrustCheck)
        );

        assert_eq!(run.outcomes[0].stage, CandidateStage::Done);
        assert_eq!(run.outcomes[2].stage, CandidateStage::Done);
        assert_eq!(run.errored().len(), 1);
        assert_eq!(run.ranked().len(), 2);
    }

    #[tokio::test]
    async fn test_scoring_failure_keeps_verdict() {
        let run = pipeline(Some(Arc::new(DelayedSearch)), PipelineSettings::default())
            .run(candidates(&["unscorable"]), job())
            .await;
        let outcome = &run.outcomes[0];
        assert_eq!(outcome.verdict.status, VerdictStatus::Trusted);
        assert_eq!(outcome.stage, CandidateStage::Error);
        assert_eq!(outcome.failure.as_ref().map(|f| f.stage), Some(CandidateStage::Scoring));
    }

    #[tokio::test]
    async fn test_panicking_candidate_becomes_error_outcome() {
        let run = pipeline(None, PipelineSettings::default())
            .run(candidates(&["a", "panic", "c"]), job())
            .await;
        assert_eq!(run.outcomes.len(), 3);
        assert_eq!(run.outcomes[1].candidate.name, "panic");
        assert_eq!(run.outcomes[1].stage, CandidateStage::Error);
        let failure = run.outcomes[1].failure.as_ref().unwrap();
        assert!(failure.message.starts_with("Internal error: candidate task failed"));
        assert!(run.outcomes[0].score.is_some());
        assert!(run.outcomes[2].score.is_some());
    }

    #[test]
    fn test_missing_anthropic_key_is_fatal() {
        let config = Config::default();
        assert!(matches!(
            Services::from_config(&config),
            Err(AppError::MissingCredential("ANTHROPIC_API_KEY"))
        ));
    }

    #[test]
    fn test_missing_search_key_degrades() {
        let mut config = Config::default();
        config.anthropic_api_key = Some("sk-test".to_string());
        let services = Services::from_config(&config).unwrap();
        assert!(!services.lookup.is_enabled());
        assert!(services.refiner.is_none());
        assert_eq!(services.scorer.backend(), "llm");
    }
}
