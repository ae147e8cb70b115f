use serde::{Deserialize, Deserializer};

pub mod candidate;
pub mod evidence;
pub mod job;
pub mod levels;
pub mod score;
pub mod verdict;

pub use candidate::{CandidateRecord, DateSpan, Education, Experience};
pub use evidence::{LookupStatus, ProfileEvidence};
pub use job::JobDescription;
pub use levels::{DegreeLevel, SeniorityLevel};
pub use score::{DimensionScores, FitTier, ScoreResult};
pub use verdict::{Discrepancy, DiscrepancyKind, Severity, TrustVerdict, VerdictStatus};

/// Reads `null` as the field's default. Model replies use null for "unknown".
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
