//! Inputs: applicant CSV exports and job description files.

pub mod history;
pub mod job_description;
pub mod workable;

pub use job_description::{load_job_description, parse_job_description, JobDescriptionRefiner};
pub use workable::{load_candidates, parse_candidates};
