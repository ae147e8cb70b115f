use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Services are built once at startup; a missing Anthropic key never gets this far.
    pub pipeline: Pipeline,
}
