use std::sync::Arc;

use crate::analysis::FacialAnalyzer;
use crate::config::Config;
use crate::interview::inflight::InflightSessions;
use crate::interview::store::SessionStore;
use crate::llm_client::ModelClient;
use crate::media::MediaArchive;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session document store. Production: `PgSessionStore`.
    pub store: Arc<dyn SessionStore>,
    /// Model invocation adapter. Production: `LlmClient`.
    pub model: Arc<dyn ModelClient>,
    /// External facial-analysis collaborator. Default: `NoopFacialAnalyzer`.
    pub analyzer: Arc<dyn FacialAnalyzer>,
    pub media: MediaArchive,
    /// Single-flight guard: one model exchange per session at a time.
    pub inflight: Arc<InflightSessions>,
    pub config: Config,
}
