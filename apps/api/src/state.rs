use std::sync::Arc;

use crate::insights::Analyzer;
use crate::llm_client::LlmClient;
use crate::media::MediaStore;
use crate::persistence::PersistenceGateway;
use crate::store::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub media: Arc<dyn MediaStore>,
    pub llm: LlmClient,
    /// Pluggable analysis capability. Default: LlmAnalyzer over the shared client.
    pub analyzer: Arc<dyn Analyzer>,
    /// Live per-user session stores, created at sign-in and torn down at sign-out.
    pub sessions: SessionRegistry,
}
