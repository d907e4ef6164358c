use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::counseling::cache::TurnCache;
use crate::llm_client::CompletionGateway;
use crate::programs::repo::ProgramRepo;
use crate::students::repo::StudentRepo;

/// Shared application state injected into all route handlers via Axum
/// extractors. Store, auth, and gateway sit behind trait objects so the
/// hosted backends and the in-memory/test backends are interchangeable.
#[derive(Clone)]
pub struct AppState {
    pub students: StudentRepo,
    pub programs: ProgramRepo,
    pub auth: Arc<dyn AuthProvider>,
    pub gateway: Arc<dyn CompletionGateway>,
    /// Best-effort recent-turn cache; the external store stays authoritative.
    pub cache: Arc<TurnCache>,
    pub config: Config,
}
