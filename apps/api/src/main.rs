mod admin;
mod auth;
mod config;
mod counseling;
mod errors;
mod llm_client;
mod models;
mod programs;
mod routes;
mod state;
mod store;
mod students;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AuthProvider;
use crate::config::{AppEnv, Config};
use crate::counseling::cache::{TurnCache, TURN_CAPACITY};
use crate::llm_client::LlmClient;
use crate::programs::repo::ProgramRepo;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::{MemoryStore, StaticTokenAuth};
use crate::store::supabase::SupabaseClient;
use crate::store::RowStore;
use crate::students::repo::StudentRepo;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing/invalid required vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Counsel API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.app_env
    );

    // Row store + auth provider: hosted service, or hermetic in-memory
    // backends under APP_ENV=testing.
    let (store, auth): (Arc<dyn RowStore>, Arc<dyn AuthProvider>) = match config.app_env {
        AppEnv::Testing => {
            info!("Testing environment: in-memory store, static-token auth");
            (
                Arc::new(MemoryStore::new()),
                Arc::new(StaticTokenAuth::new(config.supabase_key.clone())),
            )
        }
        _ => {
            let client = Arc::new(SupabaseClient::new(
                config.supabase_url.clone(),
                config.supabase_key.clone(),
            ));
            info!("Hosted store client initialized");
            (client.clone() as Arc<dyn RowStore>, client)
        }
    };

    // Initialize LLM gateway
    let gateway = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    );
    info!("LLM gateway initialized (model: {})", gateway.model());

    // Build app state
    let state = AppState {
        students: StudentRepo::new(store.clone()),
        programs: ProgramRepo::new(store),
        auth,
        gateway: Arc::new(gateway),
        cache: Arc::new(TurnCache::new(TURN_CAPACITY)),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
