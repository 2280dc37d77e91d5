//! HTTP gateway for assetmill.
//!
//! Serves the five bundles of a registry at their URL paths, plus a
//! `/health` endpoint reporting which snapshots are currently cached.
//!
//! Built on Axum for high performance async HTTP.

pub mod bundles;

use std::future::Future;
use std::sync::Arc;

use axum::{Router, extract::State, response::Json, routing::get};
use assetmill_core::{BundleKind, BundleRegistry};
use serde::Serialize;
use tracing::info;

pub use bundles::{CACHE_IMMUTABLE, CACHE_NONE, cache_control};

/// Shared application state for the gateway.
#[derive(Debug, Clone)]
pub struct AssetState {
    pub registry: Arc<BundleRegistry>,
    pub dev_mode: bool,
}

impl AssetState {
    pub fn new(registry: Arc<BundleRegistry>, dev_mode: bool) -> Self {
        Self { registry, dev_mode }
    }
}

/// Build the Axum router with the bundle routes and `/health`.
pub fn build_router(state: AssetState) -> Router {
    bundles::bundle_router(&state)
        .route("/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server and run until `shutdown` resolves.
pub async fn start(
    config: &assetmill_config::AppConfig,
    registry: Arc<BundleRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(AssetState::new(registry, config.dev_mode));

    info!(addr = %addr, dev_mode = config.dev_mode, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Gateway stopped");
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    bundles: Vec<BundleHealth>,
}

#[derive(Serialize)]
struct BundleHealth {
    kind: BundleKind,
    url: String,
    valid: bool,
    /// Size of the cached snapshot, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
}

async fn health_handler(State(state): State<AssetState>) -> Json<HealthResponse> {
    let bundles = state
        .registry
        .bundles()
        .map(|bundle| {
            let cached = bundle.cached();
            BundleHealth {
                kind: bundle.kind(),
                url: bundle.url_path().to_string(),
                valid: cached.is_some(),
                bytes: cached.map(|snapshot| snapshot.len()),
            }
        })
        .collect();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        bundles,
    })
}
