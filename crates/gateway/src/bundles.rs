//! Bundle routes.
//!
//! Every bundle is served at its URL path straight from the registry's
//! snapshot, which is rebuilt on demand when stale.

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use assetmill_core::{BundleKind, MediaType};
use tracing::warn;

use crate::AssetState;

/// Caching policy for assets that never change under a given URL.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
/// Caching policy for documents and scripts, and for everything in dev mode.
pub const CACHE_NONE: &str = "no-cache, no-store, must-revalidate";

/// Build a router with one GET route per bundle.
pub fn bundle_router(state: &AssetState) -> Router<AssetState> {
    BundleKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            let path = state.registry.url_path(kind).to_string();
            router.route(
                &path,
                get(move |State(state): State<AssetState>| serve_bundle(state, kind)),
            )
        })
}

async fn serve_bundle(state: AssetState, kind: BundleKind) -> Response {
    match state.registry.snapshot(kind) {
        Ok(snapshot) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type(kind.media_type())),
                (header::CACHE_CONTROL, cache_control(kind, state.dev_mode).to_string()),
            ],
            snapshot.to_vec(),
        )
            .into_response(),
        Err(e) => {
            warn!(bundle = %kind, error = %e, "Failed to build bundle");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn content_type(media_type: MediaType) -> String {
    format!("{media_type}; charset=utf-8")
}

/// The `Cache-Control` value a bundle is served with.
pub fn cache_control(kind: BundleKind, dev_mode: bool) -> &'static str {
    match kind.media_type() {
        _ if dev_mode => CACHE_NONE,
        MediaType::Html | MediaType::JavaScript => CACHE_NONE,
        MediaType::Css | MediaType::Svg => CACHE_IMMUTABLE,
    }
}
