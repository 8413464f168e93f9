//! HTTP routes.
//!
//! | Route                    | Response                                      |
//! |--------------------------|-----------------------------------------------|
//! | `GET /ws`                | WebSocket stream session                      |
//! | `GET /name_search?name=` | grouped name-search hits                      |
//! | `GET /types`             | sorted distinct origin/type labels            |
//! | `GET /lengths`           | `[min, max]` sequence length                  |
//! | `GET /terms?ontology=&q=`| term names for autocompletion                 |
//! | `GET /structure/{name}`  | structure file bytes, converted on demand     |
//! | `GET /health`            | `OK`                                          |
//!
//! Every route answers cross-origin requests from any origin. HTTP responses
//! of at least [`GZIP_MIN_SIZE`] bytes are gzip-compressed when the client
//! accepts it; the WebSocket upgrade is left alone.

use crate::state::AppState;
use crate::ws::ws_handler;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use protmap_core::search::SearchHit;
use protmap_core::terms::{TermName, DEFAULT_ONTOLOGY};
use serde::Deserialize;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

/// Maximum number of term names returned by `/terms`.
const TERM_LOOKUP_LIMIT: usize = 50;

/// Responses smaller than this many bytes go out uncompressed.
pub const GZIP_MIN_SIZE: u16 = 1000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/name_search", get(name_search))
        .route("/types", get(types))
        .route("/lengths", get(lengths))
        .route("/terms", get(terms))
        .route("/structure/{name}", get(structure))
        .route("/health", get(|| async { "OK" }))
        // Layers only wrap the routes above, so /ws is never compressed.
        .layer(CompressionLayer::new().compress_when(SizeAbove::new(GZIP_MIN_SIZE)))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct NameSearchParams {
    name: String,
}

async fn name_search(
    State(state): State<AppState>,
    Query(params): Query<NameSearchParams>,
) -> Json<Vec<SearchHit>> {
    Json(state.search().search(&params.name))
}

async fn types(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.table().kinds().sorted_labels())
}

async fn lengths(State(state): State<AppState>) -> Json<[u32; 2]> {
    let (min, max) = state.table().length_bounds().unwrap_or((0, 0));
    Json([min, max])
}

#[derive(Debug, Deserialize)]
struct TermParams {
    ontology: Option<String>,
    #[serde(default)]
    q: String,
}

async fn terms(State(state): State<AppState>, Query(params): Query<TermParams>) -> Json<Vec<TermName>> {
    let ontology = params.ontology.as_deref().unwrap_or(DEFAULT_ONTOLOGY);
    Json(state.catalog().lookup(ontology, &params.q, TERM_LOOKUP_LIMIT))
}

async fn structure(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.structures().fetch(&name).await {
        Ok(Some(bytes)) => bytes.into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("no structure named {name}")).into_response(),
        Err(e) => {
            tracing::error!(structure = %name, error = %e, "structure fetch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "structure fetch failed").into_response()
        }
    }
}
