//! Resident HTTP server exposing search over a live, reloadable index
//! (spec §6). Used by `pindex watch --daemon` / `PROJECT_INDEX_SERVER=1`.

use crate::config::Settings;
use crate::indexing::IndexBuilder;
use crate::model::ProjectIndex;
use crate::persistence;
use crate::query::QueryEngine;
use crate::semantic::cache::{doc_entries, semantic_search, DocCache};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Uninitialized,
    Ready,
    Reloading,
}

pub struct AppState {
    pub index: RwLock<ProjectIndex>,
    pub state: RwLock<ServerState>,
    pub settings: Settings,
}

pub fn router(settings: Settings, index: ProjectIndex) -> Router {
    let state = Arc::new(AppState {
        index: RwLock::new(index),
        state: RwLock::new(ServerState::Ready),
        settings,
    });

    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/semsearch", post(semsearch))
        .route("/reload", post(reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    state: ServerState,
    files_indexed: usize,
    updated_at: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let index = state.index.read();
    Json(HealthResponse {
        ok: true,
        state: *state.state.read(),
        files_indexed: index.files.len(),
        updated_at: index.updated_at.clone(),
    })
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    exact: bool,
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    if req.query.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "query required");
    }

    let index = state.index.read();
    if index.files.is_empty() {
        return api_error(StatusCode::NOT_FOUND, "No index found");
    }

    let engine = QueryEngine::new(&index);
    let hits = engine.search(&req.query, req.exact);
    Json(serde_json::json!({ "query": req.query, "results": hits })).into_response()
}

#[derive(Debug, Deserialize)]
struct SemSearchRequest {
    query: String,
    #[serde(default = "default_k")]
    k: usize,
    model: Option<String>,
}

fn default_k() -> usize {
    20
}

async fn semsearch(State(state): State<Arc<AppState>>, Json(req): Json<SemSearchRequest>) -> Response {
    if req.query.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "query required");
    }

    let index = state.index.read();
    if index.files.is_empty() {
        return api_error(StatusCode::NOT_FOUND, "No index found");
    }

    let model_id = req.model.unwrap_or_else(|| state.settings.semantic.model.clone());
    let entries = doc_entries(&index);

    let mut cache = DocCache::load(&state.settings.vectors_path());
    if !cache.is_reusable_for(&model_id, &entries) {
        cache = match DocCache::rebuild(&model_id, entries) {
            Ok(cache) => cache,
            Err(e) => return api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        };
        if let Err(e) = cache.save(&state.settings.vectors_path()) {
            tracing::warn!(error = %e, "failed to persist rebuilt semantic cache");
        }
    }

    match semantic_search(&req.query, &cache, req.k) {
        Ok(hits) => {
            let payload: Vec<_> = hits
                .into_iter()
                .map(|(entry, score)| serde_json::json!({ "id": entry.id, "file": entry.file, "line": entry.line, "score": score }))
                .collect();
            Json(serde_json::json!({ "query": req.query, "results": payload })).into_response()
        }
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn reload(State(state): State<Arc<AppState>>) -> Response {
    *state.state.write() = ServerState::Reloading;

    let builder = IndexBuilder::new(&state.settings.indexing);
    let now = chrono::Utc::now().to_rfc3339();
    let fresh = builder.build_full(&state.settings.project_root, &now);

    if let Err(e) = persistence::save_index(&state.settings.index_path(), &fresh) {
        *state.state.write() = ServerState::Ready;
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }

    let entries = doc_entries(&fresh);
    let vectors = match DocCache::rebuild(&state.settings.semantic.model, entries) {
        Ok(cache) => {
            if let Err(e) = cache.save(&state.settings.vectors_path()) {
                tracing::warn!(error = %e, "failed to persist semantic cache on reload");
            }
            cache.rows.len()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to rebuild semantic cache on reload");
            0
        }
    };

    let files = fresh.files.len();
    *state.index.write() = fresh;
    *state.state.write() = ServerState::Ready;

    Json(serde_json::json!({ "status": "reloaded", "files": files, "vectors": vectors })).into_response()
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
