// src/api.rs
//! HTTP surface. Thin translation from routes to [`TenderService`] calls;
//! response envelopes follow `{success, data, timestamp, ...}`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::AggregatorError;
use crate::service::TenderService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TenderService>,
}

impl AppState {
    pub fn new(service: TenderService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/scrapers", get(list_scrapers))
        .route("/api/stats", get(stats))
        .route("/api/scrape/all", get(scrape_all))
        .route("/api/scrape/{source}", get(scrape_source))
        .route("/api/data/{source}", get(cached_data))
        .route("/api/export/json", get(export_json))
        .route("/api/export/csv", get(export_csv))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// `?force=true` (case-insensitive) bypasses the cache; anything else does not.
fn force_flag(q: &HashMap<String, String>) -> bool {
    q.get("force")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn from_service(err: AggregatorError, state: &AppState) -> Self {
        match err {
            AggregatorError::UnknownSource(key) => {
                let available = state.service.aggregator().registry().keys();
                Self {
                    status: StatusCode::BAD_REQUEST,
                    body: json!({
                        "success": false,
                        "error": format!("Invalid source: {key}. Available: {available:?}"),
                        "source": key,
                    }),
                }
            }
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: json!({ "success": false, "error": other.to_string() }),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    let mut endpoints = vec![
        json!({"path": "/api/health", "method": "GET", "description": "Health check"}),
        json!({"path": "/api/scrapers", "method": "GET", "description": "List all available scrapers"}),
        json!({"path": "/api/stats", "method": "GET", "description": "Scraper statistics"}),
        json!({"path": "/api/scrape/all", "method": "GET", "description": "Run all scrapers"}),
    ];
    for src in state.service.list_sources() {
        endpoints.push(json!({
            "path": format!("/api/scrape/{}", src.key),
            "method": "GET",
            "description": format!("Run {} scraper", src.display_name),
        }));
        endpoints.push(json!({
            "path": format!("/api/data/{}", src.key),
            "method": "GET",
            "description": format!("Get cached {} data", src.display_name),
        }));
    }
    endpoints.push(json!({"path": "/api/export/json", "method": "GET", "description": "Export all data as JSON"}));
    endpoints.push(json!({"path": "/api/export/csv", "method": "GET", "description": "Export all data as CSV"}));

    Json(json!({
        "name": "Tender Scraper API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "API for scraping tender data from various sources",
        "documentation": {
            "endpoints": endpoints,
            "usage": "Add ?force=true to bypass cache and force fresh scraping",
        },
        "timestamp": now_iso(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": now_iso(),
        "message": "Tender Scraper API is running",
        "scrapers_loaded": state.service.list_sources().len(),
    }))
}

async fn list_scrapers(State(state): State<AppState>) -> Json<Value> {
    let map: BTreeMap<String, Value> = state
        .service
        .list_sources()
        .into_iter()
        .map(|s| (s.key, json!({ "display_name": s.display_name })))
        .collect();
    Json(json!(map))
}

async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "stats": state.service.stats(),
        "timestamp": now_iso(),
    }))
}

async fn scrape_all(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let results = state.service.run_all(force_flag(&q)).await;
    let data: BTreeMap<&str, &Vec<_>> = results.iter().map(|(k, v)| (k.as_str(), &**v)).collect();
    Json(json!({
        "success": true,
        "data": data,
        "timestamp": now_iso(),
    }))
}

async fn scrape_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let lookup = state
        .service
        .run_detailed(&source, force_flag(&q))
        .await
        .map_err(|e| ApiError::from_service(e, &state))?;

    let body = Json(json!({
        "success": true,
        "data": &*lookup.data,
        "source": source,
        "timestamp": now_iso(),
    }));
    Ok(([("x-cache", lookup.status.as_str())], body).into_response())
}

async fn cached_data(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snap = state
        .service
        .cached(&source)
        .map_err(|e| ApiError::from_service(e, &state))?;
    Ok(Json(json!({
        "success": true,
        "data": &*snap.data,
        "timestamp": snap.fetched_at,
        "source": source,
    })))
}

async fn export_json(State(state): State<AppState>) -> Json<Value> {
    let all = state.service.export_json();
    Json(json!({
        "success": true,
        "count": all.len(),
        "data": all,
        "timestamp": now_iso(),
    }))
}

async fn export_csv(State(state): State<AppState>) -> Json<Value> {
    let all = state.service.export_json();
    Json(json!({
        "success": true,
        "data": crate::views::to_csv(&all),
        "count": all.len(),
        "format": "csv",
        "timestamp": now_iso(),
    }))
}
