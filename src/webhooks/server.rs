// src/webhooks/server.rs
//! HTTP surface: JSON read API over the inventory cache plus the
//! revalidation webhook.

use crate::{
    cache::FeedCache,
    catalog::{self, SortKey},
    config::Config,
    error::{FeedError, RevalidateError},
    webhooks::{
        revalidate::{RecordingInvalidator, Revalidator},
        types::{ErrorBody, RevalidateRequest, SearchParams},
    },
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde_json::json;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub cache: FeedCache,
    pub revalidator: Arc<Revalidator>,
    pub pages: Arc<RecordingInvalidator>,
    pub images_unoptimized: bool,
}

impl AppState {
    pub fn new(cache: FeedCache, config: &Config) -> Self {
        let pages = Arc::new(RecordingInvalidator::new());
        let revalidator = Arc::new(Revalidator::new(
            cache.clone(),
            config.webhook_secret.clone(),
            pages.clone(),
        ));
        Self {
            cache,
            revalidator,
            pages,
            images_unoptimized: config.images_unoptimized,
        }
    }
}

/// Inventory HTTP server
pub struct InventoryServer {
    bind_addr: String,
    state: AppState,
}

impl InventoryServer {
    pub fn new(bind_addr: &str, state: AppState) -> Self {
        Self {
            bind_addr: bind_addr.to_string(),
            state,
        }
    }

    /// Start the server; runs until the listener fails.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = self.create_router();

        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;

        info!("🚀 Inventory server listening on {}", self.bind_addr);
        info!("📡 Ready to receive revalidation webhooks at /api/revalidate");

        axum::serve(listener, app).await?;

        Ok(())
    }

    pub fn create_router(&self) -> Router {
        router(self.state.clone())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/vehicles", get(list_vehicles))
        .route("/api/vehicles/:id", get(get_vehicle))
        .route("/api/search", get(search_vehicles))
        .route("/api/manufacturers", get(list_manufacturers))
        .route("/api/revalidate", post(handle_revalidate))
        .route("/health", get(health_check))
        .route("/status", get(cache_status))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn feed_failure(context: &str, err: &FeedError) -> Response {
    error!("API Error ({}): {}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch vehicles")
}

pub async fn list_vehicles(State(state): State<AppState>) -> Response {
    match state.cache.get_vehicles().await {
        Ok(records) => Json(records.as_slice()).into_response(),
        Err(e) => feed_failure("list vehicles", &e),
    }
}

pub async fn get_vehicle(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.cache.get_vehicle_by_id(&id).await {
        Ok(Some(vehicle)) => Json(vehicle).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Vehicle not found"),
        Err(e) => feed_failure("get vehicle", &e),
    }
}

pub async fn search_vehicles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let sort = match params.sort.as_deref() {
        None | Some("") => SortKey::default(),
        Some(raw) => match raw.parse::<SortKey>() {
            Ok(sort) => sort,
            Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
        },
    };

    match state.cache.get_vehicles().await {
        Ok(records) => Json(catalog::search_terms(&records, &params.q, sort)).into_response(),
        Err(e) => feed_failure("search", &e),
    }
}

pub async fn list_manufacturers(State(state): State<AppState>) -> Response {
    match state.cache.get_vehicles().await {
        Ok(records) => Json(catalog::manufacturers(&records)).into_response(),
        Err(e) => feed_failure("list manufacturers", &e),
    }
}

/// `POST /api/revalidate`. The body is decoded by hand so callers that omit
/// the JSON content type are still accepted.
pub async fn handle_revalidate(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = RevalidateRequest::from_body(&body)
        .and_then(|request| state.revalidator.revalidate(&request));

    match outcome {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => {
            if let RevalidateError::BadRequest(reason) = &e {
                error!("[ISR] Revalidate endpoint error: {}", reason);
            }
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.public_message())
        }
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "inventory-feed",
        "timestamp": chrono::Utc::now().timestamp()
    }))
}

async fn cache_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "operational",
        "cache": state.cache.stats(),
        "webhookConfigured": state.revalidator.is_configured(),
        "lastStaleRoutes": state.pages.latest(),
        "imagesUnoptimized": state.images_unoptimized,
        "timestamp": chrono::Utc::now().timestamp()
    }))
}
