//! Admin HTTP surface (SPEC_FULL.md §4.10). A thin `axum` shell: health
//! checks plus read-only inspection endpoints, guarded by OIDC bearer-token
//! verification unless `debug.disable_auth` is set. No write endpoints;
//! this never bypasses the Recorder/Posting transactional protocols.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jsonwebtoken::DecodingKey;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::db::Store;
use crate::domain::{Reading, Transaction};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Store>,
    pub oidc_issuer: Arc<str>,
    pub decoding_key: Option<Arc<DecodingKey>>,
    pub disable_auth: bool,
}

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/readings", get(list_readings))
        .route("/transactions", get(list_transactions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ApiState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.store.pool).await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

async fn auth_layer(
    State(state): State<ApiState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    if state.disable_auth {
        return next.run(request).await;
    }

    let Some(key) = state.decoding_key.as_ref() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "auth not configured").into_response();
    };

    let header_value = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = match crate::auth::extract_bearer(header_value) {
        Ok(t) => t,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    match crate::auth::verify_bearer_token(token, &state.oidc_issuer, key) {
        Ok(_claims) => next.run(request).await,
        Err(_) => StatusCode::UNAUTHORIZED.into_response(),
    }
}

#[derive(Serialize)]
struct ReadingsResponse {
    readings: Vec<Reading>,
}

async fn list_readings(State(state): State<ApiState>) -> Result<Json<ReadingsResponse>, StatusCode> {
    let readings = sqlx::query_as::<_, Reading>(
        "SELECT id, created_at, periodic FROM reading ORDER BY created_at DESC LIMIT 50",
    )
    .fetch_all(&state.store.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ReadingsResponse { readings }))
}

#[derive(Serialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

async fn list_transactions(State(state): State<ApiState>) -> Result<Json<TransactionsResponse>, StatusCode> {
    let transactions = sqlx::query_as::<_, Transaction>(
        r#"SELECT id, occurred_at, description, type, customer_id, period_end FROM "transaction" ORDER BY occurred_at DESC LIMIT 50"#,
    )
    .fetch_all(&state.store.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(TransactionsResponse { transactions }))
}
