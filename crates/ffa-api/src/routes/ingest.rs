//! Log ingestion: validate the API key, acknowledge with 202, persist in a
//! detached task. The caller is never blocked on, and never told about,
//! the storage outcome.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use tracing::warn;

use ffa_core::{NewLogRecord, StoreError, WorkerStats};

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-freeforall-key";

/// Ingest payload. Everything is optional at the serde level; validation
/// order (key, then message) is enforced in the handler so a missing key
/// always answers 401 even when the body is empty or malformed.
#[derive(Debug, Default, Deserialize)]
pub struct IngestPayload {
    pub api_key: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub context: Option<serde_json::Value>,
    pub environment: Option<String>,
    pub hostname: Option<String>,
}

pub async fn ingest_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    // Lenient body handling: an absent or unparsable body is treated as an
    // empty payload so key validation still runs first.
    let payload: IngestPayload = serde_json::from_slice(&body).unwrap_or_default();

    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| payload.api_key.clone());

    let Some(api_key) = api_key else {
        return Err(ApiError::Unauthorized(
            "Missing X-FreeForAll-Key or api_key".to_string(),
        ));
    };

    let application = match state.store.application_by_key(&api_key).await {
        Ok(Some(app)) => app,
        Ok(None) => return Err(ApiError::Unauthorized("Invalid API key".to_string())),
        Err(StoreError::Unavailable) => {
            return Err(ApiError::Unavailable("Service unavailable".to_string()))
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let Some(message) = payload.message.filter(|m| !m.is_empty()) else {
        return Err(ApiError::BadRequest("Missing message".to_string()));
    };

    let record = NewLogRecord {
        app_id: application.id,
        level: payload.level.unwrap_or_else(|| "info".to_string()),
        message,
        context: payload.context,
        environment: payload
            .environment
            .unwrap_or_else(|| "production".to_string()),
        hostname: payload.hostname,
    };

    WorkerStats::incr(&state.stats.logs_accepted);

    // Fire-and-forget: the write runs on its own task while the 202 goes
    // out. A failure here ends in a log line, never in caller-visible state.
    let store = Arc::clone(&state.store);
    let stats = Arc::clone(&state.stats);
    tokio::spawn(async move {
        if let Err(e) = store.insert_log(record).await {
            warn!(error = %e, "Ingestion write failed");
            WorkerStats::incr(&stats.logs_dropped);
        }
    });

    Ok(StatusCode::ACCEPTED)
}
