pub mod ingest;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ingest", post(ingest::ingest_log))
}
