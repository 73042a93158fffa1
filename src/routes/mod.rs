pub mod attempts;
pub mod health;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/tests/:test_id/start", post(attempts::start_attempt))
        .route(
            "/api/tests/:test_id/in-progress",
            get(attempts::get_in_progress),
        )
        .route(
            "/api/tests/:test_id/attempts/:attempt_id/questions",
            get(attempts::fetch_questions),
        )
        .route(
            "/api/attempts/:attempt_id/submit",
            post(attempts::submit_attempt),
        )
        .route("/api/attempts/:attempt_id", get(attempts::get_attempt_details))
        .route("/api/my/results", get(attempts::my_results))
        .route("/api/tests/:test_id/results", get(attempts::test_results))
        .with_state(state)
}
