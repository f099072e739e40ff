pub mod feedback;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/submitFeedback", post(feedback::submit_feedback))
        .route("/api/evaluationSchema", get(feedback::evaluation_schema))
}
