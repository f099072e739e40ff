use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::SubmissionRateLimiter;
use crate::sink::RowSink;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub sink: Arc<dyn RowSink>,
    pub submission_limiter: SubmissionRateLimiter,
}
