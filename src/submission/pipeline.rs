use std::net::IpAddr;

use serde_json::Value;

use crate::error::AppError;
use crate::sink::AppendReceipt;
use crate::state::AppState;

use super::normalize;
use super::schema;

/// Take one decoded body through validation, rate limiting and a single append.
///
/// Only submissions that could reach the sink count against the per-IP quota.
pub async fn run(state: &AppState, client_ip: IpAddr, raw_data: Value) -> Result<AppendReceipt, AppError> {
    if state.config.server_validation {
        schema::validate(&raw_data)?;
    }

    state
        .submission_limiter
        .check(client_ip)
        .map_err(AppError::RateLimited)?;

    let row = normalize::normalize(&raw_data);

    let receipt = state.sink.append_row(&row).await?;

    tracing::info!(
        sink = state.sink.name(),
        updated_range = receipt.updated_range.as_deref().unwrap_or("-"),
        "Evaluation appended"
    );

    Ok(receipt)
}
