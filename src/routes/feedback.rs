use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::{metadata, parser, pipeline, schema, SUCCESS_MESSAGE};

pub async fn submit_feedback(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let ip = metadata::client_ip(&headers, Some(addr.ip()), &state.config.trusted_proxies);
    let span = tracing::info_span!("submission", request_id = %Uuid::now_v7(), client_ip = %ip);

    accept(state, ip, headers, body).instrument(span).await
}

async fn accept(
    state: SharedState,
    ip: IpAddr,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    tracing::debug!(user_agent = metadata::user_agent(&headers), "Evaluation received");

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let raw_data = parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?;

    pipeline::run(&state, ip, raw_data).await?;

    Ok((StatusCode::OK, Json(json!({ "message": SUCCESS_MESSAGE }))).into_response())
}

pub async fn evaluation_schema() -> Json<serde_json::Value> {
    Json(schema::descriptor())
}
