#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde_json::{json, Value};

use evalform::config::{Config, SheetsConfig, SinkConfig};
use evalform::sink::auth::Claims;
use evalform::sink::memory::MemorySink;
use evalform::sink::{AppendReceipt, RowSink, SinkError};
use evalform::state::SharedState;
use evalform::submission::normalize::Row;

pub const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");
pub const CLIENT_EMAIL: &str = "evaluations@test-project.iam.gserviceaccount.com";
pub const SHEET_ID: &str = "test-sheet-id";
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";

/// A running app instance on a random port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Submit an evaluation as JSON, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submitFeedback"))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data, return (body, status).
    pub async fn submit_form(&self, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submitFeedback"))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config(sink: SinkConfig) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        sink,
        max_body_size: 65_536,
        trusted_proxies: vec![],
        server_validation: true,
        rate_limit: 0,
        rate_limit_window_secs: 60,
        log_level: "warn".to_string(),
    }
}

/// Spawn the app backed by an in-memory sink.
pub async fn spawn_app() -> (TestApp, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let app = spawn_app_with(test_config(SinkConfig::Memory), sink.clone()).await;
    (app, sink)
}

pub async fn spawn_app_with(config: Config, sink: Arc<dyn RowSink>) -> TestApp {
    let (app, state) = evalform::build_app(config, sink);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
    }
}

/// A sink whose appends always fail, counting attempts.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn append_row(&self, _row: &Row) -> Result<AppendReceipt, SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Request("connection reset by peer".to_string()))
    }
}

// ── Fake Google APIs ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeGoogleMode {
    Healthy,
    RejectToken,
    RejectAppend,
}

#[derive(Debug, Clone)]
pub struct AppendCall {
    pub sheet_id: String,
    pub range: String,
    pub value_input_option: Option<String>,
    pub body: Value,
}

struct FakeGoogleState {
    mode: FakeGoogleMode,
    token_uri: String,
    token_requests: AtomicUsize,
    appends: Mutex<Vec<AppendCall>>,
}

/// Token endpoint and Sheets `values.append` stand-ins.
pub struct FakeGoogle {
    pub addr: SocketAddr,
    state: Arc<FakeGoogleState>,
}

impl FakeGoogle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn sheets_config(&self) -> SheetsConfig {
        SheetsConfig {
            client_email: CLIENT_EMAIL.to_string(),
            private_key: PRIVATE_KEY.to_string(),
            sheet_id: SHEET_ID.to_string(),
            range: evalform::config::DEFAULT_RANGE.to_string(),
            token_uri: self.token_uri(),
            api_base: self.base_url(),
            value_input: Default::default(),
        }
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> Vec<AppendCall> {
        self.state.appends.lock().unwrap().clone()
    }
}

pub async fn spawn_fake_google(mode: FakeGoogleMode) -> FakeGoogle {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake google");
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(FakeGoogleState {
        mode,
        token_uri: format!("http://{addr}/token"),
        token_requests: AtomicUsize::new(0),
        appends: Mutex::new(Vec::new()),
    });

    let router = Router::new()
        .route("/token", post(fake_token))
        .route("/v4/spreadsheets/{sheet_id}/values/{range}", post(fake_append))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake google failed");
    });

    FakeGoogle { addr, state }
}

async fn fake_token(
    State(state): State<Arc<FakeGoogleState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    if state.mode == FakeGoogleMode::RejectToken {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid JWT Signature." })),
        )
            .into_response();
    }

    if form.get("grant_type").map(String::as_str) != Some("urn:ietf:params:oauth:grant-type:jwt-bearer") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "unsupported_grant_type" }))).into_response();
    }

    let Some(assertion) = form.get("assertion") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_request" }))).into_response();
    };

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[state.token_uri.as_str()]);
    validation.set_issuer(&[CLIENT_EMAIL]);
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();

    match decode::<Claims>(assertion, &key, &validation) {
        Ok(data) if data.claims.scope == evalform::sink::auth::SHEETS_SCOPE => Json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer",
        }))
        .into_response(),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response(),
    }
}

async fn fake_append(
    State(state): State<Arc<FakeGoogleState>>,
    Path((sheet_id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {ACCESS_TOKEN}").as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "code": 401, "status": "UNAUTHENTICATED" } })),
        )
            .into_response();
    }

    if state.mode == FakeGoogleMode::RejectAppend {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED" } })),
        )
            .into_response();
    }

    let mut appends = state.appends.lock().unwrap();
    appends.push(AppendCall {
        sheet_id: sheet_id.clone(),
        range,
        value_input_option: query.get("valueInputOption").cloned(),
        body,
    });
    let row_number = appends.len() + 1;

    Json(json!({
        "spreadsheetId": sheet_id,
        "tableRange": "Evaluations!A1:F1",
        "updates": {
            "spreadsheetId": sheet_id,
            "updatedRange": format!("Evaluations!A{row_number}:F{row_number}"),
            "updatedRows": 1,
            "updatedColumns": 6,
            "updatedCells": 6,
        },
    }))
    .into_response()
}
