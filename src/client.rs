//! Client side of the evaluation form.
//!
//! [`FormController`] owns the transient form state, validates before sending and
//! turns the endpoint's answer into a [`Notification`]. The browser page runs the
//! same flow in `static/evaluation-form.js`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::submission::schema::{self, Connection, Field, FieldErrors, DEFAULT_RATING};

pub const SUCCESS_TOAST: &str = "Feedback submitted successfully!";
pub const FAILURE_TOAST: &str = "Failed to submit feedback!";

#[derive(Debug)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    Network(String),
    /// The endpoint answered with a non-success status.
    Status(u16),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Network error: {msg}"),
            TransportError::Status(code) => write!(f, "Endpoint returned status {code}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Sends one payload to the submission endpoint.
#[async_trait]
pub trait FeedbackTransport: Send + Sync {
    async fn send(&self, payload: &Value) -> Result<(), TransportError>;
}

/// Posts JSON to `{base_url}/api/submitFeedback`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/api/submitFeedback", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl FeedbackTransport for HttpTransport {
    async fn send(&self, payload: &Value) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(resp.status().as_u16()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Success,
    Failure,
}

impl Notification {
    pub fn message(&self) -> &'static str {
        match self {
            Notification::Success => SUCCESS_TOAST,
            Notification::Failure => FAILURE_TOAST,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed locally; nothing was sent.
    Invalid(FieldErrors),
    /// One request was sent; the notification reflects its result.
    Sent(Notification),
}

pub struct FormController<T> {
    transport: T,
    values: BTreeMap<Field, String>,
    rating: u8,
    errors: FieldErrors,
}

impl<T: FeedbackTransport> FormController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            values: BTreeMap::new(),
            rating: DEFAULT_RATING,
            errors: FieldErrors::new(),
        }
    }

    /// Set a text field. `Field::Rating` is parsed; unparsable ratings are ignored.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if field == Field::Rating {
            if let Ok(rating) = value.trim().parse() {
                self.rating = rating;
            }
            return;
        }
        self.values.insert(field, value);
    }

    pub fn set_connection(&mut self, connection: Connection) {
        self.values.insert(Field::Connection, connection.as_str().to_string());
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.rating = rating;
    }

    pub fn value(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Form fields plus the current rating. Empty text fields are left out.
    pub fn candidate(&self) -> Value {
        let mut map = Map::new();
        for (field, value) in &self.values {
            if !value.is_empty() {
                map.insert(field.as_str().to_string(), Value::String(value.clone()));
            }
        }
        map.insert(Field::Rating.as_str().to_string(), Value::from(self.rating));
        Value::Object(map)
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let candidate = self.candidate();

        if let Err(errors) = schema::validate(&candidate) {
            self.errors = errors.clone();
            return SubmitOutcome::Invalid(errors);
        }
        self.errors = FieldErrors::new();

        match self.transport.send(&candidate).await {
            Ok(()) => {
                self.reset();
                SubmitOutcome::Sent(Notification::Success)
            }
            Err(e) => {
                tracing::warn!("Feedback submission failed: {e}");
                SubmitOutcome::Sent(Notification::Failure)
            }
        }
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.rating = DEFAULT_RATING;
        self.errors = FieldErrors::new();
    }
}
