pub mod auth;
pub mod memory;
pub mod sheets;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SinkConfig;
use crate::submission::normalize::Row;

#[derive(Debug)]
pub enum SinkError {
    /// Credentials could not be signed or the token endpoint refused them.
    Auth(String),
    /// The request never produced a response.
    Request(String),
    /// The sink answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Auth(msg) => write!(f, "Sink authentication failed: {msg}"),
            SinkError::Request(msg) => write!(f, "Sink request failed: {msg}"),
            SinkError::Rejected { status, body } => {
                write!(f, "Sink rejected append ({status}): {body}")
            }
        }
    }
}

impl std::error::Error for SinkError {}

/// What the sink reports back after a successful append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppendReceipt {
    pub updated_range: Option<String>,
    pub updated_rows: u64,
}

/// An append-only tabular store. Rows are never read back.
#[async_trait]
pub trait RowSink: Send + Sync {
    fn name(&self) -> &str;
    async fn append_row(&self, row: &Row) -> Result<AppendReceipt, SinkError>;
}

/// Build the configured sink. Fails when sheet credentials cannot be used.
pub fn from_config(config: &SinkConfig) -> Result<Arc<dyn RowSink>, SinkError> {
    match config {
        SinkConfig::Sheets(sheets) => {
            let sink = sheets::SheetsSink::new(sheets)?;
            tracing::info!("Appending evaluations to {}", sink.append_url());
            Ok(Arc::new(sink))
        }
        SinkConfig::Memory => {
            tracing::warn!("Using in-memory sink; submissions are lost on restart");
            Ok(Arc::new(memory::MemorySink::new()))
        }
    }
}
