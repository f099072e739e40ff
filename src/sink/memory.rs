use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{AppendReceipt, RowSink, SinkError};
use crate::submission::normalize::Row;

/// Keeps appended rows in process memory. Used for local runs and tests.
#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<Row>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RowSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append_row(&self, row: &Row) -> Result<AppendReceipt, SinkError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| SinkError::Request("memory sink lock poisoned".to_string()))?;
        rows.push(row.clone());
        tracing::debug!("Memory sink now holds {} rows", rows.len());

        Ok(AppendReceipt {
            updated_range: Some(format!("memory!A{n}:F{n}", n = rows.len())),
            updated_rows: 1,
        })
    }
}
