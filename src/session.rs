use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use utoipa::ToSchema;

use crate::pipeline::Dataset;

/// Session shared between request handlers
///
/// The mutex is what serializes uploads and exports: an ingest holds the lock
/// for its whole batch, so no export can observe a half-appended upload.
pub type SharedSession = Arc<Mutex<Session>>;

/// Everything the host keeps between requests: the accumulated rows and the
/// outcome of the last operation
#[derive(Debug, Default)]
pub struct Session {
    pub dataset: Dataset,
    status: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusSnapshot {
    pub message: String,
    pub yield_rows: usize,
    pub calibration_rows: usize,
}

impl Session {
    pub fn new() -> Self {
        Self {
            dataset: Dataset::new(),
            status: "No files loaded".to_string(),
        }
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        info!(status = %self.status, "Status updated");
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            message: self.status.clone(),
            yield_rows: self.dataset.yield_rows.len(),
            calibration_rows: self.dataset.calibration_rows.len(),
        }
    }
}
