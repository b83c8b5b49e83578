//! Error types.
//!
//! Backend calls return `Result<_, BackendError>` so that an unreachable
//! backend is never mistaken for an empty table.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("unexpected order number format: {0}")]
    InvalidOrderNumber(String),
}

impl BackendError {
    /// Network or 5xx failures that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Failures that stop a fleet-wide computation before any status is produced.
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("could not load buses for tenant {tenant_id}: {source}")]
    LoadBuses {
        tenant_id: i64,
        #[source]
        source: BackendError,
    },

    #[error("could not load scheduled tasks for tenant {tenant_id}: {source}")]
    LoadTasks {
        tenant_id: i64,
        #[source]
        source: BackendError,
    },
}
