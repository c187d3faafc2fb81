use thiserror::Error;

/// Failures of the durable change store.
///
/// These never reach the user: the tracker logs them and carries on with its
/// in-memory state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored changes are not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Failures reported by the remote spreadsheet boundary.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error("row {0} is missing its _rowIndex")]
    MissingRowIndex(usize),
    #[error("malformed sheet data: {0}")]
    Malformed(String),
    #[error("remote rejected the write: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}
