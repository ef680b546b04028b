use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed event record: {0}")]
    EventDecodeError(#[from] serde_json::Error),
    #[error("Invalid config {path}: {source}")]
    ConfigError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Marker store error at {path}: {source}")]
    StoreError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Session history unavailable: {0}")]
    HistoryUnavailable(String),
}
