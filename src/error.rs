use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid style declaration `{input}`: {reason}")]
    Style { input: String, reason: String },
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("graph has no nodes")]
    EmptyGraph,
}

pub type Result<T> = std::result::Result<T, Error>;
