use thiserror::Error;

/// Errors raised while interpreting workflow payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid stream key '{0}': expected <shard>-<id>")]
    InvalidStreamKey(String),

    #[error("Stream not found: {0}")]
    StreamNotFound(String),
}
