use std::time::Duration;

use thiserror::Error;

use crate::types::SourceKind;

/// Engine-level failures that reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The corpus could not be turned into a lexical index; nothing can be
    /// queried until this is fixed.
    #[error("failed to build index: {0}")]
    IndexBuild(String),

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("answer synthesis failed: {0}")]
    Synthesis(#[source] LlmError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("corpus unavailable: {0}")]
    Corpus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One retrieval signal failed for one query. Always recovered by the caller.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("{kind} retrieval unavailable: {message}")]
    Unavailable { kind: SourceKind, message: String },

    #[error("{kind} retrieval timed out after {after:?}")]
    Timeout { kind: SourceKind, after: Duration },
}

impl RetrievalError {
    pub fn unavailable(kind: SourceKind, message: impl std::fmt::Display) -> Self {
        Self::Unavailable { kind, message: message.to_string() }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Unavailable { kind, .. } | Self::Timeout { kind, .. } => *kind,
        }
    }
}

/// Failure talking to the language model.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("model endpoint returned status {0}")]
    Status(u16),

    #[error("could not decode model response: {0}")]
    Decode(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a question could not be split. Never surfaced past the decomposer.
#[derive(Debug, Error)]
pub enum DecompositionError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("response is not a subqueries object: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response contained no subqueries")]
    Empty,
}
