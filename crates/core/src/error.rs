use crate::model::ModelError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Errors surfaced by the research service to its callers.
///
/// Normalization failures never appear here: malformed model output is absorbed into a
/// fallback report before it reaches the service boundary.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("research task not found")]
    RecordNotFound,
    #[error("access denied")]
    AccessDenied,
    #[error("research is still in progress")]
    StillInProgress,

    #[error("model service unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("model call timed out after {0} seconds")]
    ModelTimeout(u64),

    #[error("failed to generate document: {0}")]
    RenderFailure(#[from] RenderError),
    #[error("report store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
}

pub type ResearchResult<T> = std::result::Result<T, ResearchError>;
