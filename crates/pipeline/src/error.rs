use thiserror::Error;

use crate::context::StageId;

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage asked for its local context but never ran its `init`.
    #[error("stage {stage} has no context; it was not initialized")]
    MissingContext { stage: StageId },

    #[error("context of stage {stage} has an unexpected type")]
    ContextType { stage: StageId },

    #[error("pipeline received an event before init")]
    NotInitialized,

    #[error("pipeline is closed")]
    Closed,

    #[error("document rejected an element: {reason}")]
    ElementRejected { reason: String },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Failures of the resource-retrieval collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource not found: {reference}")]
    NotFound { reference: String },

    #[error("reading {reference} failed: {message}")]
    Io { reference: String, message: String },

    #[error("invalid resource reference {reference:?}")]
    InvalidReference { reference: String },
}

/// Raised by a [`crate::DocumentBuilder`] that refuses an element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct DocumentError {
    pub reason: String,
}

impl DocumentError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
