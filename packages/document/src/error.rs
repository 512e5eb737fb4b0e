use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node is not a text run: {0}")]
    NotASpan(String),

    #[error("Parent already has children: {0}")]
    ParentNotEmpty(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
}

impl TreeError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound(id.into())
    }

    pub fn not_a_span(id: impl Into<String>) -> Self {
        Self::NotASpan(id.into())
    }
}
