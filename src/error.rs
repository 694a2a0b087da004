use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid question {id}: {reason}")]
    InvalidQuestion { id: String, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("question bank is empty")]
    EmptyQuestionBank,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
