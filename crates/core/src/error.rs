use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}
