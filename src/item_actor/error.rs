//! Error types for the Item actor.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid sale window: start must be before end")]
    InvalidWindow,

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl ItemError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ItemError::ActorCommunicationError(_))
    }
}

impl From<String> for ItemError {
    fn from(msg: String) -> Self {
        ItemError::ActorCommunicationError(msg)
    }
}
