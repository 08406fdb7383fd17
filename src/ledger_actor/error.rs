//! Error types for the stock ledger.

use thiserror::Error;

/// Errors raised by ledger operations.
///
/// Reservation rejections are not errors; they are [`ReservationResult`](super::ReservationResult)
/// values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Stock cell not found: {0}")]
    NotFound(String),

    #[error("Stock cell already exists: {0}")]
    AlreadyStocked(String),

    #[error("Invalid sale window for {0}")]
    InvalidWindow(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Unknown reservation result code: {0}")]
    UnknownResultCode(i32),

    /// The ledger actor could not be reached or replied unexpectedly.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl LedgerError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ActorCommunicationError(_))
    }
}

impl From<String> for LedgerError {
    fn from(msg: String) -> Self {
        LedgerError::ActorCommunicationError(msg)
    }
}
