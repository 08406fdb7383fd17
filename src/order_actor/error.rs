//! Error types for the Order actor.

use crate::ledger_actor::LedgerError;
use crate::model::{ItemId, UserId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    /// An order was requested without a matching, unclaimed ledger reservation.
    #[error("No reservation for {user_id} on {item_id}")]
    ReservationRequired { item_id: ItemId, user_id: UserId },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Orders change only through status transitions.
    #[error("Order {0} cannot be edited")]
    Immutable(String),

    /// Stock could not be returned to the ledger; the order stays Pending.
    #[error("Stock release for {item_id} failed: {source}")]
    StockRelease {
        item_id: ItemId,
        #[source]
        source: LedgerError,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    /// Whether another attempt may succeed. A failed stock release leaves the order Pending,
    /// so the transition can be tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrderError::ActorCommunicationError(_) | OrderError::StockRelease { .. } => true,
            OrderError::Ledger(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunicationError(msg)
    }
}
