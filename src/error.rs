//! The purchaser-facing error taxonomy.

use crate::item_actor::ItemError;
use crate::ledger_actor::{LedgerError, ReservationResult};
use crate::model::{ItemId, OrderNo, UserId};
use crate::order_actor::OrderError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeckillError {
    /// Shed by the admission gate.
    #[error("System busy, try again")]
    SystemBusy,

    #[error("{0} is not on sale")]
    ItemUnavailable(ItemId),

    #[error("{0} is sold out")]
    InsufficientStock(ItemId),

    #[error("{user_id} already purchased {item_id} in this sale")]
    DuplicateAttempt { item_id: ItemId, user_id: UserId },

    /// An order was attempted without a reservation. Indicates a bug, not user error.
    #[error("No reservation backs the order for {user_id} on {item_id}")]
    ReservationRequired { item_id: ItemId, user_id: UserId },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderNo),

    /// A collaborator could not be reached after retries.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl SeckillError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SeckillError::SystemBusy | SeckillError::Unavailable(_))
    }

    /// Maps a rejected reservation to its purchaser-facing reason. `None` for `Ok`.
    pub fn from_reservation(
        result: ReservationResult,
        item_id: ItemId,
        user_id: UserId,
    ) -> Option<Self> {
        match result {
            ReservationResult::Ok => None,
            ReservationResult::ItemUnavailable => Some(SeckillError::ItemUnavailable(item_id)),
            ReservationResult::InsufficientStock => Some(SeckillError::InsufficientStock(item_id)),
            ReservationResult::DuplicateAttempt => {
                Some(SeckillError::DuplicateAttempt { item_id, user_id })
            }
        }
    }
}

impl From<LedgerError> for SeckillError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidQuantity(q) => SeckillError::InvalidQuantity(q),
            other => SeckillError::Unavailable(other.to_string()),
        }
    }
}

impl From<OrderError> for SeckillError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(order_no) => SeckillError::OrderNotFound(OrderNo(order_no)),
            OrderError::ReservationRequired { item_id, user_id } => {
                SeckillError::ReservationRequired { item_id, user_id }
            }
            OrderError::InvalidQuantity(q) => SeckillError::InvalidQuantity(q),
            other => SeckillError::Unavailable(other.to_string()),
        }
    }
}

impl From<ItemError> for SeckillError {
    fn from(e: ItemError) -> Self {
        SeckillError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_mapping() {
        let item = ItemId(1);
        let user = UserId(2);
        assert_eq!(SeckillError::from_reservation(ReservationResult::Ok, item, user), None);
        assert_eq!(
            SeckillError::from_reservation(ReservationResult::DuplicateAttempt, item, user),
            Some(SeckillError::DuplicateAttempt { item_id: item, user_id: user })
        );
        assert_eq!(
            SeckillError::from_reservation(ReservationResult::InsufficientStock, item, user)
                .unwrap()
                .to_string(),
            "item_1 is sold out"
        );
    }

    #[test]
    fn test_only_busy_and_transport_are_retryable() {
        assert!(SeckillError::SystemBusy.is_retryable());
        assert!(SeckillError::Unavailable("down".into()).is_retryable());
        assert!(!SeckillError::InsufficientStock(ItemId(1)).is_retryable());
        assert!(!SeckillError::OrderNotFound(OrderNo::from("x")).is_retryable());
    }

    #[test]
    fn test_order_errors_map_to_reasons() {
        assert_eq!(
            SeckillError::from(OrderError::NotFound("abc".into())),
            SeckillError::OrderNotFound(OrderNo::from("abc"))
        );
        assert!(matches!(
            SeckillError::from(OrderError::StockRelease {
                item_id: ItemId(1),
                source: LedgerError::ActorCommunicationError("down".into()),
            }),
            SeckillError::Unavailable(_)
        ));
    }
}
