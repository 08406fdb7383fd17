use super::{ItemId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Globally unique, opaque order number (a hyphen-less UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderNo(pub String);

impl OrderNo {
    pub fn generate() -> Self {
        OrderNo(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderNo {
    fn from(s: &str) -> Self {
        OrderNo(s.to_string())
    }
}

/// `Pending` is the only state with outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// Numeric code used by external order stores.
    pub fn code(self) -> i8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Cancelled => -1,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::Pending),
            1 => Some(OrderStatus::Paid),
            -1 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    Requested,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_no: OrderNo,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub amount: Decimal,
    pub status: OrderStatus,
    pub cancel_reason: Option<CancelReason>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_no: OrderNo,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            order_no,
            user_id,
            item_id,
            quantity,
            amount: unit_price * Decimal::from(quantity),
            status: OrderStatus::Pending,
            cancel_reason: None,
            created_at: now,
            paid_at: None,
            updated_at: now,
        }
    }
}

/// Payload for a new order. Only valid after a successful ledger reservation for the same
/// item, user and quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_is_unit_price_times_quantity() {
        let order = Order::new(OrderNo::generate(), UserId(1), ItemId(1), 3, dec!(19.90));
        assert_eq!(order.amount, dec!(59.70));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_status_codes() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code(2), None);
        assert!(OrderStatus::Paid.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_order_numbers_are_unique() {
        let a = OrderNo::generate();
        let b = OrderNo::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
