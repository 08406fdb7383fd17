use super::{ItemId, OrderNo, SaleWindow, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One item's slice of the shared fast store: the stock key and every purchase-lock key
/// for that item, held together so a reservation touches them in a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCell {
    pub item_id: ItemId,
    pub remaining: u32,
    pub active: bool,
    pub window: SaleWindow,
    pub locks: HashMap<UserId, PurchaseLock>,
}

/// Marks that a user already reserved this item during the current sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLock {
    pub quantity: u32,
    /// Sale window end; after this the lock no longer counts.
    pub expires_at: DateTime<Utc>,
    /// Set once an order has been created from the reservation.
    pub order_no: Option<OrderNo>,
}

impl PurchaseLock {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCellCreate {
    pub remaining: u32,
    pub active: bool,
    pub window: SaleWindow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockCellUpdate {
    pub active: Option<bool>,
    pub window: Option<SaleWindow>,
}
