use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item_{}", self.0)
    }
}

impl From<u32> for ItemId {
    fn from(id: u32) -> Self {
        ItemId(id)
    }
}

/// The half-open interval `[start, end)` during which an item sells at its sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SaleWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

/// A flash-sale item as held by the primary item store.
///
/// `stock` is the quantity the item was published with. The live count lives in the
/// stock ledger and is what purchases and the sold-out overlay read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub stock: u32,
    pub active: bool,
    pub window: SaleWindow,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub stock: u32,
    pub active: bool,
    pub window: SaleWindow,
}

/// Admin edits. Stock is deliberately absent: it only moves through the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub active: Option<bool>,
    pub window: Option<SaleWindow>,
}

impl ItemUpdate {
    /// Whether the update touches anything the ledger also tracks.
    pub fn affects_ledger(&self) -> bool {
        self.active.is_some() || self.window.is_some()
    }
}
