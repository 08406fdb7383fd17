//! Operations on a [`StockCell`](crate::model::StockCell).
//!
//! Every action runs to completion inside the ledger actor before the next request is
//! taken, so `Reserve` is the indivisible check-decrement-lock script and `Release` the
//! matching atomic increment.

use super::LedgerError;
use crate::model::{OrderNo, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Check window, stock and lock; on success decrement and lock in one step.
    ///
    /// `now` is supplied by the caller so the window check is reproducible.
    Reserve {
        user_id: UserId,
        quantity: u32,
        now: DateTime<Utc>,
    },
    /// Return stock. Idempotency is the caller's concern.
    Release { quantity: u32 },
    /// Bind a live, unclaimed lock of exactly `quantity` to an order.
    Claim {
        user_id: UserId,
        quantity: u32,
        order_no: OrderNo,
        now: DateTime<Utc>,
    },
    /// Undo a reservation that never became an order.
    Rollback { user_id: UserId, quantity: u32 },
    /// Read the remaining stock.
    Remaining,
}

/// Results from [`LedgerAction`]s - variants match 1:1 with the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerActionResult {
    Reserve(ReservationResult),
    /// Stock after the increment.
    Release(u32),
    Claim(bool),
    Rollback(bool),
    Remaining(u32),
}

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationResult {
    Ok,
    /// Stock key absent, item inactive, or outside its sale window.
    ItemUnavailable,
    InsufficientStock,
    DuplicateAttempt,
}

impl ReservationResult {
    /// Wire code of the shared-store primitive.
    pub fn code(self) -> i32 {
        match self {
            ReservationResult::Ok => 0,
            ReservationResult::ItemUnavailable => -1,
            ReservationResult::InsufficientStock => -2,
            ReservationResult::DuplicateAttempt => -3,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, LedgerError> {
        match code {
            0 => Ok(ReservationResult::Ok),
            -1 => Ok(ReservationResult::ItemUnavailable),
            -2 => Ok(ReservationResult::InsufficientStock),
            -3 => Ok(ReservationResult::DuplicateAttempt),
            other => Err(LedgerError::UnknownResultCode(other)),
        }
    }

    pub fn is_ok(self) -> bool {
        self == ReservationResult::Ok
    }
}
