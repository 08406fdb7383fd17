//! Status transitions for an [`Order`](crate::model::Order).
//!
//! A transition is a compare-and-set on the status: it applies only if the order is still
//! `Pending`. The order actor handles one request at a time, so of several racing
//! transitions on the same order exactly one is `Applied`.

use crate::model::{CancelReason, OrderStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Pending -> Paid.
    Pay { at: DateTime<Utc> },
    /// Pending -> Cancelled, returning the order's stock first.
    Cancel {
        at: DateTime<Utc>,
        reason: CancelReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The order had already left Pending; nothing changed.
    AlreadyTerminal(OrderStatus),
}

impl Transition {
    pub fn applied(self) -> bool {
        self == Transition::Applied
    }
}
