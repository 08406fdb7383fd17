//! [`ActorEntity`] implementation for [`StockCell`].
//!
//! The ledger actor is the single writer for every stock key and purchase-lock key. Each
//! action below reads and writes them without yielding to other requests, which is what
//! makes a reservation all-or-nothing.

use super::actions::{LedgerAction, LedgerActionResult, ReservationResult};
use super::error::LedgerError;
use crate::model::{ItemId, OrderNo, PurchaseLock, StockCell, StockCellCreate, StockCellUpdate, UserId};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

#[async_trait]
impl ActorEntity for StockCell {
    type Id = ItemId;
    type Create = StockCellCreate;
    type Update = StockCellUpdate;
    type Action = LedgerAction;
    type ActionResult = LedgerActionResult;
    type Context = ();
    type Error = LedgerError;

    fn from_create_params(item_id: ItemId, params: StockCellCreate) -> Result<Self, LedgerError> {
        if !params.window.is_valid() {
            return Err(LedgerError::InvalidWindow(item_id.to_string()));
        }
        Ok(Self {
            item_id,
            remaining: params.remaining,
            active: params.active,
            window: params.window,
            locks: Default::default(),
        })
    }

    async fn on_update(&mut self, update: StockCellUpdate, _ctx: &()) -> Result<(), LedgerError> {
        if let Some(window) = update.window {
            if !window.is_valid() {
                return Err(LedgerError::InvalidWindow(self.item_id.to_string()));
            }
            // Locks from a sale that already ended must not follow the item into the next one.
            self.purge_expired_locks(Utc::now());
            self.window = window;
            for lock in self.locks.values_mut() {
                lock.expires_at = window.end;
            }
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: LedgerAction,
        _ctx: &(),
    ) -> Result<LedgerActionResult, LedgerError> {
        match action {
            LedgerAction::Reserve {
                user_id,
                quantity,
                now,
            } => self.reserve(user_id, quantity, now).map(LedgerActionResult::Reserve),
            LedgerAction::Release { quantity } => {
                self.remaining = self.remaining.saturating_add(quantity);
                Ok(LedgerActionResult::Release(self.remaining))
            }
            LedgerAction::Claim {
                user_id,
                quantity,
                order_no,
                now,
            } => Ok(LedgerActionResult::Claim(
                self.claim(user_id, quantity, order_no, now),
            )),
            LedgerAction::Rollback { user_id, quantity } => {
                Ok(LedgerActionResult::Rollback(self.rollback(user_id, quantity)))
            }
            LedgerAction::Remaining => Ok(LedgerActionResult::Remaining(self.remaining)),
        }
    }
}

impl StockCell {
    fn purge_expired_locks(&mut self, now: DateTime<Utc>) {
        let before = self.locks.len();
        self.locks.retain(|_, lock| lock.is_live(now));
        let purged = before - self.locks.len();
        if purged > 0 {
            debug!(item_id = %self.item_id, purged, "Purged expired purchase locks");
        }
    }

    fn reserve(
        &mut self,
        user_id: UserId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<ReservationResult, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        self.purge_expired_locks(now);

        if !self.active || !self.window.contains(now) {
            return Ok(ReservationResult::ItemUnavailable);
        }
        if self.remaining < quantity {
            return Ok(ReservationResult::InsufficientStock);
        }
        if self.locks.contains_key(&user_id) {
            return Ok(ReservationResult::DuplicateAttempt);
        }

        self.remaining -= quantity;
        self.locks.insert(
            user_id,
            PurchaseLock {
                quantity,
                expires_at: self.window.end,
                order_no: None,
            },
        );
        Ok(ReservationResult::Ok)
    }

    fn claim(&mut self, user_id: UserId, quantity: u32, order_no: OrderNo, now: DateTime<Utc>) -> bool {
        match self.locks.get_mut(&user_id) {
            Some(lock) if lock.is_live(now) && lock.quantity == quantity && lock.order_no.is_none() => {
                lock.order_no = Some(order_no);
                true
            }
            _ => false,
        }
    }

    fn rollback(&mut self, user_id: UserId, quantity: u32) -> bool {
        let unclaimed = matches!(
            self.locks.get(&user_id),
            Some(lock) if lock.quantity == quantity && lock.order_no.is_none()
        );
        if unclaimed {
            self.locks.remove(&user_id);
            self.remaining = self.remaining.saturating_add(quantity);
        }
        unclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaleWindow;
    use chrono::Duration;

    fn open_cell(remaining: u32) -> (StockCell, DateTime<Utc>) {
        let now = Utc::now();
        let window = SaleWindow::new(now - Duration::minutes(5), now + Duration::minutes(5));
        let cell = StockCell::from_create_params(
            ItemId(1),
            StockCellCreate {
                remaining,
                active: true,
                window,
            },
        )
        .unwrap();
        (cell, now)
    }

    async fn reserve(cell: &mut StockCell, user: u64, quantity: u32, now: DateTime<Utc>) -> ReservationResult {
        match cell
            .handle_action(
                LedgerAction::Reserve {
                    user_id: UserId(user),
                    quantity,
                    now,
                },
                &(),
            )
            .await
            .unwrap()
        {
            LedgerActionResult::Reserve(result) => result,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reserve_checks_in_order() {
        let (mut cell, now) = open_cell(2);

        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::Ok);
        assert_eq!(cell.remaining, 1);
        // Same user again: stock is there, the lock is not free.
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::DuplicateAttempt);
        // Stock is checked before the lock.
        assert_eq!(reserve(&mut cell, 1, 5, now).await, ReservationResult::InsufficientStock);
        assert_eq!(reserve(&mut cell, 2, 1, now).await, ReservationResult::Ok);
        assert_eq!(reserve(&mut cell, 3, 1, now).await, ReservationResult::InsufficientStock);
        assert_eq!(cell.remaining, 0);
        assert_eq!(cell.locks.len(), 2);
    }

    #[tokio::test]
    async fn test_reserve_outside_window_or_inactive() {
        let (mut cell, now) = open_cell(10);

        let late = cell.window.end;
        assert_eq!(reserve(&mut cell, 1, 1, late).await, ReservationResult::ItemUnavailable);

        cell.on_update(
            StockCellUpdate {
                active: Some(false),
                window: None,
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::ItemUnavailable);
        assert_eq!(cell.remaining, 10);
        assert!(cell.locks.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let (mut cell, now) = open_cell(10);
        let err = cell
            .handle_action(
                LedgerAction::Reserve {
                    user_id: UserId(1),
                    quantity: 0,
                    now,
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidQuantity(0));
    }

    #[tokio::test]
    async fn test_release_then_fresh_user_succeeds() {
        let (mut cell, now) = open_cell(1);
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::Ok);
        assert_eq!(reserve(&mut cell, 2, 1, now).await, ReservationResult::InsufficientStock);

        let released = cell
            .handle_action(LedgerAction::Release { quantity: 1 }, &())
            .await
            .unwrap();
        assert_eq!(released, LedgerActionResult::Release(1));
        assert_eq!(reserve(&mut cell, 2, 1, now).await, ReservationResult::Ok);
        // The first user's lock survives the release.
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::InsufficientStock);
        assert!(cell.locks.contains_key(&UserId(1)));
    }

    #[tokio::test]
    async fn test_claim_binds_once() {
        let (mut cell, now) = open_cell(5);
        assert_eq!(reserve(&mut cell, 1, 2, now).await, ReservationResult::Ok);

        assert!(!cell.claim(UserId(1), 3, OrderNo::from("a"), now), "quantity must match");
        assert!(!cell.claim(UserId(9), 2, OrderNo::from("a"), now), "no lock for this user");
        assert!(cell.claim(UserId(1), 2, OrderNo::from("a"), now));
        assert!(!cell.claim(UserId(1), 2, OrderNo::from("b"), now), "already claimed");
        assert_eq!(
            cell.locks[&UserId(1)].order_no,
            Some(OrderNo::from("a"))
        );
    }

    #[tokio::test]
    async fn test_rollback_only_undoes_unclaimed_reservations() {
        let (mut cell, now) = open_cell(5);
        assert_eq!(reserve(&mut cell, 1, 2, now).await, ReservationResult::Ok);
        assert_eq!(reserve(&mut cell, 2, 1, now).await, ReservationResult::Ok);
        assert!(cell.claim(UserId(2), 1, OrderNo::from("o2"), now));

        assert!(cell.rollback(UserId(1), 2));
        assert_eq!(cell.remaining, 4);
        assert!(!cell.locks.contains_key(&UserId(1)));

        assert!(!cell.rollback(UserId(2), 1));
        assert!(!cell.rollback(UserId(1), 2), "second rollback is a no-op");
        assert_eq!(cell.remaining, 4);
    }

    #[tokio::test]
    async fn test_expired_locks_are_purged() {
        let (mut cell, now) = open_cell(5);
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::Ok);

        // Next sale: the window moves forward but the old lock still ends at the old end.
        let old_end = cell.window.end;
        cell.window = SaleWindow::new(old_end, old_end + Duration::hours(1));
        let later = old_end + Duration::minutes(1);
        assert_eq!(reserve(&mut cell, 1, 1, later).await, ReservationResult::Ok);
        assert_eq!(cell.locks[&UserId(1)].expires_at, cell.window.end);
    }

    #[tokio::test]
    async fn test_window_update_does_not_revive_ended_sale_locks() {
        let now = Utc::now();
        let past = SaleWindow::new(now - Duration::hours(3), now - Duration::hours(1));
        let mut cell = StockCell::from_create_params(
            ItemId(1),
            StockCellCreate {
                remaining: 5,
                active: true,
                window: past,
            },
        )
        .unwrap();
        let during_past_sale = now - Duration::hours(2);
        assert_eq!(reserve(&mut cell, 1, 1, during_past_sale).await, ReservationResult::Ok);

        let next_sale = SaleWindow::new(now - Duration::minutes(1), now + Duration::hours(1));
        cell.on_update(
            StockCellUpdate {
                window: Some(next_sale),
                ..StockCellUpdate::default()
            },
            &(),
        )
        .await
        .unwrap();
        assert!(cell.locks.is_empty());
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::Ok);
    }

    #[tokio::test]
    async fn test_window_update_extends_live_locks() {
        let (mut cell, now) = open_cell(5);
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::Ok);

        let longer = SaleWindow::new(cell.window.start, cell.window.end + Duration::hours(1));
        cell.on_update(
            StockCellUpdate {
                window: Some(longer),
                ..StockCellUpdate::default()
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(cell.locks[&UserId(1)].expires_at, longer.end);
        assert_eq!(reserve(&mut cell, 1, 1, now).await, ReservationResult::DuplicateAttempt);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let now = Utc::now();
        let err = StockCell::from_create_params(
            ItemId(3),
            StockCellCreate {
                remaining: 1,
                active: true,
                window: SaleWindow::new(now, now),
            },
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::InvalidWindow("item_3".to_string()));
    }
}
