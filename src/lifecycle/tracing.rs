//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `fmt` subscriber filtered by `RUST_LOG`.
//!
//! ```bash
//! # Purchase outcomes, expiries, shutdown
//! RUST_LOG=info cargo run
//!
//! # Every actor request and ledger decision
//! RUST_LOG=debug cargo run
//!
//! # Just the ledger
//! RUST_LOG=seckill::ledger_actor=debug cargo run
//! ```
//!
//! Rejected purchase attempts (sold out, duplicate, closed sale) are logged at `debug`:
//! during a burst they are the common case. Anything at `error` means stock and orders may
//! have drifted apart and needs a look, for example a failed stock release on cancel or a
//! reservation that was not rolled back.
//!
//! With `RUST_LOG=info` a successful purchase followed by its timeout looks like:
//!
//! ```text
//! INFO purchase{item_id=ItemId(1) user_id=UserId(7) quantity=1}: Order created order_no=5f0c...
//! INFO purchase{item_id=ItemId(1) user_id=UserId(7) quantity=1}: Purchase accepted order_no=5f0c...
//! INFO Order cancelled, stock released order_no=5f0c... reason=Expired item_id=item_1 quantity=1 remaining=1
//! ```

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
