//! # Compensation
//!
//! Returning reserved stock for orders that never get paid. Explicit cancellations go
//! straight to the order actor; timeouts go through the [`ExpiryScheduler`], which delivers
//! an expire request for every order once its payment deadline has passed.

pub mod scheduler;

pub use scheduler::*;
