//! Runtime orchestration and lifecycle management.
//!
//! - [`SeckillSystem`] - starts every actor and background task, wires them together and
//!   shuts them down in dependency order
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod seckill_system;
pub mod tracing;

pub use seckill_system::*;
pub use tracing::*;
