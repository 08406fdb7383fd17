//! Runtime configuration, read from `SECKILL_*` environment variables with defaults.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeckillConfig {
    /// Admission ceiling: purchase attempts processed at once before shedding.
    pub max_concurrent: usize,
    /// How long an order may stay Pending before it is expired, in seconds.
    pub order_timeout_secs: u64,
    /// Mailbox capacity of each actor.
    pub actor_buffer: usize,
    /// Tokio worker threads for the binary. Independent of `max_concurrent`.
    pub worker_threads: usize,
    pub retry_max: usize,
    pub retry_initial_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Delay before a scheduled expiry whose delivery failed is attempted again, in seconds.
    pub redelivery_secs: u64,
}

impl Default for SeckillConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 200,
            order_timeout_secs: 1800,
            actor_buffer: 1024,
            worker_threads: 4,
            retry_max: 3,
            retry_initial_ms: 50,
            retry_max_delay_ms: 2000,
            redelivery_secs: 30,
        }
    }
}

impl SeckillConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing keys take the default; unparsable ones
    /// take the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            max_concurrent: read(&lookup, "SECKILL_MAX_CONCURRENT", d.max_concurrent),
            order_timeout_secs: read(&lookup, "SECKILL_ORDER_TIMEOUT_SECS", d.order_timeout_secs),
            actor_buffer: read_positive(&lookup, "SECKILL_ACTOR_BUFFER", d.actor_buffer),
            worker_threads: read_positive(&lookup, "SECKILL_WORKER_THREADS", d.worker_threads),
            retry_max: read(&lookup, "SECKILL_RETRY_MAX", d.retry_max),
            retry_initial_ms: read(&lookup, "SECKILL_RETRY_INITIAL_MS", d.retry_initial_ms),
            retry_max_delay_ms: read(&lookup, "SECKILL_RETRY_MAX_DELAY_MS", d.retry_max_delay_ms),
            redelivery_secs: read(&lookup, "SECKILL_REDELIVERY_SECS", d.redelivery_secs),
        }
    }

    pub fn order_timeout(&self) -> Duration {
        Duration::from_secs(self.order_timeout_secs)
    }

    pub fn redelivery_interval(&self) -> Duration {
        Duration::from_secs(self.redelivery_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_max,
            initial_delay: Duration::from_millis(self.retry_initial_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: 2.0,
        }
    }

    /// Retry for the stock release inside a cancel. It runs in the order actor, which takes no
    /// other request meanwhile, so it is kept to one quick retry; an expiry that still fails
    /// is redelivered by the scheduler.
    pub fn release_retry_policy(&self) -> RetryPolicy {
        let general = self.retry_policy();
        RetryPolicy {
            max_retries: general.max_retries.min(RELEASE_MAX_RETRIES),
            initial_delay: general.initial_delay.min(RELEASE_MAX_DELAY),
            max_delay: general.max_delay.min(RELEASE_MAX_DELAY),
            multiplier: general.multiplier,
        }
    }
}

const RELEASE_MAX_RETRIES: usize = 1;
const RELEASE_MAX_DELAY: Duration = Duration::from_millis(20);

fn read<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
    }
}

// Tokio channels and runtimes panic on zero.
fn read_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match read(lookup, key, default) {
        0 => {
            warn!(key, "Zero is not allowed here, using default");
            default
        }
        value => value,
    }
}
