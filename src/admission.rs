//! Admission gate: a fail-fast ceiling on purchase attempts in flight.
//!
//! Attempts over the ceiling are rejected at once with [`SeckillError::SystemBusy`]; there is
//! no queue. How many attempts actually run in parallel is up to the Tokio runtime.
//!
//! The ceiling is a [`Semaphore`] with one permit per slot. [`AdmissionGate::enter`] hands out
//! an owned permit, so the slot comes back when the permit is dropped, on every exit path.

use crate::error::SeckillError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

#[derive(Debug)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    ceiling: usize,
}

impl AdmissionGate {
    /// Ceilings above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.min(Semaphore::MAX_PERMITS);
        Self {
            slots: Arc::new(Semaphore::new(ceiling)),
            ceiling,
        }
    }

    /// Takes a slot if one is free. A rejection changes nothing.
    ///
    /// The slot stays taken until [`release`](Self::release); prefer [`enter`](Self::enter).
    pub fn admit(&self) -> bool {
        match self.slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Frees a slot taken by [`admit`](Self::admit). Must be called exactly once per admission.
    pub fn release(&self) {
        debug_assert!(self.in_flight() > 0, "release without a matching admit");
        if self.in_flight() > 0 {
            self.slots.add_permits(1);
        }
    }

    /// Admits and returns a permit that frees the slot when dropped.
    pub fn enter(&self) -> Result<AdmissionPermit, SeckillError> {
        match self.slots.clone().try_acquire_owned() {
            Ok(permit) => Ok(AdmissionPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => {
                debug!(ceiling = self.ceiling, "Attempt shed");
                Err(SeckillError::SystemBusy)
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.ceiling.saturating_sub(self.slots.available_permits())
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

/// One admitted attempt.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_rejects_then_one_more_after_release() {
        let gate = AdmissionGate::new(2);
        assert!(gate.admit());
        assert!(gate.admit());
        assert!(!gate.admit());
        assert_eq!(gate.in_flight(), 2);

        gate.release();
        assert!(gate.admit());
        assert!(!gate.admit());
    }

    #[test]
    fn test_zero_ceiling_rejects_everything() {
        let gate = Arc::new(AdmissionGate::new(0));
        assert_eq!(gate.enter().unwrap_err(), SeckillError::SystemBusy);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let gate = Arc::new(AdmissionGate::new(1));
        {
            let _permit = gate.enter().unwrap();
            assert_eq!(gate.in_flight(), 1);
            assert!(gate.enter().is_err());
        }
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.enter().is_ok());
    }

    #[test]
    fn test_admit_and_enter_share_slots() {
        let gate = AdmissionGate::new(1);
        assert!(gate.admit());
        assert!(gate.enter().is_err());

        gate.release();
        let permit = gate.enter().unwrap();
        assert!(!gate.admit());
        drop(permit);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.ceiling(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_never_exceed_ceiling() {
        let gate = Arc::new(AdmissionGate::new(10));
        let mut handles = Vec::new();
        for _ in 0..100 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                gate.enter().ok().map(|permit| {
                    assert!(gate.in_flight() <= gate.ceiling());
                    permit
                })
            }));
        }

        let mut permits = Vec::new();
        for handle in handles {
            if let Some(permit) = handle.await.unwrap() {
                permits.push(permit);
            }
        }
        // Permits are held until here, so exactly the ceiling got through.
        assert_eq!(permits.len(), 10);
        drop(permits);
        assert_eq!(gate.in_flight(), 0);
    }
}
