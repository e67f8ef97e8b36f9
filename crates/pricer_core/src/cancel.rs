//! Cooperative cancellation for long-running calculations.
//!
//! Deep lattices and large Monte Carlo runs poll a [`CancellationToken`]
//! between units of work (time steps, path batches, solver iterations) and
//! abort with [`PricingError::Cancelled`] once it is set.
//!
//! [`RequestGate`] implements "latest request wins": every call to
//! [`RequestGate::begin`] cancels the ticket handed out before it, and
//! [`RequestGate::accept`] drops any result whose ticket is no longer the
//! newest, so a stale calculation is never merged into displayed state.
//!
//! # Example
//!
//! ```
//! use pricer_core::cancel::RequestGate;
//!
//! let gate = RequestGate::new();
//! let first = gate.begin();
//! let second = gate.begin();
//!
//! assert!(first.token().is_cancelled());
//! assert!(gate.accept(&first, Ok::<f64, _>(1.0)).is_none());
//! assert_eq!(gate.accept(&second, Ok::<f64, _>(2.0)), Some(Ok(2.0)));
//! ```

use crate::types::PricingError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Shared flag observed by a running calculation.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(PricingError::Cancelled)` if cancellation was requested.
    ///
    /// Intended for use with `?` at loop boundaries.
    #[inline]
    pub fn check(&self) -> Result<(), PricingError> {
        if self.is_cancelled() {
            Err(PricingError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle for one in-flight request issued by a [`RequestGate`].
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    /// Monotonically increasing request number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token to pass to the engine for this request.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Generation counter enforcing "latest request wins".
#[derive(Debug, Default)]
pub struct RequestGate {
    generation: AtomicU64,
    current: Mutex<Option<CancellationToken>>,
}

impl RequestGate {
    /// Creates a gate with no request in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, cancelling the previous one if still running.
    pub fn begin(&self) -> RequestTicket {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let token = CancellationToken::new();
        *current = Some(token.clone());
        tracing::trace!(generation, "request started");
        RequestTicket { generation, token }
    }

    /// Returns `true` if `ticket` is the most recently issued one.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }

    /// Hands back `result` only if `ticket` is still the latest request.
    ///
    /// Stale results (superseded or cancelled) are discarded and `None` is
    /// returned, so the caller keeps its last good value.
    pub fn accept<T>(
        &self,
        ticket: &RequestTicket,
        result: Result<T, PricingError>,
    ) -> Option<Result<T, PricingError>> {
        if self.is_current(ticket) && !ticket.token.is_cancelled() {
            Some(result)
        } else {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.generation.load(Ordering::Acquire),
                "discarding stale result"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_token_check() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
        token.clone().cancel();
        assert_eq!(token.check(), Err(PricingError::Cancelled));
    }

    #[test]
    fn test_begin_cancels_previous() {
        let gate = RequestGate::new();
        let a = gate.begin();
        assert!(!a.token().is_cancelled());
        let b = gate.begin();
        assert!(a.token().is_cancelled());
        assert!(!b.token().is_cancelled());
        assert!(b.generation() > a.generation());
    }

    #[test]
    fn test_stale_result_discarded() {
        let gate = RequestGate::new();
        let a = gate.begin();
        let _b = gate.begin();
        assert!(gate.accept(&a, Ok::<i32, PricingError>(1)).is_none());
    }

    #[test]
    fn test_latest_result_kept_including_errors() {
        let gate = RequestGate::new();
        let a = gate.begin();
        let out = gate.accept(&a, Err::<i32, _>(PricingError::validation("bad")));
        assert!(matches!(out, Some(Err(PricingError::Validation(_)))));
    }

    #[test]
    fn test_worker_observes_cancellation() {
        let gate = RequestGate::new();
        let ticket = gate.begin();
        let token = ticket.token().clone();
        let worker = thread::spawn(move || {
            let mut spins = 0u64;
            loop {
                if token.check().is_err() {
                    return spins;
                }
                spins += 1;
                thread::sleep(Duration::from_millis(1));
            }
        });
        thread::sleep(Duration::from_millis(5));
        let _newer = gate.begin();
        let spins = worker.join().expect("worker panicked");
        assert!(spins > 0);
        assert!(!gate.is_current(&ticket));
    }
}
