//! Suspension points: simulated round trips, cancellation and the busy flag that
//! keeps a screen from submitting twice.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::{Result, StorefrontError};

/// Stand-in for a network round trip of fixed length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulatedLatency(Duration);

impl SimulatedLatency {
    pub fn new(delay: Duration) -> Self { Self(delay) }
    pub fn delay(&self) -> Duration { self.0 }

    pub async fn round_trip(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Cancels every in-flight request that took a token before the call to
/// [`Cancellation::cancel`].
#[derive(Debug)]
pub struct Cancellation {
    tx: watch::Sender<u64>,
}

impl Cancellation {
    pub fn new() -> Self { Self { tx: watch::channel(0).0 } }

    pub fn token(&self) -> CancelToken { CancelToken { rx: self.tx.subscribe() } }

    pub fn cancel(&self) { self.tx.send_modify(|generation| *generation += 1); }

    /// Runs `fut` unless cancelled first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        let token = self.token();
        tokio::select! {
            biased;
            () = token.cancelled() => Err(StorefrontError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self { Self::new() }
}

#[derive(Debug)]
pub struct CancelToken {
    rx: watch::Receiver<u64>,
}

impl CancelToken {
    pub async fn cancelled(mut self) {
        if self.rx.changed().await.is_err() {
            // Sender gone: nobody can cancel any more.
            std::future::pending::<()>().await;
        }
    }
}

/// Set while a request is in flight; the matching controls stay disabled.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn is_busy(&self) -> bool { self.0.load(Ordering::Acquire) }

    pub fn try_acquire(&self) -> Result<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.0))
            .map_err(|_| StorefrontError::Busy)
    }
}

/// Clears the busy flag when dropped, including when the request future is dropped.
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}
