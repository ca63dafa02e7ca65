//! Single-assignment result cell bridging provider callbacks into futures
//!
//! A submission is split into two halves:
//! - [`Listener`] is handed to the provider. It may be cloned into as many
//!   callbacks as the provider needs; the first notification resolves the
//!   cell and every later one is ignored.
//! - [`Pending`] is awaited by the caller. Dropping it before resolution
//!   releases the provider [`Registration`].
//!
//! If every listener clone is dropped without a notification the cell
//! resolves with [`ProviderError::Dropped`], so a submission never ends up
//! silently unresolved because of a provider bug. A provider that keeps its
//! listener alive and never notifies leaves the cell pending.

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

use super::error::ProviderError;

type Outcome<T> = Result<T, ProviderError>;

/// Create a connected listener/pending pair
pub fn channel<T>() -> (Listener<T>, Pending<T>) {
    let (sender, receiver) = oneshot::channel();
    let listener = Listener {
        slot: Arc::new(Slot {
            sender: Mutex::new(Some(sender)),
        }),
    };
    let pending = Pending {
        receiver,
        registration: Registration::detached(),
        settled: false,
    };
    (listener, pending)
}

struct Slot<T> {
    sender: Mutex<Option<oneshot::Sender<Outcome<T>>>>,
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.get_mut().take() {
            debug!("Listener dropped without notification");
            let _ = sender.send(Err(ProviderError::Dropped));
        }
    }
}

/// Resolving half of a submission, given to the provider
pub struct Listener<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("resolved", &self.slot.sender.lock().is_none())
            .finish()
    }
}

impl<T> Listener<T> {
    /// Deliver a successful result
    ///
    /// Returns `true` only if this call resolved the cell and the caller was
    /// still waiting for it.
    pub fn on_success(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    /// Deliver a failure
    pub fn on_failure(&self, message: impl Into<String>) -> bool {
        self.resolve(Err(ProviderError::failed(message)))
    }

    /// Whether a notification would still reach a waiting caller
    pub fn is_open(&self) -> bool {
        self.slot
            .sender
            .lock()
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    fn resolve(&self, outcome: Outcome<T>) -> bool {
        let Some(sender) = self.slot.sender.lock().take() else {
            debug!("Ignoring notification for an already resolved request");
            return false;
        };
        if sender.send(outcome).is_err() {
            debug!("Request was abandoned before the provider answered");
            return false;
        }
        true
    }
}

/// Handle a provider returns to undo its subscription for one submission
pub struct Registration {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    /// Registration whose release runs `release` exactly once
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Registration with nothing to release
    pub fn detached() -> Self {
        Self { release: None }
    }

    /// Release the subscription. Idempotent.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Awaiting half of a submission
#[derive(Debug)]
#[must_use = "dropping a Pending abandons the request"]
pub struct Pending<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
    registration: Registration,
    settled: bool,
}

impl<T> Pending<T> {
    /// Attach the provider's registration, released if this is dropped early
    pub fn hold(&mut self, registration: Registration) {
        self.registration = registration;
    }
}

impl<T> Future for Pending<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.settled {
            panic!("Pending polled after completion");
        }
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(outcome) => {
                this.settled = true;
                // The slot always sends before its sender goes away, so a
                // closed channel can only mean the listener vanished.
                Poll::Ready(outcome.unwrap_or(Err(ProviderError::Dropped)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.receiver.close();
            self.registration.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_success_then_failure_resolves_once() {
        let (listener, pending) = channel::<u32>();

        assert!(listener.on_success(7));
        assert!(!listener.on_failure("late"));

        assert_eq!(pending.await, Ok(7));
    }

    #[tokio::test]
    async fn test_failure_then_success_resolves_once() {
        let (listener, pending) = channel::<u32>();

        assert!(listener.on_failure("boom"));
        assert!(!listener.on_success(7));

        assert_eq!(pending.await, Err(ProviderError::failed("boom")));
    }

    #[tokio::test]
    async fn test_clones_share_one_cell() {
        let (listener, pending) = channel::<&'static str>();
        let success = listener.clone();
        let failure = listener;

        let handle = tokio::spawn(async move { failure.on_failure("second") });
        assert!(success.on_success("first"));
        assert!(!handle.await.unwrap());

        assert_eq!(pending.await, Ok("first"));
    }

    #[tokio::test]
    async fn test_silent_provider_stays_pending() {
        let (listener, pending) = channel::<u32>();

        let waited = tokio::time::timeout(Duration::from_millis(30), pending).await;

        assert!(waited.is_err());
        // Still held by the "provider", so it was never resolved behind our back
        drop(listener);
    }

    #[tokio::test]
    async fn test_dropped_listener_resolves_as_failure() {
        let (listener, pending) = channel::<u32>();
        let clone = listener.clone();

        drop(listener);
        drop(clone);

        assert_eq!(pending.await, Err(ProviderError::Dropped));
    }

    #[test]
    fn test_abandoned_pending_releases_registration() {
        let released = Arc::new(AtomicUsize::new(0));
        let (listener, mut pending) = channel::<u32>();
        let counter = released.clone();
        pending.hold(Registration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(listener.is_open());
        drop(pending);

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(!listener.is_open());
        assert!(!listener.on_success(1));
    }

    #[tokio::test]
    async fn test_settled_pending_keeps_registration() {
        let released = Arc::new(AtomicUsize::new(0));
        let (listener, mut pending) = channel::<u32>();
        let counter = released.clone();
        pending.hold(Registration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        listener.on_success(3);
        assert_eq!((&mut pending).await, Ok(3));
        drop(pending);

        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_release_is_idempotent() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut registration = Registration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registration.release();
        registration.release();

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
