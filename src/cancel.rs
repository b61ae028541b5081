//! Caller-driven cancellation.
//!
//! A [`CancelToken`] is handed to a request through its configuration. The
//! matching [`Canceller`] stays with the caller and fires the token at most
//! once. Every subscriber registered on the token observes the same [`Cancel`]
//! reason.

use std::{fmt, sync::Arc};

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::platform::MaybeSend;

/// The reason a request was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cancel {
    message: Option<String>,
}

impl Cancel {
    /// Creates a cancellation reason with an optional message.
    #[must_use]
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }

    /// Returns the message supplied by the caller, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("canceled"))
    }
}

impl std::error::Error for Cancel {}

trait Listener: MaybeSend {
    fn fire(self: Box<Self>, reason: Cancel);
}

impl<F: FnOnce(Cancel) + MaybeSend> Listener for F {
    fn fire(self: Box<Self>, reason: Cancel) {
        (*self)(reason);
    }
}

#[derive(Default)]
struct TokenState {
    reason: Option<Cancel>,
    listeners: Vec<Box<dyn Listener>>,
    // The canceller is gone without firing, so nothing will ever fire.
    closed: bool,
}

/// The subscribing half of a cancellation pair.
///
/// Tokens are cheap to clone; all clones observe the same cancellation.
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<Mutex<TokenState>>,
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CancelToken")
            .field("reason", &state.reason)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl CancelToken {
    /// Creates a linked token and canceller.
    #[must_use]
    pub fn source() -> (CancelToken, Canceller) {
        let token = CancelToken {
            state: Arc::new(Mutex::new(TokenState::default())),
        };
        let canceller = Canceller {
            state: token.state.clone(),
        };
        (token, canceller)
    }

    /// Registers a one-shot listener for the cancellation.
    ///
    /// If the token has already been cancelled, `listener` runs immediately on
    /// the calling thread. If the canceller was dropped without cancelling,
    /// the listener is discarded.
    pub fn subscribe(&self, listener: impl FnOnce(Cancel) + MaybeSend + 'static) {
        let mut state = self.state.lock();
        if let Some(reason) = state.reason.clone() {
            drop(state);
            listener(reason);
        } else if !state.closed {
            state.listeners.push(Box::new(listener));
        }
    }

    /// Waits until the token is cancelled.
    ///
    /// The returned future never resolves if the canceller is dropped without
    /// cancelling.
    pub fn cancelled(&self) -> impl Future<Output = Cancel> + MaybeSend + 'static {
        let (tx, rx) = oneshot::channel();
        self.subscribe(move |reason| {
            let _ = tx.send(reason);
        });
        async move {
            match rx.await {
                Ok(reason) => reason,
                Err(oneshot::Canceled) => futures::future::pending().await,
            }
        }
    }

    /// Returns the cancellation reason, if the token has been cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<Cancel> {
        self.state.lock().reason.clone()
    }

    /// Returns `true` if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().reason.is_some()
    }

    /// Fails with the cancellation reason if the token has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns the [`Cancel`] reason once the token has fired.
    pub fn throw_if_requested(&self) -> Result<(), Cancel> {
        self.reason().map_or(Ok(()), Err)
    }
}

/// The firing half of a cancellation pair.
pub struct Canceller {
    state: Arc<Mutex<TokenState>>,
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller").finish_non_exhaustive()
    }
}

impl Canceller {
    /// Cancels the token, notifying every listener.
    ///
    /// Returns `false` if the token had already been cancelled, in which case
    /// nothing happens.
    pub fn cancel(&self, message: Option<String>) -> bool {
        let reason = Cancel::new(message);
        let listeners = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            std::mem::take(&mut state.listeners)
        };

        tracing::debug!(%reason, listeners = listeners.len(), "cancel token fired");
        for listener in listeners {
            listener.fire(reason.clone());
        }
        true
    }
}

impl Drop for Canceller {
    fn drop(&mut self) {
        let listeners = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.listeners)
        };
        drop(listeners);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_cancel_notifies_every_listener_once() {
        let (token, canceller) = CancelToken::source();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            token.subscribe(move |reason| {
                assert_eq!(reason.message(), Some("stop"));
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(canceller.cancel(Some("stop".to_owned())));
        assert!(!canceller.cancel(Some("again".to_owned())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(token.reason().unwrap().message(), Some("stop"));
    }

    #[test]
    fn test_subscribe_after_cancel_fires_immediately() {
        let (token, canceller) = CancelToken::source();
        canceller.cancel(None);

        let fired = Arc::new(Mutex::new(None));
        let slot = fired.clone();
        token.subscribe(move |reason| *slot.lock() = Some(reason));

        assert_eq!(fired.lock().as_ref().unwrap().to_string(), "canceled");
    }

    #[test]
    fn test_throw_if_requested() {
        let (token, canceller) = CancelToken::source();
        assert!(token.throw_if_requested().is_ok());
        assert!(!token.is_cancelled());

        canceller.cancel(Some("user cancel".to_owned()));
        let err = token.throw_if_requested().unwrap_err();
        assert_eq!(err.to_string(), "user cancel");
    }

    #[test]
    fn test_dropped_canceller_discards_listeners() {
        let (token, canceller) = CancelToken::source();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        token.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(canceller);

        let counter = calls.clone();
        token.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(token.state.lock().listeners.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let (token, canceller) = CancelToken::source();
        let waiter = tokio::spawn(token.cancelled());

        canceller.cancel(Some("done".to_owned()));

        let reason = waiter.await.unwrap();
        assert_eq!(reason.message(), Some("done"));
    }

    #[tokio::test]
    async fn test_cancelled_future_pending_without_canceller() {
        let (token, canceller) = CancelToken::source();
        drop(canceller);

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(20), token.cancelled()).await;
        assert!(result.is_err());
    }
}
