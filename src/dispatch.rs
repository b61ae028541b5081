//! Request dispatch.
//!
//! [`dispatch`] drives one request to exactly one outcome. Three triggers race
//! to settle it: the adapter reporting success, the adapter reporting failure,
//! and the caller cancelling through the request's [`CancelToken`]. The first
//! one wins and later ones are ignored, except that cancellation always aborts
//! the adapter's task.
//!
//! [`CancelToken`]: crate::cancel::CancelToken

use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::{
    adapter::{Adapter, AdapterTask, Completion},
    cancel::Cancel,
    config::RequestConfig,
    error::{DispatchError, RequestError},
    request::{self, AdapterDescriptor},
    response::Response,
};

type Outcome = Result<Response, DispatchError>;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Trigger {
    Success,
    Fail,
    Dropped,
    Cancel,
    Abandoned,
}

/// The outcome slot and the adapter's task.
///
/// Cancel subscriptions hold only this, so a long-lived token does not keep
/// settled requests alive.
struct Race {
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    task: Mutex<Option<Box<dyn AdapterTask>>>,
}

impl Race {
    /// Takes the right to settle. Only the first caller gets the sender.
    fn claim(&self) -> Option<oneshot::Sender<Outcome>> {
        self.sender.lock().take()
    }

    fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Aborts the adapter's task, at most once over the dispatch's lifetime.
    fn abort_task(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            tracing::debug!("aborting adapter task");
            task.abort();
        }
    }

    /// Settles as cancelled if nothing else has, then aborts the task.
    ///
    /// The outcome is claimed before aborting, so an adapter that reports
    /// from inside `abort` cannot overtake the cancellation.
    fn cancel(&self, reason: Cancel) {
        let sender = self.claim();
        self.abort_task();
        match sender {
            Some(sender) => {
                tracing::debug!(trigger = ?Trigger::Cancel, %reason, "request settled");
                let _ = sender.send(Err(DispatchError::Cancelled { reason }));
            }
            None => tracing::debug!(trigger = ?Trigger::Cancel, "ignoring late settlement"),
        }
    }
}

/// State shared by everything that may settle one dispatch.
pub(crate) struct Settlement {
    config: Arc<RequestConfig>,
    descriptor: AdapterDescriptor,
    race: Arc<Race>,
}

impl Settlement {
    fn new(
        config: Arc<RequestConfig>,
        descriptor: AdapterDescriptor,
    ) -> (Arc<Self>, oneshot::Receiver<Outcome>) {
        let (sender, receiver) = oneshot::channel();
        let settlement = Arc::new(Self {
            config,
            descriptor,
            race: Arc::new(Race {
                sender: Mutex::new(Some(sender)),
                task: Mutex::new(None),
            }),
        });
        (settlement, receiver)
    }

    pub(crate) fn config(&self) -> &Arc<RequestConfig> {
        &self.config
    }

    pub(crate) fn request_error(
        &self,
        message: impl Into<String>,
        response: Option<Response>,
    ) -> RequestError {
        RequestError::new(
            message,
            self.config.clone(),
            self.descriptor.clone(),
            response,
        )
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.race.is_settled()
    }

    /// Delivers `outcome` unless the dispatch has already settled.
    pub(crate) fn settle(&self, outcome: Outcome, trigger: Trigger) -> bool {
        let Some(sender) = self.race.claim() else {
            tracing::debug!(?trigger, url = %self.descriptor.url, "ignoring late settlement");
            return false;
        };

        tracing::debug!(
            ?trigger,
            url = %self.descriptor.url,
            ok = outcome.is_ok(),
            "request settled"
        );
        // The receiver is gone only if the dispatch future was dropped.
        let _ = sender.send(outcome);
        true
    }

    fn store_task(&self, task: Box<dyn AdapterTask>) {
        *self.race.task.lock() = Some(task);
    }
}

/// Aborts the request if the dispatch future is dropped before it settles.
struct AbandonGuard(Arc<Settlement>);

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        // Nobody is left to receive an outcome; claiming it is enough to make
        // later reports no-ops.
        let Some(_sender) = self.0.race.claim() else {
            return;
        };
        tracing::debug!(
            trigger = ?Trigger::Abandoned,
            url = %self.0.descriptor.url,
            "request abandoned before completion"
        );
        self.0.race.abort_task();
    }
}

/// Sends a request through its configured adapter.
///
/// # Errors
///
/// Fails with:
/// - [`DispatchError::AdapterMissing`] if `config.adapter` is not set; the
///   adapter is not invoked.
/// - [`DispatchError::Transport`] if the adapter reports a failure, or gives
///   up the request without reporting anything.
/// - [`DispatchError::BadStatus`] if `config.validate_status` rejects the
///   response status. The error carries the response.
/// - [`DispatchError::Cancelled`] if `config.cancel_token` fires before the
///   adapter reports an outcome.
pub async fn dispatch(config: RequestConfig) -> Result<Response, DispatchError> {
    let config = Arc::new(config);
    let descriptor = request::normalize(&config);

    let Some(adapter) = config.adapter.clone() else {
        tracing::warn!(url = %descriptor.url, "no adapter configured");
        let message = config.messages.adapter_missing.to_string();
        return Err(DispatchError::AdapterMissing {
            source: RequestError::new(message, config, descriptor, None),
        });
    };

    tracing::debug!(method = %descriptor.method, url = %descriptor.url, "dispatching request");
    let (settlement, outcome) = Settlement::new(config.clone(), descriptor.clone());
    let _guard = AbandonGuard(settlement.clone());

    let completion = Completion::new(settlement.clone());
    if let Some(task) = adapter.send(descriptor, completion) {
        settlement.store_task(task);
    }

    if let Some(token) = &config.cancel_token {
        let race = settlement.race.clone();
        token.subscribe(move |reason| race.cancel(reason));
    }

    match outcome.await {
        Ok(outcome) => outcome,
        // Every claimed sender is used, except by the guard, which is still
        // alive here. The receiver cannot observe a dropped sender.
        Err(oneshot::Canceled) => Err(DispatchError::Transport {
            source: settlement.request_error("request settled without an outcome", None),
        }),
    }
}
