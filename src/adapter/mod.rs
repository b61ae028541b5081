//! The transport boundary.
//!
//! An [`Adapter`] performs the actual I/O for a request on whatever runtime
//! the host provides. It receives the normalized [`AdapterDescriptor`] and a
//! [`Completion`] through which it reports exactly one outcome, and it may
//! return an [`AdapterTask`] that the dispatcher uses to abort the request
//! when the caller cancels.

mod completion;
mod failure;
mod http_client;

use std::{fmt, sync::Arc};

use futures::future::AbortHandle;

use crate::platform::MaybeSendSync;

pub use crate::{request::AdapterDescriptor, response::AdapterResponse};
pub use completion::Completion;
pub use failure::{FailurePayload, UnrecognizedFailure};
pub use http_client::HttpClientAdapter;

/// Performs requests for a specific runtime.
///
/// Any `Fn(AdapterDescriptor, Completion) -> Option<T>` closure is an adapter.
pub trait Adapter: MaybeSendSync + 'static {
    /// The handle returned for an in-flight request.
    type Task: AdapterTask;

    /// Starts the request.
    ///
    /// The adapter reports the outcome through `completion`, either before
    /// returning or at any later point. It returns `None` when it has no way
    /// to abort the request, or when it has already completed it.
    fn send(&self, descriptor: AdapterDescriptor, completion: Completion) -> Option<Self::Task>;
}

impl<F, T> Adapter for F
where
    F: Fn(AdapterDescriptor, Completion) -> Option<T> + MaybeSendSync + 'static,
    T: AdapterTask,
{
    type Task = T;

    fn send(&self, descriptor: AdapterDescriptor, completion: Completion) -> Option<Self::Task> {
        self(descriptor, completion)
    }
}

/// A handle to an in-flight request.
pub trait AdapterTask: MaybeSendSync + 'static {
    /// Asks the adapter to stop the request.
    ///
    /// This is best-effort: the adapter may still complete the request
    /// afterwards. It must be safe to call after the request has finished.
    fn abort(&self);
}

impl AdapterTask for AbortHandle {
    fn abort(&self) {
        AbortHandle::abort(self);
    }
}

#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl AdapterTask for tokio::task::AbortHandle {
    fn abort(&self) {
        tokio::task::AbortHandle::abort(self);
    }
}

impl AdapterTask for Box<dyn AdapterTask> {
    fn abort(&self) {
        (**self).abort();
    }
}

/// A task type for adapters that never return a handle.
#[derive(Debug, Clone, Copy)]
pub enum NoTask {}

impl AdapterTask for NoTask {
    fn abort(&self) {
        match *self {}
    }
}

/// An [`AdapterTask`] backed by a closure.
#[derive(Clone)]
pub struct AbortFn<F>(F);

impl<F> fmt::Debug for AbortFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AbortFn").finish_non_exhaustive()
    }
}

/// Creates a task that runs `abort` when the request is aborted.
pub fn abort_fn<F: Fn() + MaybeSendSync + 'static>(abort: F) -> AbortFn<F> {
    AbortFn(abort)
}

impl<F: Fn() + MaybeSendSync + 'static> AdapterTask for AbortFn<F> {
    fn abort(&self) {
        (self.0)();
    }
}

/// A type-erased, shareable adapter.
#[derive(Clone)]
pub struct SharedAdapter {
    inner: Arc<dyn DynAdapter>,
}

impl SharedAdapter {
    /// Erases the type of an adapter.
    pub fn new<A: Adapter>(adapter: A) -> Self {
        Self {
            inner: Arc::new(adapter),
        }
    }
}

impl fmt::Debug for SharedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAdapter").finish_non_exhaustive()
    }
}

trait DynAdapter: MaybeSendSync {
    fn send_boxed(
        &self,
        descriptor: AdapterDescriptor,
        completion: Completion,
    ) -> Option<Box<dyn AdapterTask>>;
}

impl<A: Adapter> DynAdapter for A {
    fn send_boxed(
        &self,
        descriptor: AdapterDescriptor,
        completion: Completion,
    ) -> Option<Box<dyn AdapterTask>> {
        self.send(descriptor, completion)
            .map(|task| Box::new(task) as Box<dyn AdapterTask>)
    }
}

impl Adapter for SharedAdapter {
    type Task = Box<dyn AdapterTask>;

    fn send(&self, descriptor: AdapterDescriptor, completion: Completion) -> Option<Self::Task> {
        self.inner.send_boxed(descriptor, completion)
    }
}
