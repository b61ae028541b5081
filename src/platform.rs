//! Platform glue for running the same dispatcher on native targets and in the browser.
//!
//! Marker traits abstract over `Send`/`Sync` requirements, which only apply
//! off the `wasm32` browser target. [`sleep`] and [`spawn_abortable`] hand work
//! to whichever executor the host runtime provides.

use futures::future::{AbortHandle, Abortable};
use snafu::Snafu;

#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub use std::time::Duration;

#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub use web_time::Duration;

/// Marker trait for types that are `Send` on native targets.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub trait MaybeSend: Send {}
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl<T: Send + ?Sized> MaybeSend for T {}

/// Marker trait for types that are `Send` on native targets.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub trait MaybeSend {}
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
impl<T: ?Sized> MaybeSend for T {}

/// Marker trait for types that are `Send + Sync` on native targets.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// Marker trait for types that are `Send + Sync` on native targets.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub trait MaybeSendSync {}
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
impl<T: ?Sized> MaybeSendSync for T {}

/// Marker trait for futures that are `Send` on native targets.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub trait MaybeSendFuture: Future + Send {}
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl<T: Future + Send> MaybeSendFuture for T {}

/// Marker trait for futures that are `Send` on native targets.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub trait MaybeSendFuture: Future {}
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
impl<T: Future> MaybeSendFuture for T {}

/// Waits for `duration` on the host runtime's timer.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Waits for `duration` on the host runtime's timer.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}

/// There is no executor on the current thread to run background work.
#[derive(Debug, Snafu)]
#[snafu(display("no async runtime is available to drive the request"))]
pub struct NoRuntime;

/// Checks that [`spawn_abortable`] can be called from the current thread.
///
/// # Errors
///
/// Returns [`NoRuntime`] outside a Tokio runtime.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub fn runtime_available() -> Result<(), NoRuntime> {
    tokio::runtime::Handle::try_current()
        .map(drop)
        .map_err(|_| NoRuntime)
}

/// Checks that [`spawn_abortable`] can be called from the current thread.
///
/// # Errors
///
/// Never fails in the browser.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub fn runtime_available() -> Result<(), NoRuntime> {
    Ok(())
}

/// Runs `future` in the background and returns a handle that stops it.
///
/// On native targets this must be called from within a Tokio runtime; see
/// [`runtime_available`]. In the browser the future is driven by the
/// JavaScript microtask queue.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub fn spawn_abortable<F>(future: F) -> AbortHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    tokio::spawn(async move {
        let _ = Abortable::new(future, registration).await;
    });
    handle
}

/// Runs `future` in the background and returns a handle that stops it.
///
/// On native targets this must be called from within a Tokio runtime; see
/// [`runtime_available`]. In the browser the future is driven by the
/// JavaScript microtask queue.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub fn spawn_abortable<F>(future: F) -> AbortHandle
where
    F: Future<Output = ()> + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    wasm_bindgen_futures::spawn_local(async move {
        let _ = Abortable::new(future, registration).await;
    });
    handle
}
