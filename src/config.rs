//! Request configuration.
//!
//! [`RequestConfig`] is what a caller hands to [`dispatch`](crate::dispatch).
//! It is read-only from the dispatcher's point of view and is shared with the
//! response and any error through an [`Arc`].

use std::{borrow::Cow, fmt, sync::Arc};

use bon::Builder;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::{
    adapter::{Adapter, SharedAdapter},
    cancel::CancelToken,
    platform::{Duration, MaybeSendSync},
};

/// The configuration for a single request.
#[derive(Clone, Builder)]
pub struct RequestConfig {
    /// The transport used to perform the request.
    #[builder(with = |adapter: impl Adapter| SharedAdapter::new(adapter))]
    pub adapter: Option<SharedAdapter>,

    /// Cancels the request when fired.
    pub cancel_token: Option<CancelToken>,

    /// Decides whether a response status counts as success.
    ///
    /// When absent, every status is accepted.
    #[builder(with = |predicate: impl Fn(StatusCode) -> bool + MaybeSendSync + 'static| ValidateStatus::new(predicate))]
    pub validate_status: Option<ValidateStatus>,

    /// The request method.
    #[builder(default)]
    pub method: Method,

    /// Prefix for relative request URLs.
    #[builder(into)]
    pub base_url: Option<String>,

    /// The request URL, relative to `base_url` unless absolute.
    #[builder(into, default)]
    pub url: String,

    /// Query parameters appended to the URL.
    #[builder(default, with = |params: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>| mk_params(params))]
    pub params: Vec<(String, String)>,

    /// Request headers.
    #[builder(default)]
    pub headers: HeaderMap,

    /// Request body.
    #[builder(into)]
    pub body: Option<Bytes>,

    /// Passed through to the adapter; the dispatcher never enforces it.
    pub timeout: Option<Duration>,

    /// Message templates used when building errors.
    #[builder(default)]
    pub messages: Messages,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("adapter", &self.adapter.is_some())
            .field("cancel_token", &self.cancel_token)
            .field("validate_status", &self.validate_status.is_some())
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("url", &self.url)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn mk_params(
    params: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
) -> Vec<(String, String)> {
    params
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

trait StatusPredicate: MaybeSendSync {
    fn accepts(&self, status: StatusCode) -> bool;
}

impl<F: Fn(StatusCode) -> bool + MaybeSendSync> StatusPredicate for F {
    fn accepts(&self, status: StatusCode) -> bool {
        self(status)
    }
}

/// A shared predicate over response statuses.
#[derive(Clone)]
pub struct ValidateStatus {
    inner: Arc<dyn StatusPredicate>,
}

impl ValidateStatus {
    /// Wraps a predicate.
    pub fn new(predicate: impl Fn(StatusCode) -> bool + MaybeSendSync + 'static) -> Self {
        Self {
            inner: Arc::new(predicate),
        }
    }

    /// Returns `true` if `status` is accepted.
    #[must_use]
    pub fn accepts(&self, status: StatusCode) -> bool {
        self.inner.accepts(status)
    }
}

impl fmt::Debug for ValidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateStatus").finish_non_exhaustive()
    }
}

/// Message templates for dispatch errors.
///
/// These can be replaced to localize the messages surfaced to callers.
#[derive(Debug, Clone, Builder)]
pub struct Messages {
    /// Used when no adapter is configured.
    #[builder(into, default = Cow::Borrowed(DEFAULT_ADAPTER_MISSING))]
    pub adapter_missing: Cow<'static, str>,

    /// Used when the adapter gives up a request without settling it.
    #[builder(into, default = Cow::Borrowed(DEFAULT_ADAPTER_DROPPED))]
    pub adapter_dropped: Cow<'static, str>,

    /// Used when a status is rejected. `{status}` is replaced by the numeric status.
    #[builder(into, default = Cow::Borrowed(DEFAULT_BAD_STATUS))]
    pub bad_status: Cow<'static, str>,
}

const DEFAULT_ADAPTER_MISSING: &str =
    "no platform adapter configured; supply a custom adapter for this platform";
const DEFAULT_ADAPTER_DROPPED: &str = "adapter dropped the request without completing it";
const DEFAULT_BAD_STATUS: &str = "request failed with status code {status}";

impl Default for Messages {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Messages {
    /// Renders the message for a rejected status.
    #[must_use]
    pub fn render_bad_status(&self, status: StatusCode) -> String {
        self.bad_status
            .replace("{status}", &status.as_u16().to_string())
    }
}
