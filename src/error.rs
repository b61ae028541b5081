//! Error types and the [`Error`] trait.
//!
//! Every failed dispatch surfaces as a single [`DispatchError`]. All variants
//! except cancellation carry a [`RequestError`], which records the request
//! configuration, the descriptor handed to the adapter, and, for rejected
//! statuses, the response itself.

use std::{convert::Infallible, sync::Arc};

use http::StatusCode;
use snafu::{AsErrorSource, Snafu};

use crate::{
    cancel::Cancel, config::RequestConfig, platform::MaybeSendSync, request::AdapterDescriptor,
    response::Response,
};

/// Errors that may occur in the library.
pub trait Error: std::error::Error + AsErrorSource + MaybeSendSync + 'static {
    /// If true, this indicates that a failed request may succeed if retried.
    fn is_retryable(&self) -> bool;
}

impl Error for Infallible {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// A failed request, with enough context to tell which layer failed.
#[derive(Debug, Snafu)]
#[snafu(display("{message}"))]
pub struct RequestError {
    message: String,
    config: Arc<RequestConfig>,
    descriptor: AdapterDescriptor,
    response: Option<Box<Response>>,
}

impl RequestError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        config: Arc<RequestConfig>,
        descriptor: AdapterDescriptor,
        response: Option<Response>,
    ) -> Self {
        Self {
            message: message.into(),
            config,
            descriptor,
            response: response.map(Box::new),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The configuration the request was dispatched with.
    #[must_use]
    pub fn config(&self) -> &Arc<RequestConfig> {
        &self.config
    }

    /// The normalized request handed to the adapter.
    #[must_use]
    pub fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    /// The response, when the transport succeeded but the status was rejected.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }
}

/// Errors that can occur when dispatching a request.
#[derive(Debug, Snafu)]
pub enum DispatchError {
    /// No adapter was configured for the current platform.
    #[snafu(display("{source}"))]
    AdapterMissing {
        /// The request context.
        source: RequestError,
    },
    /// The adapter reported a transport failure.
    #[snafu(display("{source}"))]
    Transport {
        /// The request context.
        source: RequestError,
    },
    /// The adapter returned a response whose status was rejected.
    #[snafu(display("{source}"))]
    BadStatus {
        /// The rejected status.
        status: StatusCode,
        /// The request context, including the response.
        source: RequestError,
    },
    /// The request was cancelled through its cancel token.
    #[snafu(display("{reason}"))]
    Cancelled {
        /// The reason given by the caller.
        reason: Cancel,
    },
}

impl DispatchError {
    /// The error message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AdapterMissing { source }
            | Self::Transport { source }
            | Self::BadStatus { source, .. } => source.message().to_owned(),
            Self::Cancelled { reason } => reason.to_string(),
        }
    }

    /// The request context, absent for cancellations.
    #[must_use]
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            Self::AdapterMissing { source }
            | Self::Transport { source }
            | Self::BadStatus { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    /// The rejected response, present only for [`DispatchError::BadStatus`].
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.request_error().and_then(RequestError::response)
    }

    /// Returns `true` if the request was cancelled.
    #[must_use]
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl Error for DispatchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request;

    fn request_error(message: &str) -> RequestError {
        let config = Arc::new(RequestConfig::builder().url("https://example.com").build());
        let descriptor = request::normalize(&config);
        RequestError::new(message, config, descriptor, None)
    }

    #[test]
    fn test_only_transport_is_retryable() {
        let transport = DispatchError::Transport {
            source: request_error("network down"),
        };
        let missing = DispatchError::AdapterMissing {
            source: request_error("no adapter"),
        };
        let bad_status = DispatchError::BadStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            source: request_error("request failed with status code 503"),
        };
        let cancelled = DispatchError::Cancelled {
            reason: Cancel::new(None),
        };

        assert!(transport.is_retryable());
        assert!(!missing.is_retryable());
        assert!(!bad_status.is_retryable());
        assert!(!cancelled.is_retryable());
    }
}
