use std::sync::Arc;

use bytes::Bytes;
use futures::future::{self, AbortHandle, Either};
use http::Request;

use crate::{
    adapter::{Adapter, Completion},
    http::{HttpClient, HttpResponse},
    platform::{self, Duration},
    request::AdapterDescriptor,
    response::AdapterResponse,
};

/// Adapts an async [`HttpClient`] to the [`Adapter`] contract.
///
/// Each request runs as a background task on the host runtime (Tokio on
/// native targets, the browser's event loop on `wasm32`), and the returned
/// [`AbortHandle`] stops it. The descriptor's timeout, if any, is enforced
/// here.
///
/// On native targets, dispatching outside a Tokio runtime fails the request
/// with a transport error instead of spawning.
#[derive(Debug)]
pub struct HttpClientAdapter<C> {
    client: Arc<C>,
}

impl<C> Clone for HttpClientAdapter<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: HttpClient> HttpClientAdapter<C> {
    /// Wraps a client.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl<C: HttpClient> Adapter for HttpClientAdapter<C> {
    type Task = AbortHandle;

    fn send(&self, descriptor: AdapterDescriptor, completion: Completion) -> Option<AbortHandle> {
        if let Err(err) = platform::runtime_available() {
            completion.fail(err.to_string());
            return None;
        }

        let request = match descriptor.to_http_request() {
            Ok(request) => request,
            Err(err) => {
                completion.fail(format!("invalid request: {err}"));
                return None;
            }
        };

        let client = self.client.clone();
        let timeout = descriptor.timeout;
        Some(platform::spawn_abortable(async move {
            match execute_with_timeout(client.as_ref(), request, timeout).await {
                Ok(response) => completion.success(response),
                Err(message) => completion.fail(message),
            }
        }))
    }
}

async fn execute_with_timeout<C: HttpClient>(
    client: &C,
    request: Request<Bytes>,
    timeout: Option<Duration>,
) -> Result<AdapterResponse, String> {
    let Some(timeout) = timeout else {
        return execute(client, request).await;
    };

    let request = Box::pin(execute(client, request));
    let deadline = Box::pin(platform::sleep(timeout));
    match future::select(request, deadline).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), _)) => Err(format!("timeout of {}ms exceeded", timeout.as_millis())),
    }
}

async fn execute<C: HttpClient>(
    client: &C,
    request: Request<Bytes>,
) -> Result<AdapterResponse, String> {
    let response = client
        .execute(request)
        .await
        .map_err(|err| err.to_string())?;
    let status = response.status();
    let headers = response.headers();
    let body = response.body().await.map_err(|err| err.to_string())?;

    Ok(AdapterResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use futures::FutureExt as _;
    use http::{HeaderMap, StatusCode};
    use snafu::Snafu;

    use super::*;
    use crate::{
        cancel::CancelToken,
        config::RequestConfig,
        dispatch::dispatch,
        error::DispatchError,
    };

    #[derive(Debug, Snafu)]
    #[snafu(display("connection refused"))]
    struct MockError;

    impl crate::Error for MockError {
        fn is_retryable(&self) -> bool {
            true
        }
    }

    struct MockResponse {
        status: StatusCode,
        body: Bytes,
    }

    impl HttpResponse for MockResponse {
        type Error = Infallible;

        fn status(&self) -> StatusCode {
            self.status
        }

        fn headers(&self) -> HeaderMap {
            HeaderMap::new()
        }

        async fn body(self) -> Result<Bytes, Self::Error> {
            Ok(self.body)
        }
    }

    #[derive(Default)]
    struct MockClient {
        delay: Option<Duration>,
        refuse: bool,
        requests: AtomicUsize,
        finished: Arc<AtomicBool>,
    }

    impl HttpClient for MockClient {
        type Error = MockError;
        type Response = MockResponse;

        async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.finished.store(true, Ordering::SeqCst);
            if self.refuse {
                return MockSnafu.fail();
            }
            Ok(MockResponse {
                status: StatusCode::OK,
                body: Bytes::from(format!("{} {}", request.method(), request.uri())),
            })
        }
    }

    #[tokio::test]
    async fn test_successful_request() {
        let client = MockClient::default();
        let config = RequestConfig::builder()
            .adapter(HttpClientAdapter::new(client))
            .base_url("https://api.example.com")
            .url("/items")
            .params([("page", "1")])
            .build();

        let response = dispatch(config).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), "GET https://api.example.com/items?page=1");
    }

    #[tokio::test]
    async fn test_client_error_fails_request() {
        let client = MockClient {
            refuse: true,
            ..MockClient::default()
        };
        let config = RequestConfig::builder()
            .adapter(HttpClientAdapter::new(client))
            .url("https://api.example.com/items")
            .build();

        let err = dispatch(config).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport { .. }));
        assert_eq!(err.message(), "connection refused");
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_task() {
        let adapter = HttpClientAdapter::new(MockClient::default());
        let config = RequestConfig::builder()
            .adapter(adapter.clone())
            .url("http://exa mple.com")
            .build();

        let err = dispatch(config).await.unwrap_err();
        assert!(err.message().starts_with("invalid request"));
        assert_eq!(adapter.client.requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_runtime_fails_request() {
        let adapter = HttpClientAdapter::new(MockClient::default());
        let config = RequestConfig::builder()
            .adapter(adapter.clone())
            .url("https://api.example.com/items")
            .build();

        let err = dispatch(config).now_or_never().unwrap().unwrap_err();
        assert!(matches!(err, DispatchError::Transport { .. }));
        assert_eq!(
            err.message(),
            "no async runtime is available to drive the request"
        );
        assert_eq!(adapter.client.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout() {
        let client = MockClient {
            delay: Some(Duration::from_secs(5)),
            ..MockClient::default()
        };
        let config = RequestConfig::builder()
            .adapter(HttpClientAdapter::new(client))
            .url("https://api.example.com/slow")
            .timeout(Duration::from_millis(20))
            .build();

        let err = dispatch(config).await.unwrap_err();
        assert_eq!(err.message(), "timeout of 20ms exceeded");
    }

    #[tokio::test]
    async fn test_cancel_aborts_background_request() {
        let finished = Arc::new(AtomicBool::new(false));
        let client = MockClient {
            delay: Some(Duration::from_millis(200)),
            finished: finished.clone(),
            ..MockClient::default()
        };
        let (token, canceller) = CancelToken::source();
        let config = RequestConfig::builder()
            .adapter(HttpClientAdapter::new(client))
            .url("https://api.example.com/slow")
            .cancel_token(token)
            .build();

        let request = tokio::spawn(dispatch(config));
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel(Some("user cancel".to_owned()));

        let err = request.await.unwrap().unwrap_err();
        assert!(err.is_cancel());
        assert_eq!(err.to_string(), "user cancel");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
