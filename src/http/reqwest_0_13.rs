//! [`HttpClient`] for `reqwest` 0.13.

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use super::{HttpClient, HttpResponse};

impl HttpClient for reqwest::Client {
    type Response = reqwest::Response;
    type Error = reqwest::Error;

    /// Converts the `http::Request` into a `reqwest::Request` and sends it.
    async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        let (parts, body) = request.into_parts();
        let reqwest_request = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .build()?;

        reqwest::Client::execute(self, reqwest_request).await
    }
}

impl HttpResponse for reqwest::Response {
    type Error = reqwest::Error;

    /// Returns the HTTP status code of the response.
    fn status(&self) -> StatusCode {
        self.status()
    }

    /// Returns a copy of the response headers.
    fn headers(&self) -> HeaderMap {
        self.headers().clone()
    }

    /// Reads the whole body into memory.
    async fn body(self) -> Result<Bytes, Self::Error> {
        self.bytes().await
    }
}

/// Connection failures and timeouts are worth retrying.
impl crate::Error for reqwest::Error {
    fn is_retryable(&self) -> bool {
        self.is_connect() || self.is_timeout()
    }
}
