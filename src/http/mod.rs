//! Async HTTP client abstractions.
//!
//! [`HttpClient`] lets an async client (e.g. `reqwest` natively, or a
//! `fetch`-backed client in the browser) drive requests through
//! [`HttpClientAdapter`](crate::adapter::HttpClientAdapter).

#[cfg(all(not(target_arch = "wasm32"), feature = "http-client-reqwest-0_13"))]
mod reqwest_0_13;

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};

use crate::platform::{MaybeSend, MaybeSendSync};

/// An async HTTP client.
pub trait HttpClient: MaybeSendSync + 'static {
    /// The error type returned by the client for a failed request.
    type Error: crate::Error;

    /// The response type returned by this client.
    type Response: HttpResponse;

    /// Executes a request.
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + MaybeSend;
}

/// A response whose body may still be streaming.
pub trait HttpResponse: MaybeSendSync {
    /// The error type when reading the response body.
    type Error: crate::Error;

    /// Returns the response status.
    fn status(&self) -> StatusCode;

    /// Returns the response headers.
    fn headers(&self) -> HeaderMap;

    /// Consumes the response and reads its whole body.
    fn body(self) -> impl Future<Output = Result<Bytes, Self::Error>> + MaybeSend;
}
