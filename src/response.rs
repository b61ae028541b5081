//! Normalized responses.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::RequestConfig;

/// The success payload an adapter reports back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterResponse {
    /// The response status.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Bytes,
}

impl AdapterResponse {
    /// Creates a response with the given status, no headers and an empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<http::Response<Bytes>> for AdapterResponse {
    fn from(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// A response, bound to the configuration that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    /// The response status.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Bytes,
    /// The configuration the request was dispatched with.
    pub config: Arc<RequestConfig>,
}

impl Response {
    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Binds an adapter's success payload to the request configuration.
#[must_use]
pub fn normalize(response: AdapterResponse, config: Arc<RequestConfig>) -> Response {
    let AdapterResponse {
        status,
        headers,
        body,
    } = response;

    Response {
        status,
        headers,
        body,
        config,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_normalize_keeps_payload_and_config() {
        let config = Arc::new(RequestConfig::builder().url("/users/1").build());
        let adapter_response = AdapterResponse::new(StatusCode::NOT_FOUND).with_body("x");

        let response = normalize(adapter_response, config.clone());
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "x");
        assert!(Arc::ptr_eq(&response.config, &config));
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
            name: String,
        }

        let config = Arc::new(RequestConfig::builder().build());
        let response = normalize(
            AdapterResponse::new(StatusCode::OK).with_body(r#"{"id":1,"name":"ada"}"#),
            config,
        );

        assert_eq!(
            response.json::<User>().unwrap(),
            User {
                id: 1,
                name: "ada".to_owned()
            }
        );
        assert!(response.json::<Vec<u32>>().is_err());
    }

    #[test]
    fn test_from_http_response() {
        let response = http::Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/items/7")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let adapter_response = AdapterResponse::from(response);
        assert_eq!(adapter_response.status, StatusCode::CREATED);
        assert_eq!(adapter_response.headers["location"], "/items/7");
        assert_eq!(adapter_response.body, Bytes::from_static(b"{}"));
    }
}
