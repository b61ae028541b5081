//! Adapter-ready requests.
//!
//! [`normalize`] flattens a [`RequestConfig`] into an [`AdapterDescriptor`]:
//! the full URL with its query string, and the method, headers, body and
//! timeout an adapter needs to perform the request.

use bytes::Bytes;
use http::{HeaderMap, Method, Request};

use crate::{config::RequestConfig, platform::Duration};

/// The request as seen by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDescriptor {
    /// The request method.
    pub method: Method,
    /// The full request URL, including query parameters.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Requested timeout, enforced by the adapter if at all.
    pub timeout: Option<Duration>,
}

impl AdapterDescriptor {
    /// Builds an [`http::Request`] for clients that speak the `http` crate types.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a valid URI.
    pub fn to_http_request(&self) -> Result<Request<Bytes>, http::Error> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }
        builder.body(self.body.clone().unwrap_or_default())
    }
}

/// Maps a request configuration to the descriptor handed to the adapter.
#[must_use]
pub fn normalize(config: &RequestConfig) -> AdapterDescriptor {
    let mut url = combine_url(config.base_url.as_deref(), &config.url);
    append_params(&mut url, &config.params);

    AdapterDescriptor {
        method: config.method.clone(),
        url,
        headers: config.headers.clone(),
        body: config.body.clone(),
        timeout: config.timeout,
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn combine_url(base_url: Option<&str>, url: &str) -> String {
    match base_url {
        Some(base) if !is_absolute_url(url) && !url.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        Some(base) if url.is_empty() => base.to_owned(),
        _ => url.to_owned(),
    }
}

fn append_params(url: &mut String, params: &[(String, String)]) {
    if params.is_empty() {
        return;
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    // Drop any fragment; it never reaches the server.
    if let Some(hash) = url.find('#') {
        url.truncate(hash);
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&query);
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn test_relative_url_joins_base() {
        let config = RequestConfig::builder()
            .base_url("https://api.example.com/v1/")
            .url("/users")
            .build();

        assert_eq!(normalize(&config).url, "https://api.example.com/v1/users");
    }

    #[test]
    fn test_absolute_url_ignores_base() {
        let config = RequestConfig::builder()
            .base_url("https://api.example.com")
            .url("https://other.example.com/ping")
            .build();

        assert_eq!(normalize(&config).url, "https://other.example.com/ping");
    }

    #[test]
    fn test_empty_url_uses_base() {
        let config = RequestConfig::builder()
            .base_url("https://api.example.com")
            .build();

        assert_eq!(normalize(&config).url, "https://api.example.com");
    }

    #[test]
    fn test_params_are_encoded() {
        let config = RequestConfig::builder()
            .url("https://api.example.com/search?lang=en#results")
            .params([("q", "rust & wasm"), ("page", "2")])
            .build();

        assert_eq!(
            normalize(&config).url,
            "https://api.example.com/search?lang=en&q=rust+%26+wasm&page=2"
        );
    }

    #[test]
    fn test_fields_carried_over() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let config = RequestConfig::builder()
            .method(Method::POST)
            .url("https://api.example.com/items")
            .headers(headers.clone())
            .body(r#"{"name":"x"}"#)
            .timeout(Duration::from_secs(5))
            .build();

        let descriptor = normalize(&config);
        assert_eq!(descriptor.method, Method::POST);
        assert_eq!(descriptor.headers, headers);
        assert_eq!(descriptor.body.as_deref(), Some(br#"{"name":"x"}"#.as_slice()));
        assert_eq!(descriptor.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_to_http_request() {
        let config = RequestConfig::builder()
            .method(Method::PUT)
            .url("https://api.example.com/items/1")
            .body("payload")
            .build();

        let request = normalize(&config).to_http_request().unwrap();
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.uri(), "https://api.example.com/items/1");
        assert_eq!(request.body().as_ref(), b"payload");
    }

    #[test]
    fn test_to_http_request_rejects_bad_uri() {
        let config = RequestConfig::builder().url("http://exa mple.com").build();
        assert!(normalize(&config).to_http_request().is_err());
    }
}
