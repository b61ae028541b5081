//! Runtime-agnostic request dispatch.
//!
//! Requests are described by a [`RequestConfig`] and performed by an
//! [`Adapter`](adapter::Adapter) supplied for the host runtime. [`dispatch`]
//! ties the two together: it hands the adapter a normalized request, turns
//! the adapter's report into a single outcome, validates the response status,
//! and aborts the adapter's work when the caller cancels.
//!
//! ```no_run
//! use courier::{
//!     RequestConfig,
//!     adapter::{AdapterDescriptor, Completion, NoTask},
//!     dispatch,
//!     response::AdapterResponse,
//! };
//! use http::StatusCode;
//!
//! # async fn run() -> Result<(), courier::DispatchError> {
//! let adapter = |descriptor: AdapterDescriptor, completion: Completion| {
//!     println!("{} {}", descriptor.method, descriptor.url);
//!     completion.success(AdapterResponse::new(StatusCode::OK).with_body("pong"));
//!     None::<NoTask>
//! };
//!
//! let response = dispatch(
//!     RequestConfig::builder()
//!         .adapter(adapter)
//!         .url("https://example.com/ping")
//!         .build(),
//! )
//! .await?;
//! assert_eq!(response.text(), "pong");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod adapter;
pub mod cancel;
pub mod config;
mod dispatch;
mod error;
pub mod http;
pub mod platform;
pub mod request;
pub mod response;

pub use config::RequestConfig;
pub use dispatch::dispatch;
pub use error::{DispatchError, Error, RequestError};

pub use bytes::Bytes;
