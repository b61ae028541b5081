use std::time::Duration;

use courier::{RequestConfig, adapter::HttpClientAdapter, cancel::CancelToken, dispatch};
use snafu::prelude::*;

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    let url = std::env::var("URL").whatever_context("Failed to get URL")?;
    let adapter = HttpClientAdapter::new(reqwest::Client::new());

    let response = dispatch(
        RequestConfig::builder()
            .adapter(adapter.clone())
            .url(url.clone())
            .validate_status(|status: http::StatusCode| status.is_success())
            .timeout(Duration::from_secs(10))
            .build(),
    )
    .await
    .whatever_context("Request failed")?;

    println!("{} ({} bytes)", response.status, response.body.len());

    let (token, canceller) = CancelToken::source();
    let pending = tokio::spawn(dispatch(
        RequestConfig::builder()
            .adapter(adapter)
            .url(url)
            .cancel_token(token)
            .build(),
    ));
    canceller.cancel(Some("no longer needed".to_owned()));

    match pending.await.whatever_context("Request task panicked")? {
        Ok(response) => println!("Finished before cancellation: {}", response.status),
        Err(err) if err.is_cancel() => println!("Cancelled: {err}"),
        Err(err) => return Err(err).whatever_context("Request failed"),
    }

    Ok(())
}
