//! HTTP plumbing for feed downloads.
//!
//! [`HttpClient`] is the seam: [`BasicClient`] does the request, wrappers in
//! [`auth`] decorate it with credentials.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::FeedError;

/// GETs `url` through `client` and returns the body of a successful response.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Vec<u8>, FeedError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidEndpoint {
        endpoint: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let fetch_err = |source: reqwest::Error| FeedError::Fetch {
        endpoint: url.to_string(),
        source,
    };

    let resp = client
        .execute(req)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    let body = resp.bytes().await.map_err(fetch_err)?;
    Ok(body.to_vec())
}
