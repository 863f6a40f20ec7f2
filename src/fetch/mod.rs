//! HTTP access to the public trip-data source.
//!
//! [`HttpClient`] is the transport seam the ingestion stage receives as an
//! explicit dependency, so tests can substitute a canned client;
//! [`BasicClient`] is the production implementation backed by `reqwest`.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;

/// Fetches the full body at `url` as bytes.
///
/// Non-success statuses are errors: the trip-data host serves plain files,
/// so anything but a 2xx means the requested object does not exist or the
/// fetch failed, and the stage must abort rather than stage an error page.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
