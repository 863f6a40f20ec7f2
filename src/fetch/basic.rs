use super::client::HttpClient;
use async_trait::async_trait;

/// Production [`HttpClient`] over a plain `reqwest` client.
///
/// The trip-data source is public and unauthenticated, so no headers or
/// query parameters are ever attached.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
