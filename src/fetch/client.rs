use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used for trip-data downloads.
///
/// The ingestion stage never constructs its own client; it executes
/// requests through whatever implementation it is handed, which is how
/// tests replace the network with canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
