use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Implementations may add headers or query
/// parameters before delegating to an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
