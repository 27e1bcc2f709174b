use async_trait::async_trait;
use bbsearch_core::{PageSource, RemoteResponse, Result};

/// Everything the retrieval operations ask of the remote.
#[async_trait]
pub trait BitbucketApi: PageSource {
    /// GET `resource` and return the raw body whatever the status.
    async fn get_text(&self, resource: &str) -> Result<RemoteResponse>;

    /// POST a JSON body to `resource` and return the raw response.
    async fn post_json(&self, resource: &str, body: &serde_json::Value) -> Result<RemoteResponse>;
}
