//! Scripted in-memory Bitbucket used by the operation tests.

use async_trait::async_trait;
use bbsearch_client::BitbucketApi;
use bbsearch_core::{Error, Page, PageSource, QueryParams, RemoteResponse, Result};
use bbsearch_engine::RetrievalOperations;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct Call {
    pub resource: String,
    pub query: QueryParams,
    pub page: Option<u32>,
}

#[derive(Default)]
pub struct MockApi {
    pages: HashMap<String, Vec<Page>>,
    failures: HashMap<(String, u32), (u16, String)>,
    texts: HashMap<String, RemoteResponse>,
    post_response: Option<RemoteResponse>,
    pub calls: Mutex<Vec<Call>>,
    pub posts: Mutex<Vec<(String, Value)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pages` for `resource`; every page but the last links to the next.
    pub fn with_pages(mut self, resource: &str, pages: Vec<Vec<Value>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, records)| Page::new(records, i + 1 < count))
            .collect();
        self.pages.insert(resource.to_string(), pages);
        self
    }

    pub fn with_failure(mut self, resource: &str, page: u32, status: u16, body: &str) -> Self {
        self.failures
            .insert((resource.to_string(), page), (status, body.to_string()));
        self
    }

    pub fn with_text(mut self, resource: &str, status: u16, body: &str) -> Self {
        self.texts
            .insert(resource.to_string(), RemoteResponse::new(status, body));
        self
    }

    pub fn with_post_response(mut self, status: u16, body: &str) -> Self {
        self.post_response = Some(RemoteResponse::new(status, body));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockApi {
    async fn fetch_page(&self, resource: &str, query: &QueryParams, page: Option<u32>) -> Result<Page> {
        self.calls.lock().unwrap().push(Call {
            resource: resource.to_string(),
            query: query.clone(),
            page,
        });

        let number = page.unwrap_or(1);
        if let Some((status, body)) = self.failures.get(&(resource.to_string(), number)) {
            return Err(Error::Remote {
                status: *status,
                body: body.clone(),
            });
        }

        let pages = self.pages.get(resource).ok_or_else(|| Error::Remote {
            status: 404,
            body: format!("no such resource {}", resource),
        })?;
        Ok(pages
            .get(number as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl BitbucketApi for MockApi {
    async fn get_text(&self, resource: &str) -> Result<RemoteResponse> {
        Ok(self
            .texts
            .get(resource)
            .cloned()
            .unwrap_or_else(|| RemoteResponse::new(404, "Not found")))
    }

    async fn post_json(&self, resource: &str, body: &Value) -> Result<RemoteResponse> {
        self.posts
            .lock()
            .unwrap()
            .push((resource.to_string(), body.clone()));
        Ok(self
            .post_response
            .clone()
            .unwrap_or_else(|| RemoteResponse::new(201, "{}")))
    }
}

pub fn operations(api: MockApi, max_pages: u32) -> (Arc<MockApi>, RetrievalOperations) {
    let api = Arc::new(api);
    let ops = RetrievalOperations::new(api.clone(), "acme", max_pages);
    (api, ops)
}

pub fn records(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| json!({ "id": id })).collect()
}

pub fn ids(records: &[Value]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

/// A `code_search_result` for `path` whose single matching line is `line`.
pub fn search_hit(path: &str, line: &str) -> Value {
    json!({
        "type": "code_search_result",
        "content_match_count": 1,
        "content_matches": [{
            "lines": [{
                "line": 3,
                "segments": [
                    {"text": line},
                    {"text": "match", "match": true}
                ]
            }]
        }],
        "path_matches": [{"text": path}],
        "file": {
            "path": path,
            "type": "commit_file",
            "links": {"self": {"href": format!("https://api.bitbucket.org/2.0/repositories/acme/demo/src/abc/{}", path)}}
        }
    })
}
