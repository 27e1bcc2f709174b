//! Parameters and results of the retrieval operations

use bbsearch_core::SearchMatch;
use serde_json::Value;

/// Code search. A `page` selects a single page; otherwise pages are
/// aggregated up to `max_pages` (or the configured default).
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub page: Option<u32>,
    pub page_len: Option<u32>,
    pub max_pages: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
    pub pages_fetched: u32,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryQuery {
    /// Bitbucket filter expression, e.g. `name ~ "api"`
    pub query: Option<String>,
    pub sort: Option<String>,
    /// member, contributor, admin or owner
    pub role: Option<String>,
    pub page: Option<u32>,
    pub page_len: Option<u32>,
}

/// Commit history is always aggregated, bounded by `max_pages`.
#[derive(Debug, Clone, Default)]
pub struct CommitQuery {
    pub repo: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub path: Option<String>,
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct PullRequestQuery {
    pub repo: String,
    /// OPEN, MERGED, DECLINED or SUPERSEDED
    pub state: Option<String>,
    pub page: Option<u32>,
    pub page_len: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPullRequest {
    pub repo: String,
    pub source_branch: String,
    pub destination_branch: String,
    pub title: String,
    pub description: String,
}

impl NewPullRequest {
    pub(crate) fn body(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "source": { "branch": { "name": self.source_branch } },
            "destination": { "branch": { "name": self.destination_branch } },
        })
    }
}
