use std::sync::Arc;

use bbsearch_client::{BitbucketApi, ClientOptions, HttpBitbucketClient, RetryPolicy};
use bbsearch_config::Config;
use bbsearch_core::{
    AggregatedResult, Error, PageSource, PagedFetcher, QueryParams, Result, SearchMatch, WriteOutcome,
};
use bbsearch_security::{classify, PatternRedactor};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::requests::{
    CommitQuery, PullRequestQuery, NewPullRequest, RepositoryQuery, SearchRequest, SearchResults,
};

const REPOSITORY_ROLES: &[&str] = &["member", "contributor", "admin", "owner"];
const PULL_REQUEST_STATES: &[&str] = &["OPEN", "MERGED", "DECLINED", "SUPERSEDED"];

/// One operation per Bitbucket resource, scoped to a single workspace.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct RetrievalOperations {
    api: Arc<dyn BitbucketApi>,
    workspace: String,
    fetcher: PagedFetcher,
    redactor: Arc<PatternRedactor>,
}

impl RetrievalOperations {
    pub fn new(api: Arc<dyn BitbucketApi>, workspace: impl Into<String>, max_pages: u32) -> Self {
        Self {
            api,
            workspace: workspace.into(),
            fetcher: PagedFetcher::new(max_pages),
            redactor: Arc::new(PatternRedactor::new()),
        }
    }

    pub fn from_config(api: Arc<dyn BitbucketApi>, config: &Config) -> Self {
        Self::new(api, config.bitbucket.workspace.clone(), config.fetch.max_pages)
    }

    /// Build the HTTP client described by `config` and wrap it.
    pub fn connect(config: &Config) -> Result<Self> {
        let mut options = ClientOptions::new(config.bitbucket.base_url.clone());
        if config.has_credentials() {
            options = options.with_credentials(
                config.bitbucket.username.clone(),
                config.bitbucket.app_password.clone(),
            );
        } else {
            warn!("No Bitbucket credentials configured, requests are anonymous");
        }
        options.timeout = std::time::Duration::from_secs(config.fetch.timeout_secs);
        options.retry = RetryPolicy::new(config.fetch.retry_attempts);

        let client = HttpBitbucketClient::new(options)?;
        Ok(Self::from_config(Arc::new(client), config))
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn max_pages(&self) -> u32 {
        self.fetcher.max_pages()
    }

    /// Code search across the workspace. Segment text is redacted per file.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let query = require("search query", &request.query)?;
        let resource = format!("workspaces/{}/search/code", self.workspace);
        let params = QueryParams::new().with("search_query", query);

        let result = self
            .collect(&resource, params, request.page, request.page_len, request.max_pages)
            .await?;

        let mut matches = Vec::with_capacity(result.records.len());
        for record in result.records {
            let mut found: SearchMatch = serde_json::from_value(record)
                .map_err(|e| Error::InvalidResponse(format!("Unexpected search result: {}", e)))?;
            self.redact_match(&mut found);
            matches.push(found);
        }

        info!(count = matches.len(), truncated = result.truncated, "Code search finished");
        Ok(SearchResults {
            matches,
            pages_fetched: result.pages_fetched,
            truncated: result.truncated,
        })
    }

    pub async fn list_repositories(&self, query: &RepositoryQuery) -> Result<AggregatedResult> {
        let role = query
            .role
            .as_deref()
            .map(|role| one_of("role", &role.to_ascii_lowercase(), REPOSITORY_ROLES))
            .transpose()?;

        let resource = format!("repositories/{}", self.workspace);
        let params = QueryParams::new()
            .with_opt("q", non_empty(&query.query))
            .with_opt("sort", non_empty(&query.sort))
            .with_opt("role", role);

        self.collect(&resource, params, query.page, query.page_len, None)
            .await
    }

    /// Commit history, always aggregated and capped.
    pub async fn list_commits(&self, query: &CommitQuery) -> Result<AggregatedResult> {
        let resource = self.repo_resource(&query.repo, "commits")?;
        let params = QueryParams::new()
            .with_all("include", query.include.iter().filter(|r| !r.is_empty()).cloned())
            .with_all("exclude", query.exclude.iter().filter(|r| !r.is_empty()).cloned())
            .with_opt("path", non_empty(&query.path));

        self.collect(&resource, params, None, None, query.max_pages)
            .await
    }

    pub async fn list_pull_requests(&self, query: &PullRequestQuery) -> Result<AggregatedResult> {
        let state = query
            .state
            .as_deref()
            .map(|state| one_of("state", &state.to_ascii_uppercase(), PULL_REQUEST_STATES))
            .transpose()?;

        let resource = self.repo_resource(&query.repo, "pullrequests")?;
        let params = QueryParams::new().with_opt("state", state);

        self.collect(&resource, params, query.page, query.page_len, None)
            .await
    }

    /// Raw file content at `git_ref`, redacted according to the file's extension.
    pub async fn get_file_content(&self, repo: &str, git_ref: &str, path: &str) -> Result<String> {
        let git_ref = require("ref", git_ref)?;
        let path = require("path", path.trim_start_matches('/'))?;
        let resource = self.repo_resource(repo, &format!("src/{}/{}", git_ref, path))?;

        let response = self.api.get_text(&resource).await?;
        if !response.is_success() {
            return Err(Error::Remote {
                status: response.status,
                body: response.body,
            });
        }

        let policy = classify(path);
        let (content, redactions) = self.redactor.redact_with_report(path, &response.body, policy);
        if !redactions.is_empty() {
            debug!(path, ?policy, ?redactions, "Redacted file content");
        }
        Ok(content)
    }

    /// Create `branch` from `base_ref`. The response body is returned verbatim.
    pub async fn create_branch(&self, repo: &str, branch: &str, base_ref: &str) -> Result<WriteOutcome> {
        let branch = require("branch name", branch)?;
        let base_ref = require("base ref", base_ref)?;
        let resource = self.repo_resource(repo, "refs/branches")?;
        let body = json!({ "name": branch, "target": { "hash": base_ref } });

        let outcome = WriteOutcome::from_response(self.api.post_json(&resource, &body).await?);
        log_write("create branch", &outcome);
        Ok(outcome)
    }

    pub async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<WriteOutcome> {
        require("source branch", &pr.source_branch)?;
        require("destination branch", &pr.destination_branch)?;
        require("title", &pr.title)?;
        let resource = self.repo_resource(&pr.repo, "pullrequests")?;

        let outcome = WriteOutcome::from_response(self.api.post_json(&resource, &pr.body()).await?);
        log_write("create pull request", &outcome);
        Ok(outcome)
    }

    /// Single page when `page` is given, bounded aggregation otherwise.
    async fn collect(
        &self,
        resource: &str,
        params: QueryParams,
        page: Option<u32>,
        page_len: Option<u32>,
        max_pages: Option<u32>,
    ) -> Result<AggregatedResult> {
        let source: &dyn PageSource = self.api.as_ref();
        match page {
            Some(page) => {
                let fetched = self
                    .fetcher
                    .fetch_one(source, resource, &params, page, page_len)
                    .await?;
                Ok(AggregatedResult::from(fetched))
            }
            None => {
                let params = params.with_opt("pagelen", page_len.map(|len| len.to_string()));
                let fetcher = max_pages.map(PagedFetcher::new).unwrap_or(self.fetcher);
                fetcher.fetch_all(source, resource, &params).await
            }
        }
    }

    fn redact_match(&self, found: &mut SearchMatch) {
        let path = found.file.path.clone();
        let policy = classify(&path);
        let mut total = 0;
        for segment in found.segments_mut() {
            let (text, redactions) = self.redactor.redact_with_report(&path, &segment.text, policy);
            total += redactions.iter().map(|r| r.count).sum::<usize>();
            segment.text = text;
        }
        if total > 0 {
            debug!(path = %path, ?policy, total, "Redacted search segments");
        }
    }

    fn repo_resource(&self, repo: &str, tail: &str) -> Result<String> {
        let repo = require("repository", repo)?;
        if repo.contains('/') {
            return Err(Error::InvalidArgument(format!(
                "Repository slug must not contain '/': {}",
                repo
            )));
        }
        Ok(format!("repositories/{}/{}/{}", self.workspace, repo, tail))
    }
}

fn require<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::InvalidArgument(format!("Missing {}", what)))
    } else {
        Ok(trimmed)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn one_of(what: &str, value: &str, allowed: &[&str]) -> Result<String> {
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(Error::InvalidArgument(format!(
            "Invalid {} '{}', expected one of: {}",
            what,
            value,
            allowed.join(", ")
        )))
    }
}

fn log_write(action: &str, outcome: &WriteOutcome) {
    if outcome.is_created() {
        info!(action, status = outcome.status(), "Write request succeeded");
    } else {
        warn!(action, status = outcome.status(), "Write request rejected");
    }
}
