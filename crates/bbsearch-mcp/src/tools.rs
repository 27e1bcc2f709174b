use bbsearch_core::{AggregatedResult, WriteOutcome};
use bbsearch_engine::{CommitQuery, PullRequestQuery, NewPullRequest, RepositoryQuery, SearchRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::server::McpServer;

pub const CODE_SEARCH: &str = "bitbucket_code_search";
pub const LIST_REPOSITORIES: &str = "bitbucket_list_repositories";
pub const LIST_COMMITS: &str = "bitbucket_list_commits";
pub const LIST_PULL_REQUESTS: &str = "bitbucket_list_pull_requests";
pub const GET_FILE_CONTENT: &str = "bitbucket_get_file_content";
pub const CREATE_BRANCH: &str = "bitbucket_create_branch";
pub const CREATE_PULL_REQUEST: &str = "bitbucket_create_pull_request";

const WRITE_TOOLS: &[&str] = &[CREATE_BRANCH, CREATE_PULL_REQUEST];

pub const NO_RESULTS: &str = "No results found.";

/// Protocol-level failures. Operation failures are reported inside a
/// [`ToolResult`] instead.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("Missing tool name")]
    MissingName,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        source: serde_json::Error,
    },

    #[error("Tool {0} is not available in read-only mode")]
    ReadOnly(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TextContent {
    fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            is_error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(message)],
            is_error: true,
        }
    }

    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.content.push(TextContent::new(note));
        self
    }

    /// Concatenated text of all blocks.
    pub fn joined(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct CodeSearchArgs {
    search_query: String,
    page: Option<u32>,
    page_len: Option<u32>,
    max_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ListRepositoriesArgs {
    query: Option<String>,
    sort: Option<String>,
    role: Option<String>,
    page: Option<u32>,
    page_len: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListCommitsArgs {
    repo_slug: String,
    #[serde(default)]
    include: Option<Revisions>,
    #[serde(default)]
    exclude: Option<Revisions>,
    path: Option<String>,
    max_page: Option<u32>,
}

/// A single revision or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Revisions {
    One(String),
    Many(Vec<String>),
}

impl Revisions {
    fn into_vec(self) -> Vec<String> {
        match self {
            Revisions::One(rev) => vec![rev],
            Revisions::Many(revs) => revs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListPullRequestsArgs {
    repo_slug: String,
    state: Option<String>,
    page: Option<u32>,
    page_len: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GetFileContentArgs {
    repo_slug: String,
    #[serde(rename = "ref")]
    git_ref: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct CreateBranchArgs {
    repo_slug: String,
    branch_name: String,
    base_ref: String,
}

#[derive(Debug, Deserialize)]
struct CreatePullRequestArgs {
    repo_slug: String,
    source_branch: String,
    destination_branch: String,
    title: String,
    #[serde(default)]
    description: String,
}

pub async fn call_tool(server: &McpServer, params: &Value) -> Result<ToolResult, ToolCallError> {
    let tool_name = params["name"].as_str().ok_or(ToolCallError::MissingName)?;
    let args = match &params["arguments"] {
        Value::Null => json!({}),
        other => other.clone(),
    };

    if WRITE_TOOLS.contains(&tool_name) && server.read_only {
        warn!(tool = tool_name, "Refusing write tool in read-only mode");
        return Err(ToolCallError::ReadOnly(tool_name.to_string()));
    }

    info!(tool = tool_name, "Calling tool");
    let ops = &server.ops;

    let result = match tool_name {
        CODE_SEARCH => {
            let args: CodeSearchArgs = parse(tool_name, args)?;
            let request = SearchRequest {
                query: args.search_query,
                page: args.page,
                page_len: args.page_len,
                max_pages: args.max_page,
            };
            match ops.search(&request).await {
                Ok(results) => {
                    let records = results
                        .matches
                        .iter()
                        .map(serde_json::to_value)
                        .collect::<Result<Vec<_>, _>>();
                    match records {
                        Ok(records) => listing(&records, results.truncated, results.pages_fetched),
                        Err(e) => ToolResult::failure(format!("Failed to encode results: {}", e)),
                    }
                }
                Err(e) => ToolResult::failure(e.to_string()),
            }
        }
        LIST_REPOSITORIES => {
            let args: ListRepositoriesArgs = parse(tool_name, args)?;
            let query = RepositoryQuery {
                query: args.query,
                sort: args.sort,
                role: args.role,
                page: args.page,
                page_len: args.page_len,
            };
            aggregated(ops.list_repositories(&query).await)
        }
        LIST_COMMITS => {
            let args: ListCommitsArgs = parse(tool_name, args)?;
            let query = CommitQuery {
                repo: args.repo_slug,
                include: args.include.map(Revisions::into_vec).unwrap_or_default(),
                exclude: args.exclude.map(Revisions::into_vec).unwrap_or_default(),
                path: args.path,
                max_pages: args.max_page,
            };
            aggregated(ops.list_commits(&query).await)
        }
        LIST_PULL_REQUESTS => {
            let args: ListPullRequestsArgs = parse(tool_name, args)?;
            let query = PullRequestQuery {
                repo: args.repo_slug,
                state: args.state,
                page: args.page,
                page_len: args.page_len,
            };
            aggregated(ops.list_pull_requests(&query).await)
        }
        GET_FILE_CONTENT => {
            let args: GetFileContentArgs = parse(tool_name, args)?;
            match ops
                .get_file_content(&args.repo_slug, &args.git_ref, &args.path)
                .await
            {
                Ok(content) => ToolResult::text(content),
                Err(e) => ToolResult::failure(e.to_string()),
            }
        }
        CREATE_BRANCH => {
            let args: CreateBranchArgs = parse(tool_name, args)?;
            written(
                ops.create_branch(&args.repo_slug, &args.branch_name, &args.base_ref)
                    .await,
            )
        }
        CREATE_PULL_REQUEST => {
            let args: CreatePullRequestArgs = parse(tool_name, args)?;
            let pull_request = NewPullRequest {
                repo: args.repo_slug,
                source_branch: args.source_branch,
                destination_branch: args.destination_branch,
                title: args.title,
                description: args.description,
            };
            written(ops.create_pull_request(&pull_request).await)
        }
        _ => return Err(ToolCallError::UnknownTool(tool_name.to_string())),
    };

    if result.is_error {
        warn!(tool = tool_name, "Tool call failed");
    }
    Ok(result)
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolCallError> {
    serde_json::from_value(args).map_err(|source| ToolCallError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

fn listing(records: &[Value], truncated: bool, pages_fetched: u32) -> ToolResult {
    if records.is_empty() {
        return ToolResult::text(NO_RESULTS);
    }
    let text = match serde_json::to_string_pretty(records) {
        Ok(text) => text,
        Err(e) => return ToolResult::failure(format!("Failed to encode results: {}", e)),
    };
    let result = ToolResult::text(text);
    if truncated {
        result.with_note(format!(
            "Results truncated after {} pages. Narrow the query or raise max_page to see more.",
            pages_fetched
        ))
    } else {
        result
    }
}

fn aggregated(result: bbsearch_core::Result<AggregatedResult>) -> ToolResult {
    match result {
        Ok(result) => listing(&result.records, result.truncated, result.pages_fetched),
        Err(e) => ToolResult::failure(e.to_string()),
    }
}

fn written(result: bbsearch_core::Result<WriteOutcome>) -> ToolResult {
    match result {
        Ok(WriteOutcome::Created { body, .. }) => ToolResult::text(body),
        Ok(WriteOutcome::Rejected { status, body }) => {
            ToolResult::failure(format!("Bitbucket returned status {}: {}", status, body))
        }
        Err(e) => ToolResult::failure(e.to_string()),
    }
}

pub fn list_tools(read_only: bool) -> Value {
    let mut tools = vec![
        tool_schema(
            CODE_SEARCH,
            "Search code across the workspace. Credentials in matched lines are masked.",
            json!({
                "type": "object",
                "properties": {
                    "search_query": {"type": "string", "description": "Bitbucket code search query"},
                    "page": {"type": "integer", "minimum": 1, "description": "Fetch only this page"},
                    "page_len": {"type": "integer", "minimum": 1, "description": "Results per page"},
                    "max_page": {"type": "integer", "minimum": 1, "description": "Maximum pages to aggregate"}
                },
                "required": ["search_query"]
            }),
        ),
        tool_schema(
            LIST_REPOSITORIES,
            "List repositories in the workspace",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Filter expression, e.g. name ~ \"api\""},
                    "sort": {"type": "string", "description": "Sort field, prefix with - for descending"},
                    "role": {"type": "string", "enum": ["member", "contributor", "admin", "owner"]},
                    "page": {"type": "integer", "minimum": 1},
                    "page_len": {"type": "integer", "minimum": 1}
                }
            }),
        ),
        tool_schema(
            LIST_COMMITS,
            "List commits of a repository",
            json!({
                "type": "object",
                "properties": {
                    "repo_slug": {"type": "string"},
                    "include": {
                        "oneOf": [{"type": "string"}, {"type": "array", "items": {"type": "string"}}],
                        "description": "Revisions to include"
                    },
                    "exclude": {
                        "oneOf": [{"type": "string"}, {"type": "array", "items": {"type": "string"}}],
                        "description": "Revisions to exclude"
                    },
                    "path": {"type": "string", "description": "Only commits touching this path"},
                    "max_page": {"type": "integer", "minimum": 1}
                },
                "required": ["repo_slug"]
            }),
        ),
        tool_schema(
            LIST_PULL_REQUESTS,
            "List pull requests of a repository",
            json!({
                "type": "object",
                "properties": {
                    "repo_slug": {"type": "string"},
                    "state": {"type": "string", "enum": ["OPEN", "MERGED", "DECLINED", "SUPERSEDED"]},
                    "page": {"type": "integer", "minimum": 1},
                    "page_len": {"type": "integer", "minimum": 1}
                },
                "required": ["repo_slug"]
            }),
        ),
        tool_schema(
            GET_FILE_CONTENT,
            "Get the content of a file at a commit, branch or tag. Credentials are masked.",
            json!({
                "type": "object",
                "properties": {
                    "repo_slug": {"type": "string"},
                    "ref": {"type": "string", "description": "Commit hash, branch or tag"},
                    "path": {"type": "string"}
                },
                "required": ["repo_slug", "ref", "path"]
            }),
        ),
    ];

    if !read_only {
        tools.push(tool_schema(
            CREATE_BRANCH,
            "Create a branch from a base ref",
            json!({
                "type": "object",
                "properties": {
                    "repo_slug": {"type": "string"},
                    "branch_name": {"type": "string"},
                    "base_ref": {"type": "string", "description": "Commit hash or branch to branch from"}
                },
                "required": ["repo_slug", "branch_name", "base_ref"]
            }),
        ));
        tools.push(tool_schema(
            CREATE_PULL_REQUEST,
            "Open a pull request",
            json!({
                "type": "object",
                "properties": {
                    "repo_slug": {"type": "string"},
                    "source_branch": {"type": "string"},
                    "destination_branch": {"type": "string"},
                    "title": {"type": "string"},
                    "description": {"type": "string"}
                },
                "required": ["repo_slug", "source_branch", "destination_branch", "title"]
            }),
        ));
    }

    json!({ "tools": tools })
}

fn tool_schema(name: &str, description: &str, input_schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": input_schema
    })
}
