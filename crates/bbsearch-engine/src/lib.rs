//! Retrieval operations over the Bitbucket API
//!
//! Each operation builds its query, pages through the remote collection and
//! masks credentials in any file text before handing results back.

pub mod operations;
pub mod requests;

pub use operations::RetrievalOperations;
pub use requests::{CommitQuery, PullRequestQuery, NewPullRequest, RepositoryQuery, SearchRequest, SearchResults};
