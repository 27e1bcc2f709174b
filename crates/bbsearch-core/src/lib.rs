//! Core domain models and logic for bbsearch
//!
//! This crate contains:
//! - Domain models (Page, AggregatedResult, SearchMatch, WriteOutcome)
//! - The page source capability and the bounded page aggregation loop
//! - The shared error taxonomy

pub mod error;
pub mod page;
pub mod paging;
pub mod search;
pub mod write;

pub use error::{Error, Result};
pub use page::{AggregatedResult, Page, QueryParams};
pub use paging::{PageSource, PagedFetcher, DEFAULT_MAX_PAGES};
pub use search::{ContentMatch, MatchLine, SearchFile, SearchMatch, Segment};
pub use write::{RemoteResponse, WriteOutcome};
