//! Bitbucket Cloud REST client
//!
//! Implements the page source capability plus the raw GET / JSON POST calls
//! the retrieval operations need. Retries live here and nowhere else.

pub mod api;
pub mod http;
pub mod retry;

pub use api::BitbucketApi;
pub use http::{ClientOptions, HttpBitbucketClient};
pub use retry::RetryPolicy;
