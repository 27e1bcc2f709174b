//! Bounded page aggregation
//!
//! The remote hands out results one page at a time. `PagedFetcher` either
//! returns a single page or walks pages 1..=max_pages, stopping at the first
//! page without a continuation link.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::page::{AggregatedResult, Page, QueryParams};
use crate::Result;

/// Maximum number of pages a single aggregation consumes by default.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Remote capability returning one page of a collection.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of `resource`.
    ///
    /// `page` is `None` for the first page; the remote's first page is implicit.
    async fn fetch_page(&self, resource: &str, query: &QueryParams, page: Option<u32>)
        -> Result<Page>;
}

#[derive(Debug, Clone, Copy)]
pub struct PagedFetcher {
    max_pages: u32,
}

impl PagedFetcher {
    pub fn new(max_pages: u32) -> Self {
        Self { max_pages }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Fetch every page until the remote stops reporting a continuation or
    /// the cap is reached. Errors discard whatever was collected so far.
    pub async fn fetch_all(
        &self,
        source: &dyn PageSource,
        resource: &str,
        query: &QueryParams,
    ) -> Result<AggregatedResult> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            info!(resource, page, "Fetching page");
            let fetched = source.fetch_page(resource, query, page_param(page)).await?;
            records.extend(fetched.records);

            if !fetched.has_next {
                return Ok(AggregatedResult {
                    records,
                    pages_fetched: page,
                    truncated: false,
                });
            }

            if page >= self.max_pages {
                warn!(
                    resource,
                    max_pages = self.max_pages,
                    "Reached maximum page limit, results truncated"
                );
                return Ok(AggregatedResult {
                    records,
                    pages_fetched: page,
                    truncated: true,
                });
            }

            page += 1;
        }
    }

    /// Fetch exactly one page with an explicit page number and page size.
    pub async fn fetch_one(
        &self,
        source: &dyn PageSource,
        resource: &str,
        query: &QueryParams,
        page: u32,
        page_len: Option<u32>,
    ) -> Result<Page> {
        let page = page.max(1);
        let query = query
            .clone()
            .with_opt("pagelen", page_len.map(|len| len.to_string()));

        info!(resource, page, "Fetching single page");
        source.fetch_page(resource, &query, page_param(page)).await
    }
}

impl Default for PagedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

fn page_param(page: u32) -> Option<u32> {
    (page > 1).then_some(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays scripted pages and records every requested page parameter.
    struct ScriptedSource {
        pages: Vec<Result<Page>>,
        calls: Mutex<Vec<(Option<u32>, QueryParams)>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page>>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn requested_pages(&self) -> Vec<Option<u32>> {
            self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _resource: &str,
            query: &QueryParams,
            page: Option<u32>,
        ) -> Result<Page> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push((page, query.clone()));
            match self.pages.get(index) {
                Some(Ok(p)) => Ok(p.clone()),
                Some(Err(e)) => Err(Error::Transport(e.to_string())),
                None => panic!("unexpected fetch of page {:?}", page),
            }
        }
    }

    fn page(ids: &[i64], has_next: bool) -> Result<Page> {
        Ok(Page::new(ids.iter().map(|id| json!({ "id": id })).collect(), has_next))
    }

    fn ids(result: &AggregatedResult) -> Vec<i64> {
        result.records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    fn three_pages() -> Vec<Result<Page>> {
        vec![page(&[1, 2], true), page(&[3, 4], true), page(&[5, 6], false)]
    }

    #[tokio::test]
    async fn test_aggregates_all_pages_in_order() {
        let source = ScriptedSource::new(three_pages());
        let result = PagedFetcher::new(3)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1, 2, 3, 4, 5, 6]);
        assert!(!result.truncated);
        assert_eq!(result.pages_fetched, 3);
    }

    #[tokio::test]
    async fn test_cap_truncates() {
        let source = ScriptedSource::new(three_pages());
        let result = PagedFetcher::new(2)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1, 2, 3, 4]);
        assert!(result.truncated);
        assert_eq!(source.requested_pages().len(), 2);
    }

    #[tokio::test]
    async fn test_first_request_has_no_page_number() {
        let source = ScriptedSource::new(three_pages());
        PagedFetcher::new(10)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(source.requested_pages(), vec![None, Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn test_empty_page_with_next_keeps_going() {
        let source = ScriptedSource::new(vec![page(&[], true), page(&[], true), page(&[7], false)]);
        let result = PagedFetcher::new(10)
            .fetch_all(&source, "repositories/ws", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![7]);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_zero_cap_still_fetches_once() {
        let source = ScriptedSource::new(three_pages());
        let result = PagedFetcher::new(0)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1, 2]);
        assert!(result.truncated);
        assert_eq!(source.requested_pages(), vec![None]);
    }

    #[tokio::test]
    async fn test_cap_of_one_on_single_page_is_complete() {
        let source = ScriptedSource::new(vec![page(&[1], false)]);
        let result = PagedFetcher::new(1)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1]);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let source = ScriptedSource::new(vec![
            page(&[1, 2], true),
            Err(Error::Transport("connection reset".to_string())),
        ]);
        let result = PagedFetcher::new(10)
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await;

        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_empty_collection_is_not_an_error() {
        let source = ScriptedSource::new(vec![page(&[], false)]);
        let result = PagedFetcher::default()
            .fetch_all(&source, "search/code", &QueryParams::new())
            .await
            .unwrap();

        assert!(result.is_empty());
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_fetch_one_sends_page_and_pagelen() {
        let source = ScriptedSource::new(vec![page(&[9], true), page(&[10], true)]);
        let fetcher = PagedFetcher::default();
        let query = QueryParams::new().with("q", "x");

        let first = fetcher
            .fetch_one(&source, "repositories/ws", &query, 1, None)
            .await
            .unwrap();
        let third = fetcher
            .fetch_one(&source, "repositories/ws", &query, 3, Some(25))
            .await
            .unwrap();

        assert!(first.has_next);
        assert_eq!(third.records[0]["id"], 10);

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls[0].0, None);
        assert!(!calls[0].1.contains_key("pagelen"));
        assert_eq!(calls[1].0, Some(3));
        assert_eq!(calls[1].1.get("pagelen"), Some("25"));
    }
}
