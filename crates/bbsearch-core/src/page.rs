//! Page and aggregation models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One bounded batch of records returned by a single remote call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<Value>,
    pub has_next: bool,
}

/// Wire shape of a Bitbucket paged collection.
#[derive(Debug, Deserialize)]
struct PagedEnvelope {
    #[serde(default)]
    values: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

impl Page {
    pub fn new(records: Vec<Value>, has_next: bool) -> Self {
        Self { records, has_next }
    }

    /// Build a page from a Bitbucket envelope (`values` + optional `next` link).
    pub fn from_envelope(body: Value) -> crate::Result<Self> {
        let envelope: PagedEnvelope = serde_json::from_value(body)?;
        Ok(Self {
            records: envelope.values,
            has_next: envelope.next.is_some(),
        })
    }
}

/// Concatenation of every fetched page in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub records: Vec<Value>,
    pub pages_fetched: u32,
    /// Set when the page cap stopped fetching while more pages were available.
    pub truncated: bool,
}

impl AggregatedResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl From<Page> for AggregatedResult {
    fn from(page: Page) -> Self {
        Self {
            records: page.records,
            pages_fetched: 1,
            truncated: false,
        }
    }
}

/// Ordered query parameters. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Adds the pair only when a value is present.
    pub fn with_opt(mut self, key: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Adds one pair per value, keeping their order.
    pub fn with_all<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.push(key, value);
        }
        self
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
