//! Code search match model
//!
//! Mirrors the `code_search_result` records of the Bitbucket search API.
//! Only the fields the redaction pass needs are typed; everything else is
//! carried through `extra` so a record serializes back to what the remote sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_match_count: Option<u64>,
    #[serde(default)]
    pub content_matches: Vec<ContentMatch>,
    #[serde(default)]
    pub path_matches: Vec<Segment>,
    pub file: SearchFile,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFile {
    #[serde(default)]
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMatch {
    #[serde(default)]
    pub lines: Vec<MatchLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// Unit of redaction: a run of literal text, optionally flagged as the hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub is_match: Option<bool>,
}

impl SearchFile {
    /// `links.self.href` of the matched file.
    pub fn link(&self) -> Option<&str> {
        self.extra
            .get("links")
            .and_then(|links| links.get("self"))
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
    }
}

impl SearchMatch {
    /// Every content segment, for in-place rewriting.
    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.content_matches
            .iter_mut()
            .flat_map(|m| m.lines.iter_mut())
            .flat_map(|l| l.segments.iter_mut())
    }
}
