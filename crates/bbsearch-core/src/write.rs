//! Outcome of state-changing requests

use serde::{Deserialize, Serialize};

/// Raw status and body of a remote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of a write request. The body is kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    Created { status: u16, body: String },
    Rejected { status: u16, body: String },
}

impl WriteOutcome {
    pub const CREATED: u16 = 201;

    /// Only `201 Created` counts as success.
    pub fn from_response(response: RemoteResponse) -> Self {
        if response.status == Self::CREATED {
            WriteOutcome::Created {
                status: response.status,
                body: response.body,
            }
        } else {
            WriteOutcome::Rejected {
                status: response.status,
                body: response.body,
            }
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, WriteOutcome::Created { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            WriteOutcome::Created { status, .. } | WriteOutcome::Rejected { status, .. } => *status,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            WriteOutcome::Created { body, .. } | WriteOutcome::Rejected { body, .. } => body,
        }
    }
}
