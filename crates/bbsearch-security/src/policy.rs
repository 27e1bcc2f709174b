use serde::{Deserialize, Serialize};

/// How aggressively text is masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionPolicy {
    /// Structured key-value and known-format matchers only.
    Restricted,
    /// Restricted plus the generic opaque-token catch-alls.
    Full,
}

const FULL_EXTENSIONS: &[&str] = &[".yaml", ".yml"];

/// Pick the policy for text originating from `path`.
///
/// YAML configuration gets full masking; anything else would lose too many
/// legitimate identifiers to the catch-all matchers.
pub fn classify(path: &str) -> RedactionPolicy {
    let lower = path.to_ascii_lowercase();
    if FULL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        RedactionPolicy::Full
    } else {
        RedactionPolicy::Restricted
    }
}
