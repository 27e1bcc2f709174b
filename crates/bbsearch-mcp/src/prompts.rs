//! Prompt catalogue

use serde_json::{json, Value};

pub const CODE_SEARCH_PROMPT: &str = "bitbucket_code_search_prompt";

/// Query syntax accepted by the Bitbucket code search endpoint.
pub const SEARCH_SYNTAX: &str = "\
Bitbucket code search query syntax:

- A query needs at least one search term.
- Operators must be written in upper case: AND, OR, NOT, - (exclude) and ( ) for grouping.
- Several terms without an operator are combined with AND, so `bitbucket server` means `bitbucket AND server`.
- Wildcards (`qu?ck`, `buil*`) and regular expressions are not supported.
- Single-character terms are not indexed and are ignored: `foo a bar` searches for `foo bar`.
- Matching is case-insensitive; only the operators are case-sensitive.
- A query may contain at most 9 expressions (terms and operators combined).
- Restrict to a language with `lang:<name>`, e.g. `my_function lang:python`.
- Restrict to a repository with `repo:<slug>` and to a project with `project:<key>`, e.g. `my_function project:my_project`.
- Restrict by file with `path:<dir>` or `ext:<extension>`.
";

pub fn list_prompts() -> Value {
    json!({
        "prompts": [{
            "name": CODE_SEARCH_PROMPT,
            "description": "Syntax rules for Bitbucket code search queries"
        }]
    })
}

pub fn get_prompt(params: &Value) -> anyhow::Result<Value> {
    let name = params["name"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing prompt name"))?;

    match name {
        CODE_SEARCH_PROMPT => Ok(json!({
            "description": "Syntax rules for Bitbucket code search queries",
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": SEARCH_SYNTAX }
            }]
        })),
        _ => anyhow::bail!("Unknown prompt: {}", name),
    }
}
