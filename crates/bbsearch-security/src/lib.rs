//! Credential redaction for text returned by the remote

pub mod policy;
pub mod redactor;

pub use policy::{classify, RedactionPolicy};
pub use redactor::{PatternRedactor, RedactionInfo, MASK};
