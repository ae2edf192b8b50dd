//! Data model shared by every rule catalog

pub mod document;
pub mod source;
pub mod types;

pub use document::{ElementExt, MarkupDocument};
pub use source::{SourceFile, SourceKind, SourceSpan};
pub use types::{FeedbackBucket, Finding, Location, Pass, RuleResult, Severity, Target};
