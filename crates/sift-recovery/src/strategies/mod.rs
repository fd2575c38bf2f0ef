//! Recovery strategies
//!
//! Each strategy is one attempt at turning raw text into a JSON object. The
//! [`RecoveryParser`](crate::RecoveryParser) runs them in order and keeps the
//! first success. Built-ins, in priority order:
//! - [`Direct`] - parse as-is
//! - [`Sanitize`] - escape control characters inside values, then parse
//! - [`Extract`] - brace-match the first object and fix separators
//! - [`Fenced`] - same as extract, inside a fenced code block
//! - [`TruncationRepair`] - close what a cut-off response left open

use crate::error::StrategyError;
use serde_json::{Map, Value};

mod direct;
mod extract;
mod fenced;
mod repair;
mod sanitize;

pub use direct::Direct;
pub use extract::{balanced_object, fix_separators, Extract};
pub use fenced::{fenced_blocks, Fenced};
pub use repair::{repair_truncated, TruncationRepair};
pub use sanitize::{sanitize, Sanitize};

/// Parsed top-level JSON object
pub type Document = Map<String, Value>;

/// One ordered attempt at recovering a document from raw text
///
/// Implement this trait to append a repair heuristic to the chain without
/// touching the built-ins.
pub trait RecoveryStrategy: Send + Sync + std::fmt::Debug {
    /// Strategy name (for logging and diagnostics)
    fn name(&self) -> &'static str;

    /// Try to recover a document
    fn attempt(&self, raw: &str) -> Result<Document, StrategyError>;
}

/// Built-in strategies in priority order
#[must_use]
pub fn builtin_strategies() -> Vec<Box<dyn RecoveryStrategy>> {
    vec![
        Box::new(Direct),
        Box::new(Sanitize),
        Box::new(Extract),
        Box::new(Fenced),
        Box::new(TruncationRepair::default()),
    ]
}

/// Parse text that must hold a single JSON object
pub fn parse_object(text: &str) -> Result<Document, StrategyError> {
    match serde_json::from_str::<Value>(text.trim())? {
        Value::Object(map) => Ok(map),
        other => Err(StrategyError::NotAnObject(value_kind(&other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
