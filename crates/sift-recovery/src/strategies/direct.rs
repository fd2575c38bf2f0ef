use super::{parse_object, Document, RecoveryStrategy};
use crate::error::StrategyError;

/// Parse the raw text as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl RecoveryStrategy for Direct {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn attempt(&self, raw: &str) -> Result<Document, StrategyError> {
        parse_object(raw)
    }
}
