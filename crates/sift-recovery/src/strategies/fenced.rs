use super::extract::extract_and_parse;
use super::{sanitize, Document, RecoveryStrategy};
use crate::error::StrategyError;

const FENCE: &str = "```";

/// Brace-match inside a fenced code block
///
/// Tries every fenced block in order; an unclosed final fence runs to the end
/// of the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fenced;

impl RecoveryStrategy for Fenced {
    fn name(&self) -> &'static str {
        "fenced"
    }

    fn attempt(&self, raw: &str) -> Result<Document, StrategyError> {
        let mut last_err = StrategyError::NoFence;
        for block in fenced_blocks(raw) {
            match extract_and_parse(&sanitize(block)) {
                Ok(doc) => return Ok(doc),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }
}

/// Interiors of fenced code blocks, language tag line excluded
#[must_use]
pub fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_fence = &rest[open + FENCE.len()..];
        // The opening fence line may carry a language tag.
        let body_start = after_fence.find('\n').map_or(after_fence.len(), |nl| nl + 1);
        let body = &after_fence[body_start..];

        match body.find(FENCE) {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + FENCE.len()..];
            }
            None => {
                blocks.push(body);
                break;
            }
        }
    }

    blocks
}
