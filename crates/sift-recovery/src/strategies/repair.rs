//! Truncation repair
//!
//! Closes whatever a cut-off response left open. When the naive closure does
//! not parse (the cut landed inside a key, a number or after a colon) the
//! candidate is shortened to the previous structural boundary and closed
//! again.

use super::extract::fix_separators;
use super::{parse_object, sanitize, Document, RecoveryStrategy};
use crate::error::StrategyError;

/// Default bound on cut-back iterations
pub const DEFAULT_MAX_CUTBACKS: usize = 64;

/// Append missing closers, cutting back to a boundary when needed
#[derive(Debug, Clone, Copy)]
pub struct TruncationRepair {
    max_cutbacks: usize,
}

impl TruncationRepair {
    /// Create with a custom cut-back bound
    #[inline]
    #[must_use]
    pub fn new(max_cutbacks: usize) -> Self {
        Self { max_cutbacks }
    }
}

impl Default for TruncationRepair {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CUTBACKS)
    }
}

impl RecoveryStrategy for TruncationRepair {
    fn name(&self) -> &'static str {
        "truncation_repair"
    }

    fn attempt(&self, raw: &str) -> Result<Document, StrategyError> {
        repair_truncated(&sanitize(raw), self.max_cutbacks)
    }
}

/// Repair a truncated object starting at the first `{`
pub fn repair_truncated(text: &str, max_cutbacks: usize) -> Result<Document, StrategyError> {
    let start = text.find('{').ok_or(StrategyError::NoObject)?;
    let mut candidate = &text[start..];
    let mut structure = Structure::scan(candidate);
    if structure.open.is_empty() && !structure.in_string {
        return Err(StrategyError::NotTruncated);
    }

    for _ in 0..=max_cutbacks {
        let closed = structure.close(candidate);
        if let Ok(doc) = parse_object(&closed) {
            return Ok(doc);
        }

        match structure.cut_points.iter().rev().find(|&&cut| cut < candidate.len()) {
            Some(&cut) => {
                candidate = &candidate[..cut];
                structure = Structure::scan(candidate);
            }
            None => break,
        }
    }

    Err(StrategyError::RepairExhausted(max_cutbacks))
}

/// Bracket state at the end of a candidate
#[derive(Debug, Default)]
struct Structure {
    /// Unclosed `{` / `[` in opening order
    open: Vec<char>,
    in_string: bool,
    /// Pending backslash at the very end
    escaped: bool,
    /// Offsets where a shorter candidate may end: before each comma and
    /// right after each opener
    cut_points: Vec<usize>,
}

impl Structure {
    fn scan(text: &str) -> Self {
        let mut s = Self::default();

        for (idx, ch) in text.char_indices() {
            if s.in_string {
                if s.escaped {
                    s.escaped = false;
                } else if ch == '\\' {
                    s.escaped = true;
                } else if ch == '"' {
                    s.in_string = false;
                }
                continue;
            }

            match ch {
                '"' => s.in_string = true,
                '{' | '[' => {
                    s.open.push(ch);
                    s.cut_points.push(idx + 1);
                }
                '}' | ']' => {
                    s.open.pop();
                }
                ',' => s.cut_points.push(idx),
                _ => {}
            }
        }

        s
    }

    fn close(&self, text: &str) -> String {
        let mut out = if self.in_string {
            let mut body = text.to_string();
            if self.escaped {
                body.pop();
            }
            body.push('"');
            body
        } else {
            text.trim_end().to_string()
        };

        while out.trim_end().ends_with(',') {
            let keep = out.trim_end().len() - 1;
            out.truncate(keep);
        }

        for opener in self.open.iter().rev() {
            out.push(if *opener == '{' { '}' } else { ']' });
        }

        fix_separators(&out)
    }
}
