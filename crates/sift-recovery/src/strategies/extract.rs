//! Object extraction and separator repair

use super::{parse_object, sanitize, Document, RecoveryStrategy};
use crate::error::StrategyError;
use once_cell::sync::Lazy;
use regex::Regex;

/// `,` directly before a closer
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*[}\]]").expect("valid trailing comma pattern"));

/// Closer directly followed by an opener or a key: `}{`, `][`, `} "k"`
static ADJACENT_STRUCTURES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([}\]])\s*[{\["]"#).expect("valid adjacency pattern"));

/// Scalar value, line break, then a quote: a pair missing its comma
static ADJACENT_PAIRS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("|\d|\btrue|\bfalse|\bnull)[ \t\r]*\n\s*""#).expect("valid pair pattern")
});

/// Sanitize, cut out the first balanced object, fix separators, parse
#[derive(Debug, Clone, Copy, Default)]
pub struct Extract;

impl RecoveryStrategy for Extract {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn attempt(&self, raw: &str) -> Result<Document, StrategyError> {
        extract_and_parse(&sanitize(raw))
    }
}

/// Shared with the fenced strategy
pub(crate) fn extract_and_parse(sanitized: &str) -> Result<Document, StrategyError> {
    let object = balanced_object(sanitized)?;
    parse_object(&fix_separators(object))
}

/// Slice from the first `{` to its matching `}`
///
/// Braces inside string literals are not counted.
pub fn balanced_object(text: &str) -> Result<&str, StrategyError> {
    let start = text.find('{').ok_or(StrategyError::NoObject)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(StrategyError::Unbalanced)
}

/// Remove trailing commas and insert missing ones between adjacent
/// structures, outside string literals only
#[must_use]
pub fn fix_separators(text: &str) -> String {
    let masked = mask_strings(text);
    let mut deletions: Vec<usize> = TRAILING_COMMA.find_iter(&masked).map(|m| m.start()).collect();
    let mut insertions: Vec<usize> = ADJACENT_STRUCTURES
        .captures_iter(&masked)
        .chain(ADJACENT_PAIRS.captures_iter(&masked))
        .filter_map(|caps| caps.get(1).map(|g| g.end()))
        .collect();

    if deletions.is_empty() && insertions.is_empty() {
        return text.to_string();
    }

    deletions.sort_unstable();
    insertions.sort_unstable();
    insertions.dedup();

    let mut out = String::with_capacity(text.len() + insertions.len());
    let mut del = deletions.iter().peekable();
    let mut ins = insertions.iter().peekable();
    for (idx, ch) in text.char_indices() {
        while ins.next_if(|&&pos| pos <= idx).is_some() {
            out.push(',');
        }
        if del.next_if(|&&pos| pos == idx).is_some() {
            continue;
        }
        out.push(ch);
    }
    for _ in ins {
        out.push(',');
    }
    out
}

/// Same byte length as `text`, with string contents replaced by `_`
fn mask_strings(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                masked.push('"');
                continue;
            }
            masked.extend(std::iter::repeat('_').take(ch.len_utf8()));
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        masked.push(ch);
    }

    masked
}
