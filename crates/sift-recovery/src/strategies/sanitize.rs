//! Control-character sanitizer
//!
//! Models routinely emit literal newlines, tabs, smart quotes and stray
//! backslashes inside string values. A single left-to-right scan tracks
//! string-literal state and rewrites those only inside value strings.
//!
//! Keys are told apart from values by nearby punctuation: a quote opens a key
//! when the previous significant character outside strings is `{` or `,` and
//! the innermost open container is an object. This is best-effort and can
//! misclassify on adversarial input.

use super::{parse_object, Document, RecoveryStrategy};
use crate::error::StrategyError;
use std::fmt::Write as _;

/// Sanitize, then parse
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitize;

impl RecoveryStrategy for Sanitize {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn attempt(&self, raw: &str) -> Result<Document, StrategyError> {
        parse_object(&sanitize(raw))
    }
}

/// Escape control characters, drop smart quotes and neutralize invalid
/// escapes inside value strings
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 16);
    let mut containers: Vec<char> = Vec::new();
    let mut prev_significant: Option<char> = None;
    let mut in_string = false;
    let mut in_key = false;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if !in_string {
            match ch {
                '"' => {
                    in_key = matches!(prev_significant, Some('{' | ','))
                        && containers.last() == Some(&'{');
                    in_string = true;
                }
                '{' | '[' => containers.push(ch),
                '}' | ']' => {
                    containers.pop();
                }
                _ => {}
            }
            if !ch.is_whitespace() {
                prev_significant = Some(ch);
            }
            out.push(ch);
            continue;
        }

        match ch {
            '"' => {
                in_string = false;
                prev_significant = Some('"');
                out.push(ch);
            }
            '\\' => match chars.peek().copied() {
                Some(next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                Some('u') if is_unicode_escape(chars.clone()) => out.push('\\'),
                _ if in_key => out.push('\\'),
                _ => out.push_str("\\\\"),
            },
            c if in_key => out.push(c),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' => {}
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }

    out
}

/// `chars` is positioned at the `u` of a `\u` escape
fn is_unicode_escape(chars: impl Iterator<Item = char>) -> bool {
    let digits: Vec<char> = chars.skip(1).take(4).collect();
    digits.len() == 4 && digits.iter().all(char::is_ascii_hexdigit)
}
