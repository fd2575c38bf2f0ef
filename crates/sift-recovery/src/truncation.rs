//! Truncation heuristics
//!
//! Classifies a raw response as "likely truncated" versus "malformed but
//! complete". The verdict only shapes diagnostics; it never stops the parser
//! from attempting repair.

/// Responses shorter than this are checked for a dangling tail
pub const SHORT_RESPONSE_CHARS: usize = 1000;

/// Size of the tail window inspected for a dangling key or value
pub const TAIL_WINDOW_CHARS: usize = 50;

const FENCE: &str = "```";

/// Individual truncation signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncationSignal {
    /// Starts with a code fence that is never closed
    UnclosedFence,
    /// More `{` than `}`
    UnbalancedBraces,
    /// Short response ending inside a key or value
    DanglingTail,
}

/// Result of [`assess`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TruncationVerdict {
    /// Signals that fired
    pub signals: Vec<TruncationSignal>,
}

impl TruncationVerdict {
    /// Whether any signal fired
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        !self.signals.is_empty()
    }

    /// Whether a specific signal fired
    #[inline]
    #[must_use]
    pub fn has(&self, signal: TruncationSignal) -> bool {
        self.signals.contains(&signal)
    }
}

/// Whether the raw text looks like a cut-off response
#[inline]
#[must_use]
pub fn looks_truncated(raw: &str) -> bool {
    assess(raw).is_truncated()
}

/// Run every truncation heuristic and report which fired
#[must_use]
pub fn assess(raw: &str) -> TruncationVerdict {
    let mut signals = Vec::new();

    if raw.trim_start().starts_with(FENCE) && raw.matches(FENCE).count() < 2 {
        signals.push(TruncationSignal::UnclosedFence);
    }

    if raw.matches('{').count() > raw.matches('}').count() {
        signals.push(TruncationSignal::UnbalancedBraces);
    }

    if raw.chars().count() < SHORT_RESPONSE_CHARS && has_dangling_tail(raw) {
        signals.push(TruncationSignal::DanglingTail);
    }

    TruncationVerdict { signals }
}

fn has_dangling_tail(raw: &str) -> bool {
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    let tail: String = {
        let chars: Vec<char> = trimmed.chars().collect();
        let start = chars.len().saturating_sub(TAIL_WINDOW_CHARS);
        chars[start..].iter().collect()
    };

    if tail.ends_with(':') || tail.ends_with(',') {
        return true;
    }

    has_open_quote(trimmed)
}

/// Odd number of unescaped quotes
fn has_open_quote(text: &str) -> bool {
    let mut open = false;
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if open => escaped = true,
            '"' => open = !open,
            _ => {}
        }
    }
    open
}
