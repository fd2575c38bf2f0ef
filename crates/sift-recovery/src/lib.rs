//! Sift Recovery
//!
//! The trusted boundary between an unreliable text-generation response and
//! validated structured data.
//!
//! # Pipeline
//!
//! ```text
//! raw text → direct → sanitize → extract → fenced → truncation repair → normalize → AnalysisResult
//!                       (first success wins)                              ↓ all failed
//!                                                                    ParseFailure + TruncationVerdict
//! ```
//!
//! # Example
//!
//! ```rust
//! use sift_recovery::RecoveryParser;
//!
//! let parser = RecoveryParser::new();
//! let raw = "Here is my review:\n```json\n{\"issues\": [{\"title\": \"x\", \"line\": 0},]}\n```";
//! let result = parser.parse(raw).unwrap();
//!
//! assert_eq!(result.issues.len(), 1);
//! assert_eq!(result.issues[0].line, None);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod strategies;
pub mod truncation;

// Re-exports for convenience
pub use error::{ParseFailure, StrategyError};
pub use model::{AnalysisResult, Issue, Metrics, Severity};
pub use parser::{Recovered, RecoveryParser};
pub use strategies::{Document, RecoveryStrategy};
pub use truncation::{assess, looks_truncated, TruncationSignal, TruncationVerdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the recovery parser
    pub use crate::error::{ParseFailure, StrategyError};
    pub use crate::model::{AnalysisResult, Issue, Severity};
    pub use crate::parser::RecoveryParser;
    pub use crate::strategies::RecoveryStrategy;
    pub use crate::truncation::looks_truncated;
}
