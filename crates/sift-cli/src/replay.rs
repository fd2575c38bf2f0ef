//! Replays recorded analyzer responses
//!
//! Responses live next to each other under one directory, mirroring the
//! scanned tree: the response for `src/lib.rs` is `<responses>/src/lib.rs.txt`.

use async_trait::async_trait;
use sift_core::{Analyzer, AnalyzerError, FileTask};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Path of the recorded response for a file
pub(crate) fn response_path(responses: &Path, file: &FileTask) -> PathBuf {
    responses.join(format!("{}.txt", file.path))
}

/// Analyzer answering from recorded responses, keyed by file path
///
/// Files with identical content still get their own recording.
#[derive(Debug, Default)]
pub(crate) struct ReplayAnalyzer {
    responses: HashMap<String, String>,
}

impl ReplayAnalyzer {
    /// Load the recording of every file that has one
    pub(crate) async fn load(responses: &Path, files: &[FileTask]) -> Self {
        let mut map = HashMap::with_capacity(files.len());

        for file in files {
            let path = response_path(responses, file);
            match tokio::fs::read_to_string(&path).await {
                Ok(response) => {
                    map.insert(file.path.clone(), response);
                }
                Err(e) => {
                    warn!(path = %file.path, response = %path.display(), error = %e, "no recorded response");
                }
            }
        }

        Self { responses: map }
    }

    /// Number of recorded responses
    pub(crate) fn len(&self) -> usize {
        self.responses.len()
    }
}

#[async_trait]
impl Analyzer for ReplayAnalyzer {
    async fn analyze(&self, content: &str, language_hint: &str) -> Result<String, AnalyzerError> {
        Err(AnalyzerError::new(format!(
            "no recorded response: replay needs the file path ({language_hint}, {} bytes)",
            content.len()
        )))
    }

    async fn analyze_file(
        &self,
        file: &FileTask,
        _content: &str,
        language_hint: &str,
    ) -> Result<String, AnalyzerError> {
        self.responses
            .get(&file.path)
            .cloned()
            .ok_or_else(|| AnalyzerError::new(format!("no recorded response for {} ({language_hint})", file.path)))
    }
}
