//! Local filesystem lister and fetcher

use crate::error::FetchError;
use crate::ports::{ContentFetcher, FileLister};
use crate::types::FileTask;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules", ".venv", "__pycache__", "dist", "build"];

/// Recursively lists files under a root
///
/// Paths are root-relative with `/` separators; the locator is the
/// absolute path on disk.
#[derive(Debug, Clone)]
pub struct LocalFileLister {
    root: PathBuf,
    extensions: Vec<String>,
    max_file_bytes: Option<u64>,
}

impl LocalFileLister {
    /// Create lister for a root directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: Vec::new(),
            max_file_bytes: None,
        }
    }

    /// Only list files with these extensions (without the dot)
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(|e| e.into().to_ascii_lowercase()).collect();
        self
    }

    /// Skip files larger than this
    #[inline]
    #[must_use]
    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = Some(bytes);
        self
    }

    fn accepts(&self, path: &Path, len: u64) -> bool {
        if self.max_file_bytes.is_some_and(|max| len > max) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn io_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl FileLister for LocalFileLister {
    async fn list(&self) -> Result<Vec<FileTask>, FetchError> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| io_error(&dir, e))?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let path = entry.path();
                let meta = entry.metadata().await.map_err(|e| io_error(&path, e))?;

                if meta.is_dir() {
                    let name = entry.file_name();
                    if !SKIPPED_DIRS.iter().any(|s| name == **s) {
                        pending.push(path);
                    }
                } else if meta.is_file() && self.accepts(&path, meta.len()) {
                    files.push(FileTask::new(self.relative(&path), path.display().to_string()));
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), count = files.len(), "listed files");
        Ok(files)
    }
}

/// Reads the locator as a local path
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

#[async_trait]
impl ContentFetcher for LocalFetcher {
    async fn fetch(&self, file: &FileTask) -> Result<String, FetchError> {
        let path = Path::new(&file.remote_locator);
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(file.remote_locator.clone()))
            }
            Err(e) => Err(io_error(path, e)),
        }
    }
}
