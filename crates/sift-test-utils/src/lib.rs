//! Testing utilities for Sift workspace
//!
//! Scripted analyzers, in-memory fetchers, file-list builders and a wired-up
//! scan harness.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use sift_core::{
    Analyzer, AnalyzerError, ContentFetcher, FetchError, FileTask, InMemoryIssueSink,
    InMemoryTaskStore, JobId, ScanConfig, ScanJob, ScanOrchestrator,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A barrier that holds analyzer calls until opened
#[derive(Debug, Default)]
pub struct Gate {
    open: AtomicBool,
    waiting: AtomicUsize,
    notify: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until the gate opens
    pub async fn pass(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        loop {
            let notified = self.notify.notified();
            if self.open.load(Ordering::SeqCst) {
                break;
            }
            notified.await;
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Calls currently held at the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// What a scripted analyzer does for one content
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(String),
    Fail(String),
    Gated(Arc<Gate>, Box<Reply>),
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn respond(raw: impl Into<String>) -> Self {
        Self::Respond(raw.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    pub fn gated(gate: &Arc<Gate>, then: Reply) -> Self {
        Self::Gated(Arc::clone(gate), Box::new(then))
    }

    pub fn delayed(delay: Duration, then: Reply) -> Self {
        Self::Delayed(delay, Box::new(then))
    }
}

/// Analyzer answering from a script keyed by file content
#[derive(Debug)]
pub struct ScriptedAnalyzer {
    default: Reply,
    scripts: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new(default: Reply) -> Self {
        Self {
            default,
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every call succeeds with `raw`
    pub fn always(raw: impl Into<String>) -> Self {
        Self::new(Reply::respond(raw))
    }

    #[must_use]
    pub fn with_script(mut self, content: impl Into<String>, reply: Reply) -> Self {
        self.scripts.insert(content.into(), reply);
        self
    }

    /// Contents analyzed, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of concurrent calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, content: &str, _language_hint: &str) -> Result<String, AnalyzerError> {
        self.calls.lock().push(content.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let mut reply = self.scripts.get(content).unwrap_or(&self.default);
        let result = loop {
            match reply {
                Reply::Respond(raw) => break Ok(raw.clone()),
                Reply::Fail(message) => break Err(AnalyzerError::new(message.clone())),
                Reply::Gated(gate, next) => {
                    gate.pass().await;
                    reply = next;
                }
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(*delay).await;
                    reply = next;
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Fetcher backed by a map from locator to content
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    contents: HashMap<String, String>,
    fetched: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each file's content is its own path
    pub fn echoing(files: &[FileTask]) -> Self {
        let contents = files
            .iter()
            .map(|f| (f.remote_locator.clone(), f.path.clone()))
            .collect();
        Self {
            contents,
            fetched: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_file(mut self, locator: impl Into<String>, content: impl Into<String>) -> Self {
        self.contents.insert(locator.into(), content.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for MemoryFetcher {
    async fn fetch(&self, file: &FileTask) -> Result<String, FetchError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        self.contents
            .get(&file.remote_locator)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(file.remote_locator.clone()))
    }
}

pub fn file(path: &str) -> FileTask {
    FileTask::new(path, format!("mem://{path}"))
}

/// `src/file_00.rs`, `src/file_01.rs`, ...
pub fn files(n: usize) -> Vec<FileTask> {
    files_with_prefix("src/file", n)
}

pub fn files_with_prefix(prefix: &str, n: usize) -> Vec<FileTask> {
    (0..n).map(|i| file(&format!("{prefix}_{i:02}.rs"))).collect()
}

/// Well-formed analyzer response with `n` issues
pub fn issues_response(n: usize) -> String {
    let issues: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "type": "bug",
                "severity": "medium",
                "title": format!("Issue {i}"),
                "line": i + 1,
            })
        })
        .collect();
    json!({ "issues": issues, "summary": format!("{n} findings") }).to_string()
}

/// Orchestrator wired to in-memory stores
pub struct TestScan {
    pub orchestrator: ScanOrchestrator,
    pub store: Arc<InMemoryTaskStore>,
    pub sink: Arc<InMemoryIssueSink>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub fetcher: Arc<MemoryFetcher>,
}

impl TestScan {
    /// No inter-file delay, default breaker
    pub fn new(analyzer: ScriptedAnalyzer, fetcher: MemoryFetcher, concurrency: usize) -> Self {
        Self::with_config(
            analyzer,
            fetcher,
            ScanConfig::default()
                .with_concurrency(concurrency)
                .with_inter_file_delay_ms(0),
        )
    }

    pub fn with_config(analyzer: ScriptedAnalyzer, fetcher: MemoryFetcher, config: ScanConfig) -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let sink = Arc::new(InMemoryIssueSink::new());
        let analyzer = Arc::new(analyzer);
        let fetcher = Arc::new(fetcher);
        let orchestrator = ScanOrchestrator::new(
            analyzer.clone(),
            fetcher.clone(),
            store.clone(),
            sink.clone(),
        )
        .with_config(config);

        Self {
            orchestrator,
            store,
            sink,
            analyzer,
            fetcher,
        }
    }

    /// Poll the store until `pred` holds; panics after five seconds
    pub async fn wait_for(&self, job_id: JobId, pred: impl Fn(&ScanJob) -> bool) -> ScanJob {
        wait_until(|| self.store.snapshot(job_id).filter(|job| pred(job))).await
    }
}

/// Poll until `check` yields a value; panics after five seconds
pub async fn wait_until<T>(mut check: impl FnMut() -> Option<T>) -> T {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(value) = check() {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    polled.expect("condition not reached within 5s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders() {
        let list = files(3);
        assert_eq!(list[2].path, "src/file_02.rs");
        assert_eq!(list[2].remote_locator, "mem://src/file_02.rs");
        assert!(issues_response(2).contains("Issue 1"));
    }

    #[tokio::test]
    async fn gate_releases_waiters() {
        let gate = Gate::new();
        let analyzer = Arc::new(ScriptedAnalyzer::new(Reply::gated(&gate, Reply::respond("{}"))));

        let task = {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.analyze("x", "text").await })
        };
        wait_until(|| (gate.waiting() == 1).then_some(())).await;
        gate.open();

        assert_eq!(task.await.unwrap().unwrap(), "{}");
        assert_eq!(analyzer.call_count(), 1);
    }

    #[tokio::test]
    async fn echoing_fetcher() {
        let list = files(1);
        let fetcher = MemoryFetcher::echoing(&list);
        assert_eq!(fetcher.fetch(&list[0]).await.unwrap(), "src/file_00.rs");
        assert!(fetcher.fetch(&file("other.rs")).await.is_err());
    }
}
