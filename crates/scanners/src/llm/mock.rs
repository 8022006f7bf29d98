//! Scripted analyzer for orchestrator tests.

use crate::llm::analyzer::{
    AnalyzeOutcome, AnalyzeRequest, AnalyzerError, BatchSink, CancelToken, SlowPassAnalyzer,
};
use crate::core::RawFinding;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

enum Mode {
    Complete,
    Fail(String),
    /// Deliver batches, then hang until cancelled.
    HangAfterBatches,
}

pub struct MockAnalyzer {
    batches: Vec<Vec<RawFinding>>,
    summary: Option<String>,
    false_positive_lines: Vec<u64>,
    mode: Mode,
    available: bool,
    call_count: AtomicUsize,
    cancel_observed: AtomicBool,
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            summary: None,
            false_positive_lines: Vec::new(),
            mode: Mode::Complete,
            available: true,
            call_count: AtomicUsize::new(0),
            cancel_observed: AtomicBool::new(false),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fail(message.into()),
            ..Self::new()
        }
    }

    pub fn hanging() -> Self {
        Self {
            mode: Mode::HangAfterBatches,
            ..Self::new()
        }
    }

    pub fn with_batch(mut self, findings: Vec<RawFinding>) -> Self {
        self.batches.push(findings);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_false_positive_lines(mut self, lines: Vec<u64>) -> Self {
        self.false_positive_lines = lines;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn cancel_observed(&self) -> bool {
        self.cancel_observed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlowPassAnalyzer for MockAnalyzer {
    fn available(&self) -> bool {
        self.available
    }

    async fn analyze(
        &self,
        _request: AnalyzeRequest,
        sink: &dyn BatchSink,
        cancel: &CancelToken,
    ) -> Result<AnalyzeOutcome, AnalyzerError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Mode::Fail(message) = &self.mode {
            return Err(AnalyzerError::Failed(message.clone()));
        }

        for batch in &self.batches {
            sink.on_batch(batch.clone());
            tokio::task::yield_now().await;
        }

        if matches!(self.mode, Mode::HangAfterBatches) {
            cancel.cancelled().await;
            self.cancel_observed.store(true, Ordering::SeqCst);
            return Err(AnalyzerError::Cancelled);
        }

        Ok(AnalyzeOutcome {
            findings: self.batches.iter().flatten().cloned().collect(),
            summary: self.summary.clone(),
            false_positive_lines: self.false_positive_lines.clone(),
        })
    }
}
