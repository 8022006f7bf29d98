//! Call contract for the external re-analysis collaborator.
//!
//! The analyzer is an opaque, resource-heavy agent: absence, failure and
//! hangs are all expected states. The contract therefore carries a batch
//! sink for incremental results and a cancellation token the caller
//! triggers once it has captured what it needs; the collaborator is
//! expected to observe the token and unwind instead of retrying forever.

use crate::core::RawFinding;
use crate::llm::provider::LLMProvider;
use crate::llm::schemas::AnalyzerResponse;
use crate::normalize::LogFormat;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),

    #[error("analyzer failed: {0}")]
    Failed(String),

    #[error("analyzer call cancelled")]
    Cancelled,
}

/// Input handed to the analyzer: the fast pass output is its context.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub source_path: String,
    pub total_lines: u64,
    pub detected_format: LogFormat,
    pub fast_findings: Vec<RawFinding>,
}

#[derive(Debug, Default)]
pub struct AnalyzeOutcome {
    pub findings: Vec<RawFinding>,
    pub summary: Option<String>,
    pub false_positive_lines: Vec<u64>,
}

/// Receives incremental finding batches while the parent call is still
/// running.
pub trait BatchSink: Send + Sync {
    fn on_batch(&self, findings: Vec<RawFinding>);
}

/// Cooperative cancellation signal: "the result is already available,
/// stop the underlying call".
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before the re-check: notify_waiters only wakes
            // already-registered waiters.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
pub trait SlowPassAnalyzer: Send + Sync {
    /// Whether the collaborator can be invoked at all (credentials,
    /// endpoint reachability). A false here is a normal degraded state.
    fn available(&self) -> bool {
        true
    }

    async fn analyze(
        &self,
        request: AnalyzeRequest,
        sink: &dyn BatchSink,
        cancel: &CancelToken,
    ) -> Result<AnalyzeOutcome, AnalyzerError>;
}

/// Stand-in used when no analyzer is configured; always unavailable, so
/// jobs complete in fast-pass-only mode.
pub struct NoopAnalyzer;

#[async_trait]
impl SlowPassAnalyzer for NoopAnalyzer {
    fn available(&self) -> bool {
        false
    }

    async fn analyze(
        &self,
        _request: AnalyzeRequest,
        _sink: &dyn BatchSink,
        _cancel: &CancelToken,
    ) -> Result<AnalyzeOutcome, AnalyzerError> {
        Err(AnalyzerError::Unavailable("no analyzer configured".to_string()))
    }
}

/// Provider-backed analyzer: one completion call, results pushed to the
/// sink as a single batch.
pub struct LlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    /// Fast findings included in the prompt are capped to keep the
    /// request inside the model context window.
    max_context_findings: usize,
}

impl LlmAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            max_context_findings: 50,
        }
    }

    fn build_request(&self, request: &AnalyzeRequest) -> crate::llm::provider::LLMRequest {
        let system_prompt = "\
You are a security analyst re-examining server log findings produced by a \
pattern-based scanner. Confirm real attacks, add findings the patterns \
missed, and flag false positives. Respond with a single JSON object: \
{\"findings\": [{\"severity\": \"CRITICAL|HIGH|MEDIUM|LOW|INFO\", \
\"category\": \"SQL_INJECTION|COMMAND_INJECTION|XSS|PATH_TRAVERSAL|\
BRUTE_FORCE|ENUMERATION|SUSPICIOUS_STATUS|MALICIOUS_AGENT|\
PRIVILEGE_ESCALATION|EXFILTRATION|RATE_ANOMALY|OTHER\", \
\"title\": \"...\", \"description\": \"...\", \"line_number\": 123, \
\"recommendation\": \"...\", \"confidence\": 0.0}], \
\"summary\": \"...\", \"false_positive_line_numbers\": [1, 2]}"
            .to_string();

        let context: Vec<_> = request
            .fast_findings
            .iter()
            .take(self.max_context_findings)
            .collect();
        let user_prompt = format!(
            "Source: {} ({} lines, {} format)\nPattern-scan findings:\n{}",
            request.source_path,
            request.total_lines,
            request.detected_format,
            serde_json::to_string_pretty(&context).unwrap_or_else(|_| "[]".to_string()),
        );

        crate::llm::provider::LLMRequest {
            system_prompt,
            user_prompt,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl SlowPassAnalyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        request: AnalyzeRequest,
        sink: &dyn BatchSink,
        cancel: &CancelToken,
    ) -> Result<AnalyzeOutcome, AnalyzerError> {
        let llm_request = self.build_request(&request);

        let response = tokio::select! {
            result = self.provider.complete(llm_request) => {
                result.map_err(|e| AnalyzerError::Failed(e.to_string()))?
            }
            () = cancel.cancelled() => return Err(AnalyzerError::Cancelled),
        };

        debug!(model = %response.model, "analyzer response received");

        let parsed: AnalyzerResponse = serde_json::from_str(&response.content)
            .map_err(|e| AnalyzerError::Failed(format!("unparseable analyzer response: {e}")))?;

        let findings: Vec<RawFinding> = parsed
            .findings
            .into_iter()
            .map(|f| f.into_raw())
            .collect();

        if !findings.is_empty() {
            sink.on_batch(findings.clone());
        }

        Ok(AnalyzeOutcome {
            findings,
            summary: parsed.summary,
            false_positive_lines: parsed.false_positive_line_numbers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_token_resolves_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });
        token.cancel();
        assert!(handle.await.unwrap());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_set() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
