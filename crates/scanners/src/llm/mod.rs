//! The slow pass: contextual re-analysis through an LLM-backed agent.

pub mod analyzer;
pub mod mock;
pub mod provider;
pub mod schemas;

#[cfg(feature = "llm")]
pub mod openai;

pub use analyzer::{
    AnalyzeOutcome, AnalyzeRequest, AnalyzerError, BatchSink, CancelToken, LlmAnalyzer,
    NoopAnalyzer, SlowPassAnalyzer,
};
pub use mock::MockAnalyzer;
pub use provider::{LLMError, LLMProvider, LLMRequest, LLMResponse};

#[cfg(feature = "llm")]
pub use openai::OpenAIProvider;
