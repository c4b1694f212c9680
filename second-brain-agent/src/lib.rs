//! Second brain agent: LLM providers, conversation memory, PII guardrails,
//! the thought agent and its evaluation harness.

pub mod agent;
pub mod eval;
pub mod guardrails;
pub mod memory;
pub mod prompt;
pub mod providers;

pub use agent::{AgentError, ThoughtAgent};
pub use eval::{
    Case, Dataset, EvalTarget, EvaluationReport, EvaluationResult, Judge, RetrievalTarget, Verdict,
};
pub use guardrails::{PiiEntity, PiiGuard, PiiKind, PiiReport, REDACTED};
pub use memory::{MemoryEntry, MemoryError, MemoryManager, NO_MEMORY_YET};
pub use providers::{Provider, ProviderError, ProviderResponse, ProviderUsage, build_provider};
