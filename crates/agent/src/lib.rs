//! Agent runtime: drives a sales-qualification conversation through the
//! stage graph defined in `leadflow-core`.
//!
//! # Architecture
//!
//! Each run is a constrained loop:
//! 1. **Stage execution** (`stages`) - one handler per stage mutates the
//!    conversation state, calling the inference service where needed
//! 2. **Transition** - the resulting event is fed through the explicit flow
//!    table; every transition is audited
//! 3. **Termination** - a closing stage or the step cap ends the run
//!
//! # Key Types
//!
//! - `QualificationEngine` - the orchestrator (see `runtime`)
//! - `LlmClient` - pluggable inference trait; `HttpLlmClient` speaks
//!   OpenAI/Anthropic/Ollama, `ScriptedLlmClient` replays canned replies
//!
//! # Safety Principle
//!
//! The model only extracts, scores and phrases. Routing, decisions, links and
//! closing messages are deterministic and never depend on free-form output.

pub mod extraction;
pub mod http;
pub mod llm;
pub mod runtime;
pub mod stages;

pub use http::HttpLlmClient;
pub use llm::{LlmClient, PromptMessage, PromptRole, ScriptedLlmClient};
pub use runtime::{ConversationOutcome, EngineError, QualificationEngine};
