//! Domain core for the sales-qualification conversation engine.
//!
//! Everything in this crate is deterministic: conversation state, the question
//! banks, scoring, routing policy and the stage state machine. Language
//! understanding lives behind the inference seam in `leadflow-agent`.

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod questions;
pub mod routing;
pub mod scoring;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use domain::conversation::{
    ConversationId, ConversationState, Criterion, CustomerInfo, NextAction, QualificationFlags,
    Speaker, Turn,
};
pub use domain::framework::SalesFramework;
pub use domain::tenant::{TenantConfig, TenantConfigError, TenantId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowEngine, FlowTransitionError, QualificationFlow, Stage, StageEvent};
pub use routing::{QualificationPolicy, RouteLabel};
pub use scoring::{QualificationScorer, ResponseAssessment, ScoringWeights};
