use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::conversation::ConversationId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Ingress,
    Flow,
    Inference,
    Scoring,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub conversation_id: Option<ConversationId>,
    pub tenant_id: Option<TenantId>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        conversation_id: Option<ConversationId>,
        tenant_id: Option<TenantId>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { conversation_id, tenant_id, correlation_id: correlation_id.into(), actor: actor.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub conversation_id: Option<ConversationId>,
    pub tenant_id: Option<TenantId>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        context: &AuditContext,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            conversation_id: context.conversation_id.clone(),
            tenant_id: context.tenant_id.clone(),
            correlation_id: context.correlation_id.clone(),
            event_type: event_type.into(),
            category,
            actor: context.actor.clone(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Records a qualification score movement produced by `stage`.
    pub fn score_changed(context: &AuditContext, stage: &str, from: u8, to: u8) -> Self {
        Self::new(context, "score.changed", AuditCategory::Scoring, AuditOutcome::Success)
            .with_metadata("stage", stage)
            .with_metadata("from", from.to_string())
            .with_metadata("to", to.to_string())
            .with_metadata("delta", (i16::from(to) - i16::from(from)).to_string())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Drops every event. Used when the caller does not ask for an audit trail.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
