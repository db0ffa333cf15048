use std::sync::Arc;

use leadflow_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink,
};
use leadflow_core::config::EngineConfig;
use leadflow_core::domain::conversation::{
    ConversationId, ConversationState, CustomerInfo, NextAction, Turn,
};
use leadflow_core::domain::framework::SalesFramework;
use leadflow_core::domain::tenant::{TenantConfig, TenantConfigError};
use leadflow_core::errors::{ApplicationError, DomainError};
use leadflow_core::flows::{FlowEngine, FlowTransitionError, QualificationFlow, Stage, StageEvent};
use leadflow_core::routing::QualificationPolicy;
use leadflow_core::scoring::QualificationScorer;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::LlmClient;
use crate::stages::{closing, context, decision, evaluation, framework, objection, question};

const ENGINE_ACTOR: &str = "qualification-engine";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid tenant configuration: {0}")]
    Configuration(#[from] TenantConfigError),
    #[error("inference service failed during {stage}: {source}")]
    Inference {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

impl EngineError {
    /// Stable class name for machine-readable error payloads.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "tenant_config",
            Self::Inference { .. } => "inference",
            Self::Flow(_) => "flow",
        }
    }
}

impl From<EngineError> for ApplicationError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Configuration(error) => DomainError::from(error).into(),
            EngineError::Inference { stage, source } => {
                Self::Inference(format!("{stage}: {source:#}"))
            }
            EngineError::Flow(error) => DomainError::from(error).into(),
        }
    }
}

/// Final snapshot of one conversation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationOutcome {
    pub conversation_id: ConversationId,
    pub turns: Vec<Turn>,
    pub qualification_score: u8,
    pub next_action: Option<NextAction>,
    pub customer_info: CustomerInfo,
    pub framework: Option<SalesFramework>,
    pub needs_identified: Vec<String>,
    pub questions_asked: usize,
    pub steps: u32,
    pub step_limit_reached: bool,
}

impl ConversationOutcome {
    fn from_state(state: ConversationState, steps: u32, step_limit_reached: bool) -> Self {
        Self {
            qualification_score: state.qualification_score(),
            customer_info: state.customer_info(),
            needs_identified: state.needs_identified().to_vec(),
            questions_asked: state.questions_asked().len(),
            turns: state.turns().to_vec(),
            conversation_id: state.conversation_id,
            next_action: state.next_action,
            framework: state.framework,
            steps,
            step_limit_reached,
        }
    }
}

/// Drives one conversation through the qualification flow, stage by stage.
pub struct QualificationEngine {
    llm: Arc<dyn LlmClient>,
    flow: FlowEngine<QualificationFlow>,
    policy: QualificationPolicy,
    scorer: QualificationScorer,
    config: EngineConfig,
    audit_sink: Arc<dyn AuditSink>,
}

impl QualificationEngine {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            flow: FlowEngine::default(),
            policy: QualificationPolicy::default(),
            scorer: QualificationScorer::new(),
            config: EngineConfig::default(),
            audit_sink: Arc::new(NoopAuditSink),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: QualificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scorer(mut self, scorer: QualificationScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = sink;
        self
    }

    pub async fn run_conversation(
        &self,
        initial_message: &str,
        tenant_config: TenantConfig,
    ) -> Result<ConversationOutcome, EngineError> {
        let state = ConversationState::with_initial_message(tenant_config, initial_message);
        self.run(state).await
    }

    /// Runs the flow from its initial stage over an existing state.
    pub async fn run(&self, mut state: ConversationState) -> Result<ConversationOutcome, EngineError> {
        state.tenant_config().validate()?;

        let audit = AuditContext::new(
            Some(state.conversation_id.clone()),
            Some(state.tenant_id.clone()),
            state.conversation_id.0.clone(),
            ENGINE_ACTOR,
        );
        info!(
            event_name = "engine.run.started",
            correlation_id = %state.conversation_id.0,
            tenant_id = %state.tenant_id.0,
            max_steps = self.config.max_steps,
            "conversation run started"
        );
        self.audit_sink.emit(AuditEvent::new(
            &audit,
            "conversation.started",
            AuditCategory::Ingress,
            AuditOutcome::Success,
        ));

        let mut stage = self.flow.initial_state();
        let mut steps: u32 = 0;
        let mut step_limit_reached = false;

        while stage != Stage::Terminal {
            if steps >= self.config.max_steps && !stage.is_closing() {
                warn!(
                    event_name = "engine.step_limit.reached",
                    correlation_id = %state.conversation_id.0,
                    tenant_id = %state.tenant_id.0,
                    stage = stage.as_str(),
                    steps,
                    "step limit reached; closing with follow-up"
                );
                step_limit_reached = true;
                stage = self.transition(stage, StageEvent::StepLimitReached, &audit)?;
                continue;
            }

            steps += 1;
            let score_before = state.qualification_score();
            let event = match self.execute(stage, &mut state).await {
                Ok(event) => event,
                Err(error) => {
                    self.emit_failure(&audit, stage, &error);
                    return Err(error);
                }
            };
            debug!(
                event_name = "engine.stage.completed",
                correlation_id = %state.conversation_id.0,
                stage = stage.as_str(),
                step = steps,
                score = state.qualification_score(),
                "stage completed"
            );
            let score_after = state.qualification_score();
            if score_after != score_before {
                self.audit_sink.emit(AuditEvent::score_changed(
                    &audit,
                    stage.as_str(),
                    score_before,
                    score_after,
                ));
            }
            stage = self.transition(stage, event, &audit)?;
        }

        info!(
            event_name = "engine.run.completed",
            correlation_id = %state.conversation_id.0,
            tenant_id = %state.tenant_id.0,
            steps,
            score = state.qualification_score(),
            next_action = state.next_action.map(|action| action.as_str()).unwrap_or("none"),
            step_limit_reached,
            "conversation run completed"
        );
        self.audit_sink.emit(
            AuditEvent::new(&audit, "conversation.completed", AuditCategory::Flow, AuditOutcome::Success)
                .with_metadata("steps", steps.to_string())
                .with_metadata("score", state.qualification_score().to_string())
                .with_metadata("step_limit_reached", step_limit_reached.to_string()),
        );

        Ok(ConversationOutcome::from_state(state, steps, step_limit_reached))
    }

    async fn execute(
        &self,
        stage: Stage,
        state: &mut ConversationState,
    ) -> Result<StageEvent, EngineError> {
        let llm = self.llm.as_ref();
        let inference = |source: anyhow::Error| EngineError::Inference { stage, source };

        let event = match stage {
            Stage::ContextAnalysis => context::analyze_context(llm, state).await.map_err(inference)?,
            Stage::FrameworkSelection => framework::select_framework(state)?,
            Stage::QuestionGeneration => {
                question::generate_question(llm, state).await.map_err(inference)?
            }
            Stage::ResponseEvaluation => {
                let label =
                    evaluation::evaluate_response(llm, &self.scorer, &self.policy, state)
                        .await
                        .map_err(inference)?;
                StageEvent::ResponseRouted(label)
            }
            Stage::ObjectionHandling => {
                objection::handle_objection(llm, state).await.map_err(inference)?
            }
            Stage::Decision => decision::make_decision(&self.policy, state),
            Stage::ScheduleMeeting => closing::schedule_meeting(state, &self.config),
            Stage::GeneratePayment => closing::generate_payment(state, &self.config),
            Stage::FollowUp => closing::send_follow_up(state),
            Stage::Terminal => {
                return Err(EngineError::Flow(FlowTransitionError::InvalidTransition {
                    stage,
                    event: StageEvent::ConversationClosed,
                }))
            }
        };

        Ok(event)
    }

    fn transition(
        &self,
        stage: Stage,
        event: StageEvent,
        audit: &AuditContext,
    ) -> Result<Stage, EngineError> {
        let outcome = self.flow.apply_with_audit(stage, event, self.audit_sink.as_ref(), audit)?;
        Ok(outcome.to)
    }

    fn emit_failure(&self, audit: &AuditContext, stage: Stage, error: &EngineError) {
        warn!(
            event_name = "engine.stage.failed",
            correlation_id = %audit.correlation_id,
            stage = stage.as_str(),
            error_class = error.class(),
            error = %error,
            "stage failed; aborting run"
        );
        self.audit_sink.emit(
            AuditEvent::new(audit, "stage.failed", AuditCategory::Inference, AuditOutcome::Failed)
                .with_metadata("stage", stage.as_str())
                .with_metadata("error_class", error.class()),
        );
    }
}
