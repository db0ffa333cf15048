use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::conversation::NextAction;
use crate::flows::states::{Stage, StageEvent, TransitionOutcome};
use crate::routing::RouteLabel;

pub trait FlowDefinition {
    fn initial_state(&self) -> Stage;
    fn transition(&self, current: Stage, event: StageEvent)
        -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The sales-qualification conversation graph.
#[derive(Clone, Debug, Default)]
pub struct QualificationFlow;

impl FlowDefinition for QualificationFlow {
    fn initial_state(&self) -> Stage {
        Stage::ContextAnalysis
    }

    fn transition(
        &self,
        current: Stage,
        event: StageEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_qualification(current, event)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> Stage {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: Stage,
        event: StageEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: Stage,
        event: StageEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "stage.transition_applied",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "stage.transition_rejected",
                        AuditCategory::Flow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<QualificationFlow> {
    fn default() -> Self {
        Self::new(QualificationFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {stage} using event {event:?}")]
    InvalidTransition { stage: Stage, event: StageEvent },
}

fn transition_qualification(
    current: Stage,
    event: StageEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use Stage::{
        ContextAnalysis, Decision, FollowUp, FrameworkSelection, GeneratePayment,
        ObjectionHandling, QuestionGeneration, ResponseEvaluation, ScheduleMeeting, Terminal,
    };
    use StageEvent::{
        ActionDecided, ContextAnalyzed, ConversationClosed, FrameworkSelected, ObjectionAnswered,
        QuestionAsked, QuestionBankExhausted, ResponseRouted, StepLimitReached,
    };

    let to = match (current, event) {
        (ContextAnalysis, ContextAnalyzed) => FrameworkSelection,
        (FrameworkSelection, FrameworkSelected) => QuestionGeneration,
        (QuestionGeneration, QuestionAsked) => ResponseEvaluation,
        (QuestionGeneration, QuestionBankExhausted) => Decision,
        // Objection handling bypasses the decision stage entirely.
        (ResponseEvaluation, ResponseRouted(RouteLabel::Objection)) => ObjectionHandling,
        (ResponseEvaluation, ResponseRouted(RouteLabel::Continue | RouteLabel::Qualified)) => {
            Decision
        }
        (ObjectionHandling, ObjectionAnswered) => QuestionGeneration,
        (Decision, ActionDecided(Some(NextAction::ContinueQuestions))) => QuestionGeneration,
        (Decision, ActionDecided(Some(NextAction::ScheduleDemo))) => ScheduleMeeting,
        (Decision, ActionDecided(Some(NextAction::GeneratePayment))) => GeneratePayment,
        (Decision, ActionDecided(Some(NextAction::FollowUp))) => FollowUp,
        (Decision, ActionDecided(_)) => Terminal,
        (ScheduleMeeting | GeneratePayment | FollowUp, ConversationClosed) => Terminal,
        (stage, StepLimitReached) if !stage.is_closing() && stage != Terminal => FollowUp,
        _ => return Err(FlowTransitionError::InvalidTransition { stage: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event })
}
