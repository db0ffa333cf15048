use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::conversation::NextAction;
use crate::routing::RouteLabel;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ContextAnalysis,
    FrameworkSelection,
    QuestionGeneration,
    ResponseEvaluation,
    ObjectionHandling,
    Decision,
    ScheduleMeeting,
    GeneratePayment,
    FollowUp,
    Terminal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextAnalysis => "context_analysis",
            Self::FrameworkSelection => "framework_selection",
            Self::QuestionGeneration => "question_generation",
            Self::ResponseEvaluation => "response_evaluation",
            Self::ObjectionHandling => "objection_handling",
            Self::Decision => "decision",
            Self::ScheduleMeeting => "schedule_meeting",
            Self::GeneratePayment => "generate_payment",
            Self::FollowUp => "follow_up",
            Self::Terminal => "terminal",
        }
    }

    /// Stages that emit a final message and always lead to `Terminal`.
    pub fn is_closing(&self) -> bool {
        matches!(self, Self::ScheduleMeeting | Self::GeneratePayment | Self::FollowUp)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage reports back once it has run; drives the next transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageEvent {
    ContextAnalyzed,
    FrameworkSelected,
    QuestionAsked,
    QuestionBankExhausted,
    ResponseRouted(RouteLabel),
    ActionDecided(Option<NextAction>),
    ObjectionAnswered,
    ConversationClosed,
    StepLimitReached,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: Stage,
    pub to: Stage,
    pub event: StageEvent,
}
