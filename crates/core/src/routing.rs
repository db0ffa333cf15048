//! Routing and decision policy. Everything here is a pure function of the
//! conversation state, so the engine's branching is fully deterministic.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ConversationState, Criterion, NextAction};

/// Phrases that mark the latest human turn as an objection.
pub const OBJECTION_KEYWORDS: [&str; 5] =
    ["too expensive", "not interested", "not now", "budget", "think about it"];

/// Label chosen on the conditional edge after response evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteLabel {
    Continue,
    Objection,
    Qualified,
}

impl RouteLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Objection => "objection",
            Self::Qualified => "qualified",
        }
    }
}

/// Thresholds for routing and the decision cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualificationPolicy {
    pub qualified_route_threshold: u8,
    pub payment_threshold: u8,
    pub demo_threshold: u8,
    pub follow_up_after_questions: usize,
}

impl Default for QualificationPolicy {
    fn default() -> Self {
        Self {
            qualified_route_threshold: 80,
            payment_threshold: 85,
            demo_threshold: 70,
            follow_up_after_questions: 10,
        }
    }
}

pub fn contains_objection(text: &str) -> bool {
    let lowered = text.to_lowercase();
    OBJECTION_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

impl QualificationPolicy {
    /// Objections win over qualification regardless of score.
    pub fn route(&self, state: &ConversationState) -> RouteLabel {
        if state.latest_human_text().is_some_and(contains_objection) {
            return RouteLabel::Objection;
        }
        if state.qualification_score() >= self.qualified_route_threshold {
            return RouteLabel::Qualified;
        }
        RouteLabel::Continue
    }

    /// Priority cascade: the first matching branch wins.
    pub fn decide(&self, state: &ConversationState) -> NextAction {
        let score = state.qualification_score();
        let flags = state.flags();

        if score >= self.payment_threshold
            && flags.is_met(Criterion::Budget)
            && flags.is_met(Criterion::Authority)
        {
            if state.tenant_config().payment_enabled {
                NextAction::GeneratePayment
            } else {
                NextAction::ScheduleDemo
            }
        } else if score >= self.demo_threshold {
            NextAction::ScheduleDemo
        } else if state.questions_asked().len() >= self.follow_up_after_questions {
            NextAction::FollowUp
        } else {
            NextAction::ContinueQuestions
        }
    }
}
