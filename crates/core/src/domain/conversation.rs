use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::framework::SalesFramework;
use crate::domain::tenant::{TenantConfig, TenantId};

/// Score every conversation starts from before the first evaluation.
pub const INITIAL_QUALIFICATION_SCORE: u8 = 50;
pub const MAX_QUALIFICATION_SCORE: u8 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Human,
    Agent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Human, text: text.into() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Agent, text: text.into() }
    }
}

/// Transition label the engine reads to pick the next stage, plus the terminal markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    ContinueQuestions,
    ScheduleDemo,
    GeneratePayment,
    FollowUp,
    MakeDecision,
    Scheduled,
    PaymentSent,
    FollowUpSent,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContinueQuestions => "continue_questions",
            Self::ScheduleDemo => "schedule_demo",
            Self::GeneratePayment => "generate_payment",
            Self::FollowUp => "follow_up",
            Self::MakeDecision => "make_decision",
            Self::Scheduled => "scheduled",
            Self::PaymentSent => "payment_sent",
            Self::FollowUpSent => "follow_up_sent",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scheduled | Self::PaymentSent | Self::FollowUpSent)
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    Budget,
    Authority,
    Need,
    Timeline,
}

/// BANT-style qualification flags. Flags only ever move from false to true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationFlags {
    budget: bool,
    authority: bool,
    need: bool,
    timeline: bool,
}

impl QualificationFlags {
    pub fn mark(&mut self, criterion: Criterion) {
        match criterion {
            Criterion::Budget => self.budget = true,
            Criterion::Authority => self.authority = true,
            Criterion::Need => self.need = true,
            Criterion::Timeline => self.timeline = true,
        }
    }

    pub fn is_met(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Budget => self.budget,
            Criterion::Authority => self.authority,
            Criterion::Need => self.need,
            Criterion::Timeline => self.timeline,
        }
    }

    pub fn budget_qualified(&self) -> bool {
        self.budget
    }

    pub fn authority_qualified(&self) -> bool {
        self.authority
    }

    pub fn need_qualified(&self) -> bool {
        self.need
    }

    pub fn timeline_qualified(&self) -> bool {
        self.timeline
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
}

/// The mutable record threaded through every stage of one conversation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub conversation_id: ConversationId,
    pub tenant_id: TenantId,
    tenant_config: TenantConfig,
    pub customer_name: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub contact: ContactInfo,
    pub framework: Option<SalesFramework>,
    pub next_action: Option<NextAction>,
    turns: Vec<Turn>,
    qualification_score: u8,
    questions_asked: Vec<String>,
    customer_responses: Vec<String>,
    flags: QualificationFlags,
    needs_identified: Vec<String>,
}

impl ConversationState {
    pub fn new(tenant_config: TenantConfig) -> Self {
        Self {
            conversation_id: ConversationId::generate(),
            tenant_id: tenant_config.tenant_id(),
            tenant_config,
            customer_name: None,
            company: None,
            industry: None,
            contact: ContactInfo::default(),
            framework: None,
            next_action: None,
            turns: Vec::new(),
            qualification_score: INITIAL_QUALIFICATION_SCORE,
            questions_asked: Vec::new(),
            customer_responses: Vec::new(),
            flags: QualificationFlags::default(),
            needs_identified: Vec::new(),
        }
    }

    pub fn with_initial_message(tenant_config: TenantConfig, message: impl Into<String>) -> Self {
        let mut state = Self::new(tenant_config);
        state.push_human(message);
        state
    }

    /// Tenant settings fixed at creation for the whole conversation.
    pub fn tenant_config(&self) -> &TenantConfig {
        &self.tenant_config
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push_human(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::human(text));
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::agent(text));
    }

    pub fn latest_human_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.speaker == Speaker::Human)
            .map(|turn| turn.text.as_str())
    }

    pub fn human_turn_count(&self) -> usize {
        self.turns.iter().filter(|turn| turn.speaker == Speaker::Human).count()
    }

    pub fn agent_turn_count(&self) -> usize {
        self.turns.iter().filter(|turn| turn.speaker == Speaker::Agent).count()
    }

    pub fn qualification_score(&self) -> u8 {
        self.qualification_score
    }

    pub fn set_qualification_score(&mut self, score: u8) {
        self.qualification_score = score.min(MAX_QUALIFICATION_SCORE);
    }

    pub fn questions_asked(&self) -> &[String] {
        &self.questions_asked
    }

    pub fn has_asked(&self, question: &str) -> bool {
        self.questions_asked.iter().any(|asked| asked == question)
    }

    /// Records a question in ask order. Returns false if it was already asked.
    pub fn record_question(&mut self, question: impl Into<String>) -> bool {
        let question = question.into();
        if self.has_asked(&question) {
            return false;
        }
        self.questions_asked.push(question);
        true
    }

    pub fn customer_responses(&self) -> &[String] {
        &self.customer_responses
    }

    pub fn recent_responses(&self, count: usize) -> &[String] {
        let start = self.customer_responses.len().saturating_sub(count);
        &self.customer_responses[start..]
    }

    /// Appends the latest human turn to the response log unless it is already there,
    /// keeping one entry per human turn.
    pub fn record_latest_response(&mut self) -> bool {
        if self.customer_responses.len() >= self.human_turn_count() {
            return false;
        }
        match self.latest_human_text().map(str::to_string) {
            Some(text) => {
                self.customer_responses.push(text);
                true
            }
            None => false,
        }
    }

    pub fn flags(&self) -> QualificationFlags {
        self.flags
    }

    pub fn mark_qualified(&mut self, criterion: Criterion) {
        self.flags.mark(criterion);
    }

    pub fn needs_identified(&self) -> &[String] {
        &self.needs_identified
    }

    pub fn add_need(&mut self, need: &str) -> bool {
        let need = need.trim();
        if need.is_empty() || self.needs_identified.iter().any(|known| known == need) {
            return false;
        }
        self.needs_identified.push(need.to_string());
        true
    }

    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo {
            name: self.customer_name.clone(),
            company: self.company.clone(),
            industry: self.industry.clone(),
        }
    }
}

/// Overwrites `slot` only when `value` carries non-blank text; never clears it.
pub fn merge_non_empty(slot: &mut Option<String>, value: Option<&str>) -> bool {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            *slot = Some(value.to_string());
            true
        }
        None => false,
    }
}
