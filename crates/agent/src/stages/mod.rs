//! One handler per conversation stage. Each handler mutates the state and
//! reports the event the flow table consumes next; none of them chooses the
//! next stage itself.

pub mod closing;
pub mod context;
pub mod decision;
pub mod evaluation;
pub mod framework;
pub mod objection;
pub mod question;

use crate::llm::PromptMessage;

const ASSISTANT_PERSONA: &str =
    "You are a sales qualification assistant for a B2B software company. \
     When asked for JSON, reply with a single JSON object and nothing else.";

fn prompt(body: String) -> Vec<PromptMessage> {
    vec![PromptMessage::system(ASSISTANT_PERSONA), PromptMessage::user(body)]
}
