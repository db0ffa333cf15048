use anyhow::Result;
use leadflow_core::domain::conversation::ConversationState;
use leadflow_core::flows::StageEvent;
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::stages::prompt;

const DEFAULT_PRODUCT: &str = "our solution";
const EMPTY_REPLY_FALLBACK: &str =
    "I understand your concern. Could you tell me a bit more about what's holding you back?";

/// Answers the objection in the latest human turn and hands back to question generation.
pub async fn handle_objection(
    llm: &dyn LlmClient,
    state: &mut ConversationState,
) -> Result<StageEvent> {
    let objection = state.latest_human_text().unwrap_or_default().to_string();
    let product =
        state.tenant_config().product_description().unwrap_or(DEFAULT_PRODUCT).to_string();

    let reply = llm.complete(&prompt(objection_prompt(&objection, &product))).await?;
    let reply = reply.trim();

    if reply.is_empty() {
        warn!(
            event_name = "stage.objection.empty_reply",
            correlation_id = %state.conversation_id.0,
            tenant_id = %state.tenant_id.0,
            "objection reply was empty; using fallback acknowledgement"
        );
        state.push_agent(EMPTY_REPLY_FALLBACK);
    } else {
        state.push_agent(reply);
    }

    info!(
        event_name = "stage.objection.handled",
        correlation_id = %state.conversation_id.0,
        tenant_id = %state.tenant_id.0,
        "objection answered"
    );

    Ok(StageEvent::ObjectionAnswered)
}

fn objection_prompt(objection: &str, product: &str) -> String {
    format!(
        "Handle this customer objection professionally.\n\
         Objection: {objection}\n\
         Product/Service: {product}\n\n\
         Provide, in plain text:\n\
         1. Acknowledgment of the concern\n\
         2. A relevant counter-argument or clarification\n\
         3. A question to continue the conversation\n\n\
         Keep the response under 100 words."
    )
}
