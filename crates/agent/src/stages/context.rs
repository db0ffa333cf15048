use anyhow::Result;
use leadflow_core::domain::conversation::{merge_non_empty, ConversationState, Criterion};
use leadflow_core::flows::StageEvent;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extraction::{as_text, is_present, parse_json_reply, text_items};
use crate::llm::LlmClient;
use crate::stages::prompt;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContextExtraction {
    #[serde(alias = "name")]
    customer_name: Value,
    #[serde(alias = "company_name")]
    company: Value,
    industry: Value,
    contact_info: ContactExtraction,
    budget_info: Value,
    authority_info: Value,
    needs: Value,
    timeline: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactExtraction {
    email: Value,
    phone: Value,
}

fn context_prompt(message: &str) -> String {
    format!(
        "Analyze this customer message and extract relevant information.\n\
         Message: {message}\n\n\
         Return a JSON object with these keys (use null when unknown):\n\
         - customer_name\n\
         - company\n\
         - industry (mentioned or reasonably inferred, lowercase)\n\
         - contact_info: {{ \"email\", \"phone\" }}\n\
         - budget_info: any budget indicators\n\
         - authority_info: any decision-making authority indicators\n\
         - needs: list of needs or pain points mentioned\n\
         - timeline: any timeline indicators"
    )
}

/// Extracts customer facts and qualification indicators from the latest human turn.
///
/// An unparseable reply leaves the state untouched.
pub async fn analyze_context(
    llm: &dyn LlmClient,
    state: &mut ConversationState,
) -> Result<StageEvent> {
    let message = state.latest_human_text().unwrap_or_default().to_string();
    let reply = llm.complete(&prompt(context_prompt(&message))).await?;

    match parse_json_reply::<ContextExtraction>(&reply) {
        Some(extraction) => apply_extraction(state, &extraction),
        None => warn!(
            event_name = "stage.context.parse_failed",
            correlation_id = %state.conversation_id.0,
            tenant_id = %state.tenant_id.0,
            "context analysis reply was not a json object; keeping existing state"
        ),
    }

    Ok(StageEvent::ContextAnalyzed)
}

fn apply_extraction(state: &mut ConversationState, extraction: &ContextExtraction) {
    merge_non_empty(&mut state.customer_name, as_text(&extraction.customer_name));
    merge_non_empty(&mut state.company, as_text(&extraction.company));
    merge_non_empty(&mut state.industry, as_text(&extraction.industry));
    merge_non_empty(&mut state.contact.email, as_text(&extraction.contact_info.email));
    merge_non_empty(&mut state.contact.phone, as_text(&extraction.contact_info.phone));

    let indicators = [
        (Criterion::Budget, &extraction.budget_info),
        (Criterion::Authority, &extraction.authority_info),
        (Criterion::Need, &extraction.needs),
        (Criterion::Timeline, &extraction.timeline),
    ];
    for (criterion, indicator) in indicators {
        if is_present(indicator) {
            state.mark_qualified(criterion);
        }
    }

    for need in text_items(&extraction.needs) {
        state.add_need(&need);
    }

    debug!(
        event_name = "stage.context.extracted",
        correlation_id = %state.conversation_id.0,
        has_name = state.customer_name.is_some(),
        has_company = state.company.is_some(),
        industry = state.industry.as_deref().unwrap_or("unknown"),
        needs = state.needs_identified().len(),
        "context analysis merged"
    );
}
