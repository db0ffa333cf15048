use anyhow::Result;
use leadflow_core::domain::conversation::ConversationState;
use leadflow_core::routing::{QualificationPolicy, RouteLabel};
use leadflow_core::scoring::{QualificationScorer, ResponseAssessment, NEUTRAL_SUB_SCORE};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extraction::{as_score, as_text, parse_json_reply, text_items};
use crate::llm::LlmClient;
use crate::stages::prompt;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Evaluation {
    information_quality: Value,
    buying_intent: Value,
    qualification_level: Value,
    objections: Value,
    next_action: Value,
}

impl Evaluation {
    fn assessment(&self) -> ResponseAssessment {
        let score = |value: &Value| as_score(value).unwrap_or(NEUTRAL_SUB_SCORE);
        ResponseAssessment {
            information_quality: score(&self.information_quality),
            buying_intent: score(&self.buying_intent),
            qualification_level: score(&self.qualification_level),
        }
    }
}

/// Scores the latest human turn and folds it into the running qualification score,
/// then labels the edge out of evaluation.
pub async fn evaluate_response(
    llm: &dyn LlmClient,
    scorer: &QualificationScorer,
    policy: &QualificationPolicy,
    state: &mut ConversationState,
) -> Result<RouteLabel> {
    let Some(response) = state.latest_human_text().map(str::to_string) else {
        return Ok(policy.route(state));
    };
    state.record_latest_response();

    let framework = state.framework.map(|framework| framework.as_str()).unwrap_or("SPIN");
    let reply = llm.complete(&prompt(evaluation_prompt(&response, framework))).await?;

    let previous = state.qualification_score();
    let updated = match parse_json_reply::<Evaluation>(&reply) {
        Some(evaluation) => {
            debug!(
                event_name = "stage.evaluation.assessed",
                correlation_id = %state.conversation_id.0,
                objections = ?text_items(&evaluation.objections),
                suggested_action = as_text(&evaluation.next_action).unwrap_or_default(),
                "response evaluated"
            );
            scorer.blend(previous, &evaluation.assessment())
        }
        None => {
            warn!(
                event_name = "stage.evaluation.parse_failed",
                correlation_id = %state.conversation_id.0,
                tenant_id = %state.tenant_id.0,
                "evaluation reply was not a json object; applying default increment"
            );
            scorer.on_parse_failure(previous)
        }
    };
    state.set_qualification_score(updated);

    let label = policy.route(state);
    debug!(
        event_name = "stage.evaluation.routed",
        correlation_id = %state.conversation_id.0,
        previous_score = previous,
        score = updated,
        route = label.as_str(),
        "qualification score updated"
    );

    Ok(label)
}

fn evaluation_prompt(response: &str, framework: &str) -> String {
    format!(
        "Evaluate this customer response against the {framework} sales framework.\n\n\
         Response: {response}\n\n\
         Return a JSON object with keys:\n\
         - information_quality: 0-100\n\
         - buying_intent: 0-100\n\
         - qualification_level: 0-100\n\
         - objections: list of objections raised, if any\n\
         - next_action: the action you would recommend next"
    )
}
