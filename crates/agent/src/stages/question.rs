use anyhow::Result;
use leadflow_core::domain::conversation::{ConversationState, NextAction};
use leadflow_core::domain::framework::SalesFramework;
use leadflow_core::flows::StageEvent;
use leadflow_core::questions::available_questions;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::extraction::{as_score, as_text, parse_json_reply};
use crate::llm::LlmClient;
use crate::stages::prompt;

const CANDIDATES_SHOWN: usize = 3;
const RECENT_RESPONSES: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuestionSelection {
    selected_question: Value,
    candidate_index: Value,
    reasoning: Value,
    expected_information: Value,
}

/// Asks the next unasked question from the framework's bank.
///
/// With the bank exhausted the stage appends nothing, marks the conversation
/// ready for a decision and reports `QuestionBankExhausted`.
pub async fn generate_question(
    llm: &dyn LlmClient,
    state: &mut ConversationState,
) -> Result<StageEvent> {
    let framework = state.framework.unwrap_or_else(|| SalesFramework::for_industry(None));
    let available = available_questions(framework, state.questions_asked());

    if available.is_empty() {
        debug!(
            event_name = "stage.question.bank_exhausted",
            correlation_id = %state.conversation_id.0,
            framework = framework.as_str(),
            asked = state.questions_asked().len(),
            "no unasked questions left"
        );
        state.next_action = Some(NextAction::MakeDecision);
        return Ok(StageEvent::QuestionBankExhausted);
    }

    let candidates = &available[..available.len().min(CANDIDATES_SHOWN)];
    let reply = llm.complete(&prompt(question_prompt(state, framework, candidates))).await?;

    let (template, text) = match parse_json_reply::<QuestionSelection>(&reply) {
        Some(selection) => resolve_selection(&selection, candidates),
        None => {
            warn!(
                event_name = "stage.question.parse_failed",
                correlation_id = %state.conversation_id.0,
                tenant_id = %state.tenant_id.0,
                "question selection reply was not a json object; asking the top candidate"
            );
            (candidates[0], candidates[0].to_string())
        }
    };

    state.push_agent(text);
    state.record_question(template);

    Ok(StageEvent::QuestionAsked)
}

fn question_prompt(
    state: &ConversationState,
    framework: SalesFramework,
    candidates: &[&str],
) -> String {
    let flags = state.flags();
    let context = json!({
        "customer_name": state.customer_name,
        "company": state.company,
        "industry": state.industry,
        "previous_responses": state.recent_responses(RECENT_RESPONSES),
        "qualification_status": {
            "budget": flags.budget_qualified(),
            "authority": flags.authority_qualified(),
            "need": flags.need_qualified(),
            "timeline": flags.timeline_qualified(),
        },
    });
    let context = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());
    let numbered = candidates
        .iter()
        .enumerate()
        .map(|(index, question)| format!("{index}. {question}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the following context, select and personalize the most appropriate next question.\n\n\
         Context: {context}\n\
         Framework: {framework}\n\
         Available questions (zero-based index):\n{numbered}\n\n\
         Return a JSON object with keys:\n\
         - selected_question: the chosen question, personalized\n\
         - candidate_index: index of the question you started from\n\
         - reasoning: why this question now\n\
         - expected_information: what the answer should reveal"
    )
}

/// Returns the bank template the reply was derived from and the text to send.
fn resolve_selection<'a>(selection: &QuestionSelection, candidates: &[&'a str]) -> (&'a str, String) {
    let text = as_text(&selection.selected_question).map(str::to_string);

    let by_index = as_score(&selection.candidate_index)
        .filter(|index| index.fract() == 0.0 && *index >= 0.0)
        .and_then(|index| candidates.get(index as usize).copied());
    let by_text = text.as_deref().and_then(|text| {
        candidates.iter().copied().find(|candidate| candidate.eq_ignore_ascii_case(text.trim()))
    });
    // An exact match names the question actually sent, whatever index came with it.
    let template = by_text.or(by_index).unwrap_or(candidates[0]);

    debug!(
        event_name = "stage.question.selected",
        template,
        reasoning = as_text(&selection.reasoning).unwrap_or_default(),
        expected_information = %selection.expected_information,
        "question selected"
    );

    (template, text.unwrap_or_else(|| template.to_string()))
}

#[cfg(test)]
mod tests {
    use leadflow_core::domain::conversation::{ConversationState, NextAction, Speaker};
    use leadflow_core::domain::framework::SalesFramework;
    use leadflow_core::domain::tenant::TenantConfig;
    use leadflow_core::flows::StageEvent;
    use leadflow_core::questions::questions_for;

    use super::generate_question;
    use crate::llm::ScriptedLlmClient;

    fn state(framework: SalesFramework) -> ConversationState {
        let mut state = ConversationState::with_initial_message(TenantConfig::new("acme"), "hi");
        state.framework = Some(framework);
        state
    }

    #[tokio::test]
    async fn personalised_question_records_its_template() {
        let bank = questions_for(SalesFramework::Bant);
        let llm = ScriptedLlmClient::new([r#"{"selected_question": "Dana, what budget have you set aside?",
            "candidate_index": 0, "reasoning": "budget unknown", "expected_information": ["budget"]}"#]);
        let mut state = state(SalesFramework::Bant);

        let event = generate_question(&llm, &mut state).await.expect("stage");

        assert_eq!(event, StageEvent::QuestionAsked);
        assert_eq!(state.questions_asked(), [bank[0].to_string()]);
        let last = state.turns().last().expect("agent turn");
        assert_eq!(last.speaker, Speaker::Agent);
        assert_eq!(last.text, "Dana, what budget have you set aside?");
    }

    #[tokio::test]
    async fn candidate_index_picks_a_later_template() {
        let bank = questions_for(SalesFramework::Spin);
        let llm = ScriptedLlmClient::new([r#"{"selected_question": "Tell me more?", "candidate_index": 2}"#]);
        let mut state = state(SalesFramework::Spin);

        generate_question(&llm, &mut state).await.expect("stage");

        assert_eq!(state.questions_asked(), [bank[2].to_string()]);
    }

    #[tokio::test]
    async fn exact_text_match_identifies_template_without_index() {
        let bank = questions_for(SalesFramework::Meddic);
        let reply = serde_json::json!({ "selected_question": bank[1] }).to_string();
        let llm = ScriptedLlmClient::new([reply]);
        let mut state = state(SalesFramework::Meddic);

        generate_question(&llm, &mut state).await.expect("stage");

        assert_eq!(state.questions_asked(), [bank[1].to_string()]);
        assert_eq!(state.turns().last().map(|turn| turn.text.as_str()), Some(bank[1]));
    }

    #[tokio::test]
    async fn exact_text_match_wins_over_a_conflicting_index() {
        let bank = questions_for(SalesFramework::Meddic);
        let reply =
            serde_json::json!({ "selected_question": bank[1], "candidate_index": 0 }).to_string();
        let llm = ScriptedLlmClient::new([reply.as_str(), "not json"]);
        let mut state = state(SalesFramework::Meddic);

        generate_question(&llm, &mut state).await.expect("first");
        generate_question(&llm, &mut state).await.expect("second");

        assert_eq!(state.questions_asked(), [bank[1].to_string(), bank[0].to_string()]);
        let agent_texts: Vec<_> = state
            .turns()
            .iter()
            .filter(|turn| turn.speaker == Speaker::Agent)
            .map(|turn| turn.text.as_str())
            .collect();
        assert_eq!(agent_texts, vec![bank[1], bank[0]]);
    }

    #[tokio::test]
    async fn unparseable_or_blank_selection_falls_back_to_first_available() {
        let bank = questions_for(SalesFramework::Bant);
        let llm = ScriptedLlmClient::new(["Sure! Ask about budget.", r#"{"selected_question": "  "}"#]);
        let mut state = state(SalesFramework::Bant);

        generate_question(&llm, &mut state).await.expect("first");
        generate_question(&llm, &mut state).await.expect("second");

        assert_eq!(state.questions_asked(), [bank[0].to_string(), bank[1].to_string()]);
        let agent_texts: Vec<_> = state
            .turns()
            .iter()
            .filter(|turn| turn.speaker == Speaker::Agent)
            .map(|turn| turn.text.as_str())
            .collect();
        assert_eq!(agent_texts, vec![bank[0], bank[1]]);
    }

    #[tokio::test]
    async fn exhausted_bank_appends_nothing_and_requests_decision() {
        let llm = ScriptedLlmClient::default();
        let mut state = state(SalesFramework::Bant);
        for question in questions_for(SalesFramework::Bant) {
            state.record_question(*question);
        }
        let turns_before = state.turns().len();

        let event = generate_question(&llm, &mut state).await.expect("stage");

        assert_eq!(event, StageEvent::QuestionBankExhausted);
        assert_eq!(state.next_action, Some(NextAction::MakeDecision));
        assert_eq!(state.turns().len(), turns_before);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn no_template_is_asked_twice() {
        let llm = ScriptedLlmClient::default().with_fallback(r#"{"candidate_index": 0}"#);
        let mut state = state(SalesFramework::Spin);

        for _ in 0..5 {
            generate_question(&llm, &mut state).await.expect("stage");
        }

        let mut asked = state.questions_asked().to_vec();
        asked.sort();
        asked.dedup();
        assert_eq!(asked.len(), 5);
    }
}
