use leadflow_core::domain::conversation::ConversationState;
use leadflow_core::flows::StageEvent;
use leadflow_core::routing::QualificationPolicy;
use tracing::info;

pub fn make_decision(policy: &QualificationPolicy, state: &mut ConversationState) -> StageEvent {
    let action = policy.decide(state);
    info!(
        event_name = "stage.decision.made",
        correlation_id = %state.conversation_id.0,
        tenant_id = %state.tenant_id.0,
        score = state.qualification_score(),
        questions_asked = state.questions_asked().len(),
        action = action.as_str(),
        "next action decided"
    );
    state.next_action = Some(action);
    StageEvent::ActionDecided(state.next_action)
}
