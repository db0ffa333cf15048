//! Closing stages. Fixed templates, no inference.

use leadflow_core::config::EngineConfig;
use leadflow_core::domain::conversation::{ConversationState, NextAction};
use leadflow_core::flows::StageEvent;
use tracing::info;

pub fn schedule_meeting(state: &mut ConversationState, engine: &EngineConfig) -> StageEvent {
    let calendar_link = state
        .tenant_config()
        .calendar_link()
        .unwrap_or(engine.default_calendar_link.as_str())
        .to_string();

    state.push_agent(format!(
        "Great! Based on our conversation, I'd love to show you a personalized demo.\n\n\
         You can book a convenient time here: {calendar_link}\n\n\
         Or would you prefer if I send you some specific times that work for your schedule?"
    ));
    close(state, NextAction::Scheduled)
}

pub fn generate_payment(state: &mut ConversationState, engine: &EngineConfig) -> StageEvent {
    let payment_link = payment_link(&engine.payment_link_base, &state.tenant_id.0);

    state.push_agent(format!(
        "Perfect! You're all set to get started.\n\n\
         Here's your secure payment link: {payment_link}\n\n\
         Once payment is processed, you'll receive immediate access along with onboarding instructions.\n\n\
         Any questions about the process?"
    ));
    close(state, NextAction::PaymentSent)
}

pub fn send_follow_up(state: &mut ConversationState) -> StageEvent {
    let topics = if state.needs_identified().is_empty() {
        "our solution".to_string()
    } else {
        state.needs_identified().join(", ")
    };
    let industry = state.industry.as_deref().unwrap_or("company");

    state.push_agent(format!(
        "Thank you for your time today!\n\n\
         Based on our conversation, I'll send you:\n\
         - Information about {topics}\n\
         - Some times for a follow-up call next week\n\
         - A case study from a similar {industry}\n\n\
         Is there anything specific you'd like me to include?"
    ));
    close(state, NextAction::FollowUpSent)
}

fn payment_link(base: &str, tenant_id: &str) -> String {
    format!("{}/{tenant_id}", base.trim_end_matches('/'))
}

fn close(state: &mut ConversationState, marker: NextAction) -> StageEvent {
    info!(
        event_name = "stage.closing.completed",
        correlation_id = %state.conversation_id.0,
        tenant_id = %state.tenant_id.0,
        outcome = marker.as_str(),
        score = state.qualification_score(),
        "conversation closed"
    );
    state.next_action = Some(marker);
    StageEvent::ConversationClosed
}

#[cfg(test)]
mod tests {
    use leadflow_core::config::EngineConfig;
    use leadflow_core::domain::conversation::{ConversationState, NextAction};
    use leadflow_core::domain::tenant::TenantConfig;
    use leadflow_core::flows::StageEvent;

    use super::{generate_payment, schedule_meeting, send_follow_up};

    fn state(config: TenantConfig) -> ConversationState {
        ConversationState::with_initial_message(config, "hello")
    }

    fn last_text(state: &ConversationState) -> &str {
        state.turns().last().map(|turn| turn.text.as_str()).unwrap_or_default()
    }

    #[test]
    fn schedule_uses_tenant_calendar_or_default() {
        let mut config = TenantConfig::new("acme");
        config.calendar_link = Some("https://cal.example/acme".to_string());
        let mut with_link = state(config);
        assert_eq!(
            schedule_meeting(&mut with_link, &EngineConfig::default()),
            StageEvent::ConversationClosed
        );
        assert!(last_text(&with_link).contains("https://cal.example/acme"));
        assert_eq!(with_link.next_action, Some(NextAction::Scheduled));

        let mut without_link = state(TenantConfig::new("acme"));
        schedule_meeting(&mut without_link, &EngineConfig::default());
        assert!(last_text(&without_link).contains("https://calendly.com/demo"));
    }

    #[test]
    fn payment_link_is_tenant_scoped() {
        let mut state = state(TenantConfig::new("acme-corp"));
        generate_payment(&mut state, &EngineConfig::default());

        assert!(last_text(&state).contains("https://pay.stripe.com/demo-link/acme-corp"));
        assert_eq!(state.next_action, Some(NextAction::PaymentSent));

        let engine = EngineConfig {
            payment_link_base: "https://billing.example/pay/".to_string(),
            ..EngineConfig::default()
        };
        generate_payment(&mut state, &engine);
        assert!(last_text(&state).contains("https://billing.example/pay/acme-corp"));
    }

    #[test]
    fn follow_up_mentions_needs_and_industry_with_defaults() {
        let mut bare = state(TenantConfig::new("acme"));
        send_follow_up(&mut bare);
        assert!(last_text(&bare).contains("Information about our solution"));
        assert!(last_text(&bare).contains("similar company"));
        assert_eq!(bare.next_action, Some(NextAction::FollowUpSent));

        let mut known = state(TenantConfig::new("acme"));
        known.industry = Some("healthcare".to_string());
        known.add_need("compliance reporting");
        known.add_need("audit trails");
        send_follow_up(&mut known);
        assert!(last_text(&known).contains("compliance reporting, audit trails"));
        assert!(last_text(&known).contains("similar healthcare"));
    }
}
