use leadflow_core::domain::conversation::ConversationState;
use leadflow_core::domain::framework::SalesFramework;
use leadflow_core::domain::tenant::TenantConfigError;
use leadflow_core::flows::StageEvent;
use tracing::info;

/// Picks the qualification framework: tenant preference first, then an
/// already-assigned framework, then the industry mapping.
pub fn select_framework(state: &mut ConversationState) -> Result<StageEvent, TenantConfigError> {
    let framework = match state.tenant_config().preferred_framework()? {
        Some(preferred) => preferred,
        None => match state.framework {
            Some(existing) => existing,
            None => SalesFramework::for_industry(state.industry.as_deref()),
        },
    };

    if state.framework != Some(framework) {
        info!(
            event_name = "stage.framework.selected",
            correlation_id = %state.conversation_id.0,
            tenant_id = %state.tenant_id.0,
            framework = framework.as_str(),
            "qualification framework selected"
        );
    }
    state.framework = Some(framework);

    Ok(StageEvent::FrameworkSelected)
}
