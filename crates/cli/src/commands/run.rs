use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use leadflow_agent::{EngineError, HttpLlmClient, QualificationEngine};
use leadflow_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use leadflow_core::errors::ApplicationError;
use leadflow_core::domain::tenant::TenantConfig;
use tracing::info;

use crate::commands::CommandResult;
use crate::logging::init_logging;

const COMMAND: &str = "run";

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub message: String,
    pub tenant: PathBuf,
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

pub fn run(args: &RunArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: args.config.clone(),
        require_file: args.config.is_some(),
        overrides: args.overrides.clone(),
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config.logging);

    let tenant = match load_tenant_config(&args.tenant) {
        Ok(tenant) => tenant,
        Err(error) => {
            return CommandResult::failure(COMMAND, "tenant_config", format!("{error:#}"), 3);
        }
    };

    let llm = match HttpLlmClient::from_config(&config.llm) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", format!("{error:#}"), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                6,
            );
        }
    };

    info!(
        event_name = "cli.run.started",
        tenant_id = %tenant.tenant_id().0,
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "starting conversation run"
    );

    let engine = QualificationEngine::new(Arc::new(llm)).with_config(config.engine.clone());
    let result = runtime.block_on(engine.run_conversation(&args.message, tenant));

    match result {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(data) => CommandResult::success_with_data(
                COMMAND,
                format!(
                    "conversation finished with {}",
                    outcome.next_action.map(|action| action.as_str()).unwrap_or("no action")
                ),
                Some(data),
            ),
            Err(error) => CommandResult::failure(
                COMMAND,
                "serialization",
                format!("could not serialize outcome: {error}"),
                7,
            ),
        },
        Err(error) => {
            let error_class = error.class();
            let code = exit_code(&error);
            let detail = error.to_string();
            let interface = ApplicationError::from(error).into_interface(COMMAND);
            CommandResult::failure(
                COMMAND,
                error_class,
                format!("{} ({detail})", interface.user_message()),
                code,
            )
        }
    }
}

fn exit_code(error: &EngineError) -> u8 {
    match error {
        EngineError::Configuration(_) => 3,
        EngineError::Inference { .. } => 4,
        EngineError::Flow(_) => 5,
    }
}

/// Reads a tenant file as JSON when the extension says so, TOML otherwise, then validates it.
pub fn load_tenant_config(path: &Path) -> Result<TenantConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read tenant config `{}`", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let tenant: TenantConfig = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse tenant config `{}`", path.display()))?
    } else {
        toml::from_str(&raw)
            .with_context(|| format!("could not parse tenant config `{}`", path.display()))?
    };

    tenant.validate().with_context(|| format!("invalid tenant config `{}`", path.display()))?;
    Ok(tenant)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use leadflow_core::domain::framework::SalesFramework;

    use super::load_tenant_config;

    #[test]
    fn loads_toml_and_json_tenants() {
        let dir = tempfile::tempdir().expect("temp dir");
        let toml_path = dir.path().join("tenant.toml");
        fs::write(
            &toml_path,
            "tenant_id = \"acme\"\npreferred_framework = \"MEDDIC\"\npayment_enabled = true\n",
        )
        .expect("write toml");
        let json_path = dir.path().join("tenant.json");
        fs::write(&json_path, r#"{"tenantId": "globex", "calendarLink": "https://cal.example/g"}"#)
            .expect("write json");

        let acme = load_tenant_config(&toml_path).expect("toml tenant");
        assert_eq!(acme.tenant_id, "acme");
        assert!(acme.payment_enabled);
        assert_eq!(acme.preferred_framework().expect("framework"), Some(SalesFramework::Meddic));

        let globex = load_tenant_config(&json_path).expect("json tenant");
        assert_eq!(globex.calendar_link(), Some("https://cal.example/g"));
    }

    #[test]
    fn rejects_unreadable_or_invalid_tenants() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(load_tenant_config(&dir.path().join("missing.toml")).is_err());

        let invalid = dir.path().join("tenant.toml");
        fs::write(&invalid, "tenant_id = \"acme\"\npreferred_framework = \"SANDLER\"\n")
            .expect("write");
        let error = load_tenant_config(&invalid).expect_err("unknown framework");
        assert!(format!("{error:#}").contains("SANDLER"));
    }
}
