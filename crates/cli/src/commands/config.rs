use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadflow_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

/// Rendered value of one config key plus the env variables that can set it.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let file_path = detect_config_path(config_path);
    let file_doc = load_config_file_doc(file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: override > env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(&field, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    vec![
        Field {
            key: "llm.provider",
            value: format!("{:?}", config.llm.provider),
            env_keys: &["LEADFLOW_LLM_PROVIDER"],
        },
        Field {
            key: "llm.api_key",
            value: api_key.to_string(),
            env_keys: &["LEADFLOW_LLM_API_KEY"],
        },
        Field {
            key: "llm.base_url",
            value: config.llm.resolved_base_url(),
            env_keys: &["LEADFLOW_LLM_BASE_URL"],
        },
        Field {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["LEADFLOW_LLM_MODEL"],
        },
        Field {
            key: "llm.temperature",
            value: config.llm.temperature.to_string(),
            env_keys: &["LEADFLOW_LLM_TEMPERATURE"],
        },
        Field {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["LEADFLOW_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "engine.max_steps",
            value: config.engine.max_steps.to_string(),
            env_keys: &["LEADFLOW_ENGINE_MAX_STEPS"],
        },
        Field {
            key: "engine.payment_link_base",
            value: config.engine.payment_link_base.clone(),
            env_keys: &["LEADFLOW_ENGINE_PAYMENT_LINK_BASE"],
        },
        Field {
            key: "engine.default_calendar_link",
            value: config.engine.default_calendar_link.clone(),
            env_keys: &["LEADFLOW_ENGINE_DEFAULT_CALENDAR_LINK"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["LEADFLOW_LOGGING_LEVEL", "LEADFLOW_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["LEADFLOW_LOGGING_FORMAT", "LEADFLOW_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("leadflow.toml"), PathBuf::from("config/leadflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &Field, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = file_doc {
        if contains_path(doc, field.key) {
            let file_path = file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
