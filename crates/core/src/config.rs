use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Hard cap on stage executions per conversation run.
    pub max_steps: u32,
    pub payment_link_base: String,
    pub default_calendar_link: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(alias = "openai")]
    OpenAi,
    Anthropic,
    Ollama,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

impl LlmProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_BASE_URL,
            Self::Anthropic => ANTHROPIC_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
        }
    }
}

impl LlmConfig {
    /// Configured base URL without a trailing slash, else the provider's default.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub max_steps: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CALENDAR_LINK: &str = "https://calendly.com/demo";
pub const DEFAULT_PAYMENT_LINK_BASE: &str = "https://pay.stripe.com/demo-link";
pub const DEFAULT_MAX_STEPS: u32 = 40;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            payment_link_base: DEFAULT_PAYMENT_LINK_BASE.to_string(),
            default_calendar_link: DEFAULT_CALENDAR_LINK.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: None,
                model: "llama3.1".to_string(),
                temperature: 0.7,
                timeout_secs: 30,
            },
            engine: EngineConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("leadflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(max_steps) = engine.max_steps {
                self.engine.max_steps = max_steps;
            }
            if let Some(payment_link_base) = engine.payment_link_base {
                self.engine.payment_link_base = payment_link_base;
            }
            if let Some(default_calendar_link) = engine.default_calendar_link {
                self.engine.default_calendar_link = default_calendar_link;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LEADFLOW_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("LEADFLOW_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("LEADFLOW_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("LEADFLOW_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("LEADFLOW_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("LEADFLOW_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("LEADFLOW_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_ENGINE_MAX_STEPS") {
            self.engine.max_steps = parse_u32("LEADFLOW_ENGINE_MAX_STEPS", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_ENGINE_PAYMENT_LINK_BASE") {
            self.engine.payment_link_base = value;
        }
        if let Some(value) = read_env("LEADFLOW_ENGINE_DEFAULT_CALENDAR_LINK") {
            self.engine.default_calendar_link = value;
        }

        let log_level =
            read_env("LEADFLOW_LOGGING_LEVEL").or_else(|| read_env("LEADFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEADFLOW_LOGGING_FORMAT").or_else(|| read_env("LEADFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(max_steps) = overrides.max_steps {
            self.engine.max_steps = max_steps;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_engine(&self.engine)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("leadflow.toml"), PathBuf::from("config/leadflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if matches!(llm.provider, LlmProvider::OpenAi | LlmProvider::Anthropic) {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required for openai/anthropic providers".to_string(),
            ));
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.max_steps == 0 || engine.max_steps > 500 {
        return Err(ConfigError::Validation(
            "engine.max_steps must be in range 1..=500".to_string(),
        ));
    }

    if !is_http_url(&engine.payment_link_base) {
        return Err(ConfigError::Validation(
            "engine.payment_link_base must start with http:// or https://".to_string(),
        ));
    }

    if !is_http_url(&engine.default_calendar_link) {
        return Err(ConfigError::Validation(
            "engine.default_calendar_link must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    max_steps: Option<u32>,
    payment_link_base: Option<String>,
    default_calendar_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_any_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.llm.provider == LlmProvider::Ollama, "default provider should be ollama")?;
        ensure(config.engine.max_steps == 40, "default step cap should be 40")?;
        ensure(
            config.engine.default_calendar_link == "https://calendly.com/demo",
            "default calendar link should be set",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_LEADFLOW_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("leadflow.toml");
            fs::write(
                &path,
                r#"
[llm]
provider = "openai"
api_key = "${TEST_LEADFLOW_API_KEY}"
base_url = "https://api.openai.com"
model = "gpt-4o-mini"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.provider == LlmProvider::OpenAi, "provider should come from file")?;
            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "sk-from-env")
                    == Some(true),
                "api key should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_LEADFLOW_API_KEY"]);
        result
    }

    #[test]
    fn switching_provider_without_base_url_uses_that_providers_endpoint() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LLM_API_KEY", "sk-test");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    llm_provider: Some(LlmProvider::OpenAi),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;
            ensure(config.llm.base_url.is_none(), "base url should stay unset")?;
            ensure(
                config.llm.resolved_base_url() == "https://api.openai.com",
                "openai should resolve to its hosted endpoint",
            )?;

            let ollama = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                ollama.llm.resolved_base_url() == "http://localhost:11434",
                "ollama should resolve to the local endpoint",
            )
        })();

        clear_vars(&["LEADFLOW_LLM_API_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LOG_LEVEL", "warn");
        env::set_var("LEADFLOW_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["LEADFLOW_LOG_LEVEL", "LEADFLOW_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LLM_MODEL", "model-from-env");
        env::set_var("LEADFLOW_ENGINE_MAX_STEPS", "25");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("leadflow.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "model-from-file"

[engine]
max_steps = 12
payment_link_base = "https://pay.example.com/links"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    max_steps: Some(60),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.max_steps == 60, "override step cap should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.llm.model == "model-from-env", "env model should win over file")?;
            ensure(
                config.engine.payment_link_base == "https://pay.example.com/links",
                "file payment link base should win over default",
            )?;
            Ok(())
        })();

        clear_vars(&["LEADFLOW_LLM_MODEL", "LEADFLOW_ENGINE_MAX_STEPS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LLM_PROVIDER", "anthropic");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("llm.api_key")
            );
            ensure(has_message, "validation failure should mention llm.api_key")
        })();

        clear_vars(&["LEADFLOW_LLM_PROVIDER"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_ENGINE_MAX_STEPS", "many");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "LEADFLOW_ENGINE_MAX_STEPS", "error should name the variable")
            }
            _ => Err("expected invalid env override error".to_string()),
        };

        clear_vars(&["LEADFLOW_ENGINE_MAX_STEPS"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["LEADFLOW_LLM_API_KEY"]);
        result
    }
}
