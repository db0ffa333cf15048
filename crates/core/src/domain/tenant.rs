use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::framework::SalesFramework;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Per-business options supplied by the caller. Read-only for the lifetime of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    #[serde(alias = "tenantId")]
    pub tenant_id: String,
    #[serde(alias = "preferredFramework")]
    pub preferred_framework: Option<String>,
    #[serde(alias = "paymentEnabled")]
    pub payment_enabled: bool,
    #[serde(alias = "calendarLink")]
    pub calendar_link: Option<String>,
    #[serde(alias = "productDescription")]
    pub product_description: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TenantConfigError {
    #[error("tenant_id is required")]
    MissingTenantId,
    #[error("unknown sales framework `{0}` (expected BANT|SPIN|MEDDIC|CHANT)")]
    UnknownFramework(String),
    #[error("calendar_link must start with http:// or https://, got `{0}`")]
    InvalidCalendarLink(String),
}

impl TenantConfig {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self { tenant_id: tenant_id.into(), ..Self::default() }
    }

    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.tenant_id.trim().to_string())
    }

    /// Tenant override for the framework, if any. Blank values count as unset.
    pub fn preferred_framework(&self) -> Result<Option<SalesFramework>, TenantConfigError> {
        match non_blank(self.preferred_framework.as_deref()) {
            Some(name) => name.parse().map(Some),
            None => Ok(None),
        }
    }

    pub fn calendar_link(&self) -> Option<&str> {
        non_blank(self.calendar_link.as_deref())
    }

    pub fn product_description(&self) -> Option<&str> {
        non_blank(self.product_description.as_deref())
    }

    pub fn validate(&self) -> Result<(), TenantConfigError> {
        if self.tenant_id.trim().is_empty() {
            return Err(TenantConfigError::MissingTenantId);
        }

        self.preferred_framework()?;

        if let Some(link) = self.calendar_link() {
            if !link.starts_with("http://") && !link.starts_with("https://") {
                return Err(TenantConfigError::InvalidCalendarLink(link.to_string()));
            }
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{TenantConfig, TenantConfigError};
    use crate::domain::framework::SalesFramework;

    #[test]
    fn accepts_camel_case_keys_from_callers() {
        let config: TenantConfig = serde_json::from_str(
            r#"{
                "tenantId": "demo_company",
                "preferredFramework": "MEDDIC",
                "paymentEnabled": true,
                "calendarLink": "https://calendly.com/demo-company",
                "productDescription": "AI-powered sales automation platform"
            }"#,
        )
        .expect("camelCase tenant config");

        assert_eq!(config.tenant_id, "demo_company");
        assert!(config.payment_enabled);
        assert_eq!(config.preferred_framework(), Ok(Some(SalesFramework::Meddic)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_tenant_id_is_a_configuration_error() {
        let config: TenantConfig = toml::from_str("payment_enabled = true").expect("toml");
        assert_eq!(config.validate(), Err(TenantConfigError::MissingTenantId));
    }

    #[test]
    fn unknown_framework_is_reported_not_ignored() {
        let config = TenantConfig {
            preferred_framework: Some("CHALLENGER".to_string()),
            ..TenantConfig::new("acme")
        };

        assert_eq!(
            config.validate(),
            Err(TenantConfigError::UnknownFramework("CHALLENGER".to_string()))
        );
    }

    #[test]
    fn blank_optional_values_count_as_unset() {
        let config = TenantConfig {
            preferred_framework: Some("  ".to_string()),
            calendar_link: Some(String::new()),
            ..TenantConfig::new("acme")
        };

        assert_eq!(config.preferred_framework(), Ok(None));
        assert_eq!(config.calendar_link(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn calendar_link_must_be_http() {
        let config = TenantConfig {
            calendar_link: Some("calendly.com/acme".to_string()),
            ..TenantConfig::new("acme")
        };

        assert!(matches!(config.validate(), Err(TenantConfigError::InvalidCalendarLink(_))));
    }
}
