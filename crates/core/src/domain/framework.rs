use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantConfigError;

/// Sales-qualification methodology that decides which question bank is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalesFramework {
    Bant,
    Spin,
    Meddic,
    /// Reserved. Parses, but shares the BANT question bank and is never picked by industry.
    Chant,
}

impl SalesFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bant => "BANT",
            Self::Spin => "SPIN",
            Self::Meddic => "MEDDIC",
            Self::Chant => "CHANT",
        }
    }

    /// Default framework for an industry when the tenant expresses no preference.
    pub fn for_industry(industry: Option<&str>) -> Self {
        let normalized = industry.map(|value| value.trim().to_ascii_lowercase());
        match normalized.as_deref() {
            Some("technology" | "saas" | "enterprise") => Self::Meddic,
            Some("healthcare" | "finance") => Self::Bant,
            _ => Self::Spin,
        }
    }
}

impl fmt::Display for SalesFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesFramework {
    type Err = TenantConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BANT" => Ok(Self::Bant),
            "SPIN" => Ok(Self::Spin),
            "MEDDIC" => Ok(Self::Meddic),
            "CHANT" => Ok(Self::Chant),
            _ => Err(TenantConfigError::UnknownFramework(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SalesFramework;
    use crate::domain::tenant::TenantConfigError;

    #[test]
    fn industry_rule_picks_meddic_for_technology_buyers() {
        assert_eq!(SalesFramework::for_industry(Some("technology")), SalesFramework::Meddic);
        assert_eq!(SalesFramework::for_industry(Some(" SaaS ")), SalesFramework::Meddic);
        assert_eq!(SalesFramework::for_industry(Some("enterprise")), SalesFramework::Meddic);
    }

    #[test]
    fn industry_rule_picks_bant_for_regulated_industries() {
        assert_eq!(SalesFramework::for_industry(Some("healthcare")), SalesFramework::Bant);
        assert_eq!(SalesFramework::for_industry(Some("Finance")), SalesFramework::Bant);
    }

    #[test]
    fn industry_rule_defaults_to_spin() {
        assert_eq!(SalesFramework::for_industry(Some("retail")), SalesFramework::Spin);
        assert_eq!(SalesFramework::for_industry(None), SalesFramework::Spin);
    }

    #[test]
    fn parses_case_insensitively_and_rejects_unknown_names() {
        assert_eq!("meddic".parse::<SalesFramework>(), Ok(SalesFramework::Meddic));
        assert_eq!("CHANT".parse::<SalesFramework>(), Ok(SalesFramework::Chant));

        let error = "SANDLER".parse::<SalesFramework>().expect_err("unknown framework");
        assert_eq!(error, TenantConfigError::UnknownFramework("SANDLER".to_string()));
    }
}
