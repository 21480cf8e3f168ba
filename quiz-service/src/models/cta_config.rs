use serde::{Deserialize, Serialize};

/// Which call-to-action clients should render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaMode {
    #[default]
    Waitlist,
    Live,
}

/// Runtime CTA settings, stored as a single `settings` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaConfig {
    #[serde(default)]
    pub mode: CtaMode,
    #[serde(default)]
    pub button_url: Option<String>,
}

/// Settings key the CTA config lives under.
pub const CTA_CONFIG_KEY: &str = "cta_config";

/// Eligibility branch a respondent lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaType {
    Eligible,
    NotEligible,
}

impl CtaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaType::Eligible => "eligible",
            CtaType::NotEligible => "not_eligible",
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, CtaType::Eligible)
    }
}

impl std::str::FromStr for CtaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eligible" => Ok(CtaType::Eligible),
            "not_eligible" => Ok(CtaType::NotEligible),
            other => Err(format!("unknown cta type '{}'", other)),
        }
    }
}
