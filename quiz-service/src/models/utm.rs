use serde::{Deserialize, Serialize};

/// Campaign attribution carried from the landing link to the stored response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmAttribution {
    pub source: Option<String>,
    pub campaign: Option<String>,
}

impl UtmAttribution {
    /// Blank values are treated as absent.
    pub fn new(source: Option<String>, campaign: Option<String>) -> Self {
        Self {
            source: non_blank(source),
            campaign: non_blank(campaign),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
