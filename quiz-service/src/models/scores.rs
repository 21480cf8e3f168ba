use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category sub-scores and their total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub trigger: u16,
    pub recovery: u16,
    pub baseline: u16,
    pub total: u16,
}

impl Scores {
    /// True when `total` is the sum of the three sub-scores.
    pub fn is_consistent(&self) -> bool {
        u32::from(self.trigger) + u32::from(self.recovery) + u32::from(self.baseline)
            == u32::from(self.total)
    }
}

/// Binary quiz outcome. Always derived from [`Scores`], never stored on its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Sensitized,
    NotSensitized,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Sensitized => "sensitized",
            Classification::NotSensitized => "not_sensitized",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sensitized" => Ok(Classification::Sensitized),
            "not_sensitized" => Ok(Classification::NotSensitized),
            other => Err(format!("unknown result '{}'", other)),
        }
    }
}
