//! Service tier enumeration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Service tier determining quota and provider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Paid,
}

impl Tier {
    /// Parse from string (case-insensitive). Unknown values fall back to free.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "paid" => Tier::Paid,
            _ => Tier::Free,
        }
    }

    /// Get the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Paid => "paid",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
