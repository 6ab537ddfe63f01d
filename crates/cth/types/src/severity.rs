use crate::error::TypeParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal severity of a hyperedge event.
///
/// Totally ordered: `Normal < Warning < Error < Critical`. The numeric
/// weights (1..=4) feed the transition-probability model and the scope
/// severity aggregation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Numeric weight used in probability and scope calculations.
    pub fn weight(&self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Bucket a probability-weighted average weight back into a severity.
    ///
    /// Thresholds: `>= 3.5` critical, `>= 2.5` error, `>= 1.5` warning,
    /// otherwise normal.
    pub fn from_average_weight(avg: f64) -> Self {
        if avg >= 3.5 {
            Self::Critical
        } else if avg >= 2.5 {
            Self::Error
        } else if avg >= 1.5 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(TypeParseError::UnknownSeverity(other.to_string())),
        }
    }
}
