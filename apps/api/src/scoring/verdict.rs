use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorical tier attached to every analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
    /// One or both documents could not be parsed.
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::High => "High",
            Verdict::Medium => "Medium",
            Verdict::Low => "Low",
            Verdict::Error => "Error",
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Verdict::High),
            "Medium" => Ok(Verdict::Medium),
            "Low" => Ok(Verdict::Low),
            "Error" => Ok(Verdict::Error),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("high threshold {0} exceeds 100")]
    HighOutOfRange(u8),

    #[error("medium threshold {medium} is above high threshold {high}")]
    MediumAboveHigh { medium: u8, high: u8 },
}

/// Fixed score thresholds. Each tier includes its lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictPolicy {
    high: u8,
    medium: u8,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            high: Self::DEFAULT_HIGH,
            medium: Self::DEFAULT_MEDIUM,
        }
    }
}

impl VerdictPolicy {
    pub const DEFAULT_HIGH: u8 = 75;
    pub const DEFAULT_MEDIUM: u8 = 50;

    pub fn new(high: u8, medium: u8) -> Result<Self, PolicyError> {
        if high > 100 {
            return Err(PolicyError::HighOutOfRange(high));
        }
        if medium > high {
            return Err(PolicyError::MediumAboveHigh { medium, high });
        }
        Ok(Self { high, medium })
    }

    /// Maps a 0–100 relevance score to High / Medium / Low.
    pub fn tier(&self, score: u8) -> Verdict {
        if score >= self.high {
            Verdict::High
        } else if score >= self.medium {
            Verdict::Medium
        } else {
            Verdict::Low
        }
    }
}
