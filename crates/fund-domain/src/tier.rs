//! Tier codes that bucket budget pools, reward rates and shared caps.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Journal ranking tier, or `Default` for funds that are not tiered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierCode {
    Top5,
    Top10,
    Q1,
    Q2,
    Q3,
    Q4,
    Tci1,
    Tci2,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier code `{0}`")]
pub struct ParseTierError(pub String);

impl TierCode {
    pub const QUARTILES: [TierCode; 4] = [TierCode::Q1, TierCode::Q2, TierCode::Q3, TierCode::Q4];

    pub const ALL: [TierCode; 9] = [
        TierCode::Top5,
        TierCode::Top10,
        TierCode::Q1,
        TierCode::Q2,
        TierCode::Q3,
        TierCode::Q4,
        TierCode::Tci1,
        TierCode::Tci2,
        TierCode::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TierCode::Top5 => "Top5%",
            TierCode::Top10 => "Top10%",
            TierCode::Q1 => "Q1",
            TierCode::Q2 => "Q2",
            TierCode::Q3 => "Q3",
            TierCode::Q4 => "Q4",
            TierCode::Tci1 => "TCI1",
            TierCode::Tci2 => "TCI2",
            TierCode::Default => "default",
        }
    }
}

impl fmt::Display for TierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierCode {
    type Err = ParseTierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '%' | '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "top5" | "t5" => Ok(TierCode::Top5),
            "top10" | "t10" => Ok(TierCode::Top10),
            "q1" => Ok(TierCode::Q1),
            "q2" => Ok(TierCode::Q2),
            "q3" => Ok(TierCode::Q3),
            "q4" => Ok(TierCode::Q4),
            "tci1" => Ok(TierCode::Tci1),
            "tci2" => Ok(TierCode::Tci2),
            "default" => Ok(TierCode::Default),
            _ => Err(ParseTierError(value.to_string())),
        }
    }
}
