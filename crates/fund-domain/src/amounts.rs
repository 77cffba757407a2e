//! Amount breakdowns shared by requests and approvals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// The money lines a submission can request or be approved for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountSet {
    pub reward: Money,
    pub revision: Money,
    pub publication: Money,
    #[serde(default)]
    pub other: Money,
}

impl AmountSet {
    pub fn new(reward: Money, revision: Money, publication: Money, other: Money) -> Self {
        Self {
            reward,
            revision,
            publication,
            other,
        }
    }

    /// Amount for a general fund request, which only uses the `other` line.
    pub fn general(other: Money) -> Self {
        Self {
            other,
            ..Self::default()
        }
    }

    pub fn get(&self, field: AmountField) -> Money {
        match field {
            AmountField::Reward => self.reward,
            AmountField::Revision => self.revision,
            AmountField::Publication => self.publication,
            AmountField::Other => self.other,
        }
    }

    /// Revision and publication fees, which share one cap.
    pub fn shared_cap_total(&self) -> Money {
        self.revision + self.publication
    }

    pub fn total(&self) -> Money {
        self.reward + self.revision + self.publication + self.other
    }

    /// Returns the first negative line, if any.
    pub fn first_negative(&self) -> Option<AmountField> {
        AmountField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_negative())
    }
}

/// Identifies a single money line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    Reward,
    Revision,
    Publication,
    Other,
}

impl AmountField {
    pub const ALL: [AmountField; 4] = [
        AmountField::Reward,
        AmountField::Revision,
        AmountField::Publication,
        AmountField::Other,
    ];
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AmountField::Reward => "reward",
            AmountField::Revision => "revision fee",
            AmountField::Publication => "publication fee",
            AmountField::Other => "other",
        };
        f.write_str(label)
    }
}
