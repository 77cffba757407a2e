//! Base reward rates keyed by author role and tier.

use std::collections::HashMap;

use fund_domain::{AuthorRole, Money, TierCode};
use serde::{Deserialize, Serialize};

/// Result of a rate lookup. Unknown combinations yield zero with
/// `configured == false`; this is a policy gap, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLookup {
    pub amount: Money,
    pub configured: bool,
}

/// Static table of base rewards.
#[derive(Debug, Clone, Default)]
pub struct RewardTable {
    rates: HashMap<(AuthorRole, TierCode), Money>,
}

impl RewardTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rates(rates: impl IntoIterator<Item = (AuthorRole, TierCode, Money)>) -> Self {
        Self {
            rates: rates
                .into_iter()
                .map(|(role, tier, amount)| ((role, tier), amount))
                .collect(),
        }
    }

    pub fn base_reward(&self, role: AuthorRole, tier: TierCode) -> RewardLookup {
        match self.rates.get(&(role, tier)) {
            Some(amount) => RewardLookup {
                amount: *amount,
                configured: true,
            },
            None => RewardLookup {
                amount: Money::ZERO,
                configured: false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
