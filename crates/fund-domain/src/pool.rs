//! Budget pools keyed by subcategory and tier, plus resolved shared caps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{common::FiscalYear, money::Money, tier::TierCode};

/// Identity of a budget pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub subcategory_id: Uuid,
    pub tier: TierCode,
}

impl PoolKey {
    pub fn new(subcategory_id: Uuid, tier: TierCode) -> Self {
        Self {
            subcategory_id,
            tier,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subcategory_id, self.tier)
    }
}

/// Rejected pool mutation. The pool is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolMutationError {
    #[error("amount {0} is negative")]
    NegativeAmount(Money),
    #[error("requested {requested} but only {remaining} remains")]
    Insufficient { requested: Money, remaining: Money },
    #[error("cannot release {requested}; only {allocated} is allocated")]
    ExceedsAllocated { requested: Money, allocated: Money },
}

/// A finite allocation budget.
///
/// `remaining_budget == total_budget - allocated_budget` and
/// `remaining_budget >= 0` hold after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPool {
    pub subcategory_id: Uuid,
    pub tier: TierCode,
    pub total_budget: Money,
    pub allocated_budget: Money,
    pub remaining_budget: Money,
    pub updated_at: DateTime<Utc>,
}

impl BudgetPool {
    pub fn new(subcategory_id: Uuid, tier: TierCode, total_budget: Money) -> Self {
        Self {
            subcategory_id,
            tier,
            total_budget,
            allocated_budget: Money::ZERO,
            remaining_budget: total_budget,
            updated_at: Utc::now(),
        }
    }

    pub fn key(&self) -> PoolKey {
        PoolKey::new(self.subcategory_id, self.tier)
    }

    pub fn is_consistent(&self) -> bool {
        !self.remaining_budget.is_negative()
            && !self.allocated_budget.is_negative()
            && self.total_budget.checked_sub(self.allocated_budget) == Some(self.remaining_budget)
    }

    pub fn can_cover(&self, amount: Money) -> bool {
        !amount.is_negative() && amount <= self.remaining_budget
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_budget <= Money::ZERO
    }

    pub fn apply_commit(&mut self, amount: Money) -> Result<(), PoolMutationError> {
        if amount.is_negative() {
            return Err(PoolMutationError::NegativeAmount(amount));
        }
        if amount > self.remaining_budget {
            return Err(PoolMutationError::Insufficient {
                requested: amount,
                remaining: self.remaining_budget,
            });
        }
        self.allocated_budget += amount;
        self.remaining_budget -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn apply_release(&mut self, amount: Money) -> Result<(), PoolMutationError> {
        if amount.is_negative() {
            return Err(PoolMutationError::NegativeAmount(amount));
        }
        if amount > self.allocated_budget {
            return Err(PoolMutationError::ExceedsAllocated {
                requested: amount,
                allocated: self.allocated_budget,
            });
        }
        self.allocated_budget -= amount;
        self.remaining_budget += amount;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Configured ceiling shared by the revision and publication fee lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedCap {
    pub fiscal_year: FiscalYear,
    pub tier: TierCode,
    pub max_amount: Money,
}

/// Outcome of a cap lookup. `found == false` means the two shared lines are
/// ineligible, never unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCap {
    pub max_amount: Money,
    pub found: bool,
}

impl ResolvedCap {
    pub fn configured(max_amount: Money) -> Self {
        Self {
            max_amount,
            found: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            max_amount: Money::ZERO,
            found: false,
        }
    }
}
