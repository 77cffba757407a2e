//! Budget pools and the only code path that mutates them.
//!
//! Each pool sits behind its own mutex. A commit re-checks availability while
//! holding that mutex, persists the staged pool, and only then publishes the
//! new balance, so concurrent approvals against one pool serialize and can
//! never overdraw it.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use fund_domain::{BudgetPool, Money, PoolKey, PoolMutationError, TierCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ports::PoolStore, CoreError};

/// Result of a per-tier coverage check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullAvailability {
    pub is_fully_available: bool,
    pub missing_tiers: Vec<TierCode>,
}

pub struct BudgetLedger {
    pools: DashMap<PoolKey, Arc<Mutex<BudgetPool>>>,
    store: Option<Arc<dyn PoolStore>>,
}

impl Default for BudgetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BudgetLedger {
    /// Ledger without persistence; pools live only in memory.
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            store: None,
        }
    }

    /// Ledger that writes every mutated pool through `store`.
    pub fn with_store(store: Arc<dyn PoolStore>) -> Self {
        Self {
            pools: DashMap::new(),
            store: Some(store),
        }
    }

    /// Registers a pool created by the external budget configuration.
    pub fn configure_pool(&self, pool: BudgetPool) -> Result<(), CoreError> {
        if !pool.is_consistent() {
            return Err(CoreError::Validation(format!(
                "pool {} is inconsistent: total {}, allocated {}, remaining {}",
                pool.key(),
                pool.total_budget,
                pool.allocated_budget,
                pool.remaining_budget
            )));
        }
        let key = pool.key();
        let Entry::Vacant(slot) = self.pools.entry(key) else {
            return Err(CoreError::Validation(format!(
                "pool {key} is already configured"
            )));
        };
        if let Some(store) = &self.store {
            store.save_pool(&pool)?;
        }
        tracing::info!(pool = %key, total = %pool.total_budget, "budget pool configured");
        slot.insert(Arc::new(Mutex::new(pool)));
        Ok(())
    }

    /// Loads (or reloads) every pool of a subcategory from the store.
    pub fn load_subcategory(&self, subcategory_id: Uuid) -> Result<usize, CoreError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CoreError::Storage("ledger has no pool store".into()))?;
        let pools = store.load_pools(subcategory_id)?;
        let count = pools.len();
        for pool in pools {
            let key = pool.key();
            match self.pools.get(&key).map(|slot| Arc::clone(slot.value())) {
                Some(slot) => *slot.lock() = pool,
                None => {
                    self.pools.insert(key, Arc::new(Mutex::new(pool)));
                }
            }
        }
        tracing::debug!(%subcategory_id, count, "loaded budget pools");
        Ok(count)
    }

    /// Snapshot of a single pool.
    pub fn pool(&self, subcategory_id: Uuid, tier: TierCode) -> Option<BudgetPool> {
        self.slot(&PoolKey::new(subcategory_id, tier))
            .map(|slot| slot.lock().clone())
    }

    /// Snapshots of every pool registered for a subcategory, ordered by tier.
    pub fn pools_for(&self, subcategory_id: Uuid) -> Vec<BudgetPool> {
        let slots: Vec<Arc<Mutex<BudgetPool>>> = self
            .pools
            .iter()
            .filter(|entry| entry.key().subcategory_id == subcategory_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut pools: Vec<BudgetPool> = slots.iter().map(|slot| slot.lock().clone()).collect();
        pools.sort_by_key(|pool| pool.tier);
        pools
    }

    /// `amount <= remaining_budget`; false for unknown pools. Read-only.
    pub fn check_availability(&self, subcategory_id: Uuid, tier: TierCode, amount: Money) -> bool {
        self.slot(&PoolKey::new(subcategory_id, tier))
            .map(|slot| slot.lock().can_cover(amount))
            .unwrap_or(false)
    }

    /// Verifies every expected tier has a pool with money left.
    pub fn check_full_availability(
        &self,
        subcategory_id: Uuid,
        expected_tiers: &[TierCode],
    ) -> FullAvailability {
        let missing_tiers: Vec<TierCode> = expected_tiers
            .iter()
            .copied()
            .filter(|tier| {
                self.slot(&PoolKey::new(subcategory_id, *tier))
                    .map(|slot| slot.lock().is_exhausted())
                    .unwrap_or(true)
            })
            .collect();
        FullAvailability {
            is_fully_available: missing_tiers.is_empty(),
            missing_tiers,
        }
    }

    /// Like [`Self::check_full_availability`], reported as `MissingBudgetTier`.
    pub fn require_full_availability(
        &self,
        subcategory_id: Uuid,
        expected_tiers: &[TierCode],
    ) -> Result<(), CoreError> {
        let availability = self.check_full_availability(subcategory_id, expected_tiers);
        if availability.is_fully_available {
            Ok(())
        } else {
            Err(CoreError::MissingBudgetTier {
                subcategory: subcategory_id,
                missing: availability.missing_tiers,
            })
        }
    }

    /// Allocates `amount` from the pool. Availability is re-checked under the
    /// pool lock; failure leaves the pool untouched.
    pub fn commit(
        &self,
        subcategory_id: Uuid,
        tier: TierCode,
        amount: Money,
    ) -> Result<BudgetPool, CoreError> {
        let key = PoolKey::new(subcategory_id, tier);
        let pool = self.mutate(key, |pool| pool.apply_commit(amount))?;
        tracing::info!(pool = %key, %amount, remaining = %pool.remaining_budget, "budget committed");
        Ok(pool)
    }

    /// Returns `amount` to the pool. Used when an approval is corrected.
    pub fn release(
        &self,
        subcategory_id: Uuid,
        tier: TierCode,
        amount: Money,
    ) -> Result<BudgetPool, CoreError> {
        let key = PoolKey::new(subcategory_id, tier);
        let pool = self.mutate(key, |pool| pool.apply_release(amount))?;
        tracing::info!(pool = %key, %amount, remaining = %pool.remaining_budget, "budget released");
        Ok(pool)
    }

    /// Releases `previous` and commits `replacement` as one critical section.
    pub fn reallocate(
        &self,
        subcategory_id: Uuid,
        tier: TierCode,
        previous: Money,
        replacement: Money,
    ) -> Result<BudgetPool, CoreError> {
        let key = PoolKey::new(subcategory_id, tier);
        let pool = self.mutate(key, |pool| {
            pool.apply_release(previous)?;
            pool.apply_commit(replacement)
        })?;
        tracing::info!(
            pool = %key,
            %previous,
            %replacement,
            remaining = %pool.remaining_budget,
            "budget reallocated"
        );
        Ok(pool)
    }

    fn slot(&self, key: &PoolKey) -> Option<Arc<Mutex<BudgetPool>>> {
        self.pools.get(key).map(|slot| Arc::clone(slot.value()))
    }

    fn mutate<F>(&self, key: PoolKey, op: F) -> Result<BudgetPool, CoreError>
    where
        F: FnOnce(&mut BudgetPool) -> Result<(), PoolMutationError>,
    {
        let slot = self.slot(&key).ok_or(CoreError::PoolNotFound(key))?;
        let mut pool = slot.lock();
        let mut staged = pool.clone();
        op(&mut staged).map_err(|err| CoreError::from_pool_mutation(key, err))?;
        if let Some(store) = &self.store {
            store.save_pool(&staged)?;
        }
        *pool = staged.clone();
        Ok(staged)
    }
}
