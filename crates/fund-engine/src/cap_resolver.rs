//! Shared-cap resolution with a per-session cache.

use std::sync::Arc;

use dashmap::DashMap;
use fund_domain::{FiscalYear, ResolvedCap, TierCode};

use crate::{ports::RewardConfigSource, CoreError};

/// Resolves the ceiling that jointly bounds revision and publication fees.
///
/// A missing configuration resolves to [`ResolvedCap::unconfigured`], which
/// callers treat as "ineligible". Results are cached per (year, tier);
/// source errors are not cached.
pub struct CapResolver {
    source: Arc<dyn RewardConfigSource>,
    cache: DashMap<(FiscalYear, TierCode), ResolvedCap>,
}

impl CapResolver {
    pub fn new(source: Arc<dyn RewardConfigSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    pub fn resolve_cap(
        &self,
        fiscal_year: FiscalYear,
        tier: TierCode,
    ) -> Result<ResolvedCap, CoreError> {
        if let Some(cached) = self.cache.get(&(fiscal_year, tier)) {
            return Ok(*cached);
        }
        let resolved = match self.source.lookup_shared_cap(fiscal_year, tier)? {
            Some(max_amount) => ResolvedCap::configured(max_amount),
            None => {
                tracing::debug!(fiscal_year, %tier, "no shared cap configured; revision and publication fees are ineligible");
                ResolvedCap::unconfigured()
            }
        };
        self.cache.insert((fiscal_year, tier), resolved);
        Ok(resolved)
    }

    /// Drops cached results, e.g. when a review session ends.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticCapSource;
    use fund_domain::{Money, SharedCap};

    fn source() -> Arc<StaticCapSource> {
        Arc::new(StaticCapSource::new([SharedCap {
            fiscal_year: 2025,
            tier: TierCode::Q1,
            max_amount: Money::from_major(20_000),
        }]))
    }

    #[test]
    fn resolves_configured_and_missing_caps() {
        let resolver = CapResolver::new(source());
        assert_eq!(
            resolver.resolve_cap(2025, TierCode::Q1).unwrap(),
            ResolvedCap::configured(Money::from_major(20_000))
        );
        let missing = resolver.resolve_cap(2025, TierCode::Q4).unwrap();
        assert!(!missing.found);
        assert_eq!(missing.max_amount, Money::ZERO);
    }

    #[test]
    fn caches_per_year_and_tier() {
        let source = source();
        let resolver = CapResolver::new(source.clone());
        for _ in 0..3 {
            resolver.resolve_cap(2025, TierCode::Q1).unwrap();
            resolver.resolve_cap(2026, TierCode::Q1).unwrap();
        }
        assert_eq!(source.lookups(), 2);
        resolver.invalidate();
        resolver.resolve_cap(2025, TierCode::Q1).unwrap();
        assert_eq!(source.lookups(), 3);
    }
}
