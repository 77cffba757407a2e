use std::collections::HashMap;

use fund_config::EngineConfig;
use fund_domain::{FiscalYear, Money, TierCode};
use fund_engine::{ports::RewardConfigSource, CoreError};

/// Serves shared caps from an [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigCapSource {
    caps: HashMap<(FiscalYear, TierCode), Money>,
}

impl ConfigCapSource {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            caps: config
                .shared_caps
                .iter()
                .map(|cap| ((cap.fiscal_year, cap.tier), cap.max_amount))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.caps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}

impl RewardConfigSource for ConfigCapSource {
    fn lookup_shared_cap(
        &self,
        fiscal_year: FiscalYear,
        tier: TierCode,
    ) -> Result<Option<Money>, CoreError> {
        Ok(self.caps.get(&(fiscal_year, tier)).copied())
    }
}
