use std::collections::HashSet;

use fund_domain::{AuthorRole, FiscalYear, Money, SharedCap, TierCode};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Engine settings persisted as JSON. Amounts are stored in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub currency: String,
    #[serde(default = "EngineConfig::default_reward_rates")]
    pub reward_rates: Vec<RewardRate>,
    /// Empty by default: fees stay at zero until a cap is configured.
    #[serde(default)]
    pub shared_caps: Vec<SharedCap>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default = "EngineConfig::default_log_filter")]
    pub log_filter: String,
}

/// Base reward for one author role and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRate {
    pub author_role: AuthorRole,
    pub tier: TierCode,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "NotificationSettings::default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
        }
    }
}

impl NotificationSettings {
    pub fn default_max_attempts() -> u32 {
        3
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: "THB".into(),
            reward_rates: Self::default_reward_rates(),
            shared_caps: Vec::new(),
            notifications: NotificationSettings::default(),
            log_filter: Self::default_log_filter(),
        }
    }
}

impl EngineConfig {
    pub fn default_log_filter() -> String {
        "fund_core=info,fund_engine=info".into()
    }

    /// Standard rate sheet; both author roles earn the same base reward.
    pub fn default_reward_rates() -> Vec<RewardRate> {
        const SHEET: [(TierCode, i64); 8] = [
            (TierCode::Top5, 65_000),
            (TierCode::Top10, 50_000),
            (TierCode::Q1, 40_000),
            (TierCode::Q2, 30_000),
            (TierCode::Q3, 20_000),
            (TierCode::Q4, 10_000),
            (TierCode::Tci1, 5_000),
            (TierCode::Tci2, 3_000),
        ];
        [AuthorRole::FirstAuthor, AuthorRole::CorrespondingAuthor]
            .into_iter()
            .flat_map(|author_role| {
                SHEET.iter().map(move |(tier, major)| RewardRate {
                    author_role,
                    tier: *tier,
                    amount: Money::from_major(*major),
                })
            })
            .collect()
    }

    pub fn shared_cap(&self, fiscal_year: FiscalYear, tier: TierCode) -> Option<Money> {
        self.shared_caps
            .iter()
            .find(|cap| cap.fiscal_year == fiscal_year && cap.tier == tier)
            .map(|cap| cap.max_amount)
    }

    /// Sets or replaces the cap for a year and tier.
    pub fn set_shared_cap(&mut self, fiscal_year: FiscalYear, tier: TierCode, max_amount: Money) {
        match self
            .shared_caps
            .iter_mut()
            .find(|cap| cap.fiscal_year == fiscal_year && cap.tier == tier)
        {
            Some(existing) => existing.max_amount = max_amount,
            None => self.shared_caps.push(SharedCap {
                fiscal_year,
                tier,
                max_amount,
            }),
        }
    }

    pub fn rate_entries(&self) -> impl Iterator<Item = (AuthorRole, TierCode, Money)> + '_ {
        self.reward_rates
            .iter()
            .map(|rate| (rate.author_role, rate.tier, rate.amount))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        if self.notifications.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "notifications.max_attempts must be at least 1".into(),
            ));
        }
        let mut seen = HashSet::new();
        for rate in &self.reward_rates {
            if rate.amount.is_negative() {
                return Err(ConfigError::Invalid(format!(
                    "reward rate for {} / {} is negative",
                    rate.author_role, rate.tier
                )));
            }
            if !seen.insert((rate.author_role, rate.tier)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate reward rate for {} / {}",
                    rate.author_role, rate.tier
                )));
            }
        }
        let mut seen = HashSet::new();
        for cap in &self.shared_caps {
            if cap.max_amount.is_negative() {
                return Err(ConfigError::Invalid(format!(
                    "shared cap for {} / {} is negative",
                    cap.fiscal_year, cap.tier
                )));
            }
            if !seen.insert((cap.fiscal_year, cap.tier)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate shared cap for {} / {}",
                    cap.fiscal_year, cap.tier
                )));
            }
        }
        Ok(())
    }
}
