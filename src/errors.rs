use fund_config::ConfigError;
use fund_domain::{DecisionInputError, MoneyParseError};
use fund_engine::CoreError;
use thiserror::Error;

/// Error type surfaced by the facade.
#[derive(Debug, Error)]
pub enum FundError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyParseError),
}

impl From<DecisionInputError> for FundError {
    fn from(err: DecisionInputError) -> Self {
        FundError::Core(err.into())
    }
}

impl FundError {
    /// The engine error, when this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            FundError::Core(err) => Some(err),
            _ => None,
        }
    }
}
