//! fund-config
//!
//! Engine configuration model: reward rates, shared caps, notification
//! retry limits and the log filter, plus JSON persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{ConfigManager, HOME_ENV};
pub use model::{EngineConfig, NotificationSettings, RewardRate};
