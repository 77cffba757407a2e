#![doc(test(attr(deny(warnings))))]

//! Fund Core reviews academic fund and publication-reward applications:
//! it computes entitlements, enforces shared fee caps, commits approvals
//! against per-tier budget pools and merges attachments for reviewers.

pub mod caps;
pub mod errors;
pub mod review;
pub mod utils;

pub use fund_config as config;
pub use fund_domain as domain;
pub use fund_engine as engine;
pub use fund_storage_json as storage;

pub use caps::ConfigCapSource;
pub use errors::FundError;
pub use review::{EngineParts, ReviewEngine};

use std::sync::Once;

use fund_config::EngineConfig;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    start(utils::DEFAULT_LOG_FILTER);
}

/// Initializes global tracing with the configured `log_filter`. `RUST_LOG`
/// still takes precedence. Only the first initialization has an effect.
pub fn init_with(config: &EngineConfig) {
    start(&config.log_filter);
}

fn start(filter: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing_with(filter);
        tracing::info!(
            build = %utils::build_info::current().summary(),
            filter = utils::active_filter().unwrap_or_default(),
            "Fund Core tracing initialized."
        );
    });
}
