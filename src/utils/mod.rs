pub mod build_info;

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when neither `RUST_LOG` nor a configured filter is usable.
pub const DEFAULT_LOG_FILTER: &str = "fund_core=info,fund_engine=info";

static ACTIVE_FILTER: OnceCell<String> = OnceCell::new();

/// Initializes the global tracing subscriber. `RUST_LOG` wins over
/// `configured`; an unparsable directive falls back to the default.
/// Only the first call has an effect.
pub fn init_tracing_with(configured: &str) {
    ACTIVE_FILTER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let description = filter.to_string();
        // A subscriber installed by the host application takes precedence.
        let _ = fmt().with_env_filter(filter).try_init();
        description
    });
}

/// The filter installed by the first [`init_tracing_with`] call.
pub fn active_filter() -> Option<&'static str> {
    ACTIVE_FILTER.get().map(String::as_str)
}
