/// Revision and profile the engine was compiled from, embedded by `build.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub revision: &'static str,
    pub built_on: &'static str,
    pub profile: &'static str,
}

pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        revision: option_env!("FUND_CORE_REVISION").unwrap_or("unknown"),
        built_on: option_env!("FUND_CORE_BUILT_ON").unwrap_or("unknown"),
        profile: option_env!("FUND_CORE_PROFILE").unwrap_or("unknown"),
    }
}

impl BuildMetadata {
    /// Logged once when tracing starts.
    pub fn summary(&self) -> String {
        format!(
            "fund_core {} ({}, {} build of {})",
            self.version, self.revision, self.profile, self.built_on
        )
    }
}
