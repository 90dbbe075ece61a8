//! Runtime configuration for registries.
//!
//! Centralizes the environment toggles read when the process-wide registry is
//! first touched, so isolated registries and the global one share the same
//! option type.

use std::env;

/// Enables overwrite warnings on the global registry.
pub const WARN_ON_OVERWRITE_ENV: &str = "TAGDISPATCH_WARN_ON_OVERWRITE";

/// Behavior flags for a [`crate::Registry`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegistryOptions {
    /// Log at warn level when a registration replaces an existing factory.
    /// The replacement still happens.
    pub warn_on_overwrite: bool,
}

impl RegistryOptions {
    /// Options derived from the process environment.
    pub fn from_env() -> Self {
        Self::from_flag(WARN_ON_OVERWRITE_ENV)
    }

    fn from_flag(warn_var: &str) -> Self {
        Self {
            warn_on_overwrite: env_flag(warn_var),
        }
    }
}

/// Whether an env toggle is switched on.
///
/// Any non-blank value other than `0` counts as on.
pub fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| flag_value(&v)).unwrap_or(false)
}

fn flag_value(raw: &str) -> bool {
    !raw.trim().is_empty() && raw.trim() != "0"
}
