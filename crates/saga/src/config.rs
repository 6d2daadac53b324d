//! Coordinator configuration loaded from environment variables.

use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Coordinator configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ORDER_LOCK_TIMEOUT_MS` — max wait for the per-order lock (default: `5000`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub lock_timeout: Duration,
}

impl CoordinatorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lock_timeout_ms = lookup("ORDER_LOCK_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);

        Self {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}
