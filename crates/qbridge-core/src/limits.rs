//! Per-invocation limits resolved from the environment.
//!
//! Both knobs are re-read on every call and fall back to the compiled
//! default when the value is unset, empty, non-numeric, zero or negative.
//! A bad value is never an error.

use tracing::warn;

use crate::env::EnvSource;

/// Execution timeout in seconds.
pub const AGENT_TIMEOUT_ENV: &str = "AGENT_TIMEOUT";
/// Maximum response size in bytes.
pub const AGENT_MAX_RESPONSE_SIZE_ENV: &str = "AGENT_MAX_RESPONSE_SIZE";

pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2 MiB

/// Limits that apply to a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLimits {
    pub timeout_secs: u64,
    pub max_response_bytes: usize,
}

impl ResolvedLimits {
    /// Resolve both limits from `env`.
    pub fn resolve(env: &dyn EnvSource) -> Self {
        Self {
            timeout_secs: resolve_timeout(env),
            max_response_bytes: resolve_max_response_size(env),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ResolvedLimits {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Timeout in seconds from [`AGENT_TIMEOUT_ENV`], or [`DEFAULT_TIMEOUT_SECS`].
pub fn resolve_timeout(env: &dyn EnvSource) -> u64 {
    positive_or_default(env, AGENT_TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS)
}

/// Byte budget from [`AGENT_MAX_RESPONSE_SIZE_ENV`], or [`DEFAULT_MAX_RESPONSE_BYTES`].
pub fn resolve_max_response_size(env: &dyn EnvSource) -> usize {
    let bytes = positive_or_default(
        env,
        AGENT_MAX_RESPONSE_SIZE_ENV,
        DEFAULT_MAX_RESPONSE_BYTES as u64,
    );
    usize::try_from(bytes).unwrap_or(DEFAULT_MAX_RESPONSE_BYTES)
}

fn positive_or_default(env: &dyn EnvSource, key: &str, default: u64) -> u64 {
    let raw = match env.var(key) {
        Some(v) if !v.trim().is_empty() => v,
        _ => return default,
    };

    // Parse signed first so "-60" is reported as non-positive rather than garbage.
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n as u64,
        Ok(n) => {
            warn!(key, value = n, default, "non-positive limit, using default");
            default
        }
        Err(e) => {
            warn!(key, value = %raw, default, error = %e, "unparseable limit, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let limits = ResolvedLimits::resolve(&HashMap::new());
        assert_eq!(limits.timeout_secs, 180);
        assert_eq!(limits.max_response_bytes, 2 * 1024 * 1024);
        assert_eq!(limits, ResolvedLimits::default());
    }

    #[test]
    fn custom_timeout_is_used() {
        let e = env(&[(AGENT_TIMEOUT_ENV, "300")]);
        assert_eq!(resolve_timeout(&e), 300);
    }

    #[test]
    fn non_numeric_timeout_falls_back() {
        let e = env(&[(AGENT_TIMEOUT_ENV, "not-a-number")]);
        assert_eq!(resolve_timeout(&e), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn zero_and_negative_timeout_fall_back() {
        assert_eq!(resolve_timeout(&env(&[(AGENT_TIMEOUT_ENV, "0")])), 180);
        assert_eq!(resolve_timeout(&env(&[(AGENT_TIMEOUT_ENV, "-60")])), 180);
    }

    #[test]
    fn empty_timeout_falls_back() {
        assert_eq!(resolve_timeout(&env(&[(AGENT_TIMEOUT_ENV, "")])), 180);
        assert_eq!(resolve_timeout(&env(&[(AGENT_TIMEOUT_ENV, "   ")])), 180);
    }

    #[test]
    fn padded_value_is_accepted() {
        assert_eq!(resolve_timeout(&env(&[(AGENT_TIMEOUT_ENV, " 45 ")])), 45);
    }

    #[test]
    fn custom_max_response_size() {
        let e = env(&[(AGENT_MAX_RESPONSE_SIZE_ENV, "1048576")]);
        assert_eq!(resolve_max_response_size(&e), 1_048_576);
    }

    #[test]
    fn invalid_max_response_size_falls_back() {
        for bad in ["invalid", "0", "-1", "1.5", "99999999999999999999999"] {
            let e = env(&[(AGENT_MAX_RESPONSE_SIZE_ENV, bad)]);
            assert_eq!(
                resolve_max_response_size(&e),
                DEFAULT_MAX_RESPONSE_BYTES,
                "value {bad:?} should fall back"
            );
        }
    }

    #[test]
    fn knobs_resolve_independently() {
        let e = env(&[
            (AGENT_TIMEOUT_ENV, "garbage"),
            (AGENT_MAX_RESPONSE_SIZE_ENV, "4096"),
        ]);
        let limits = ResolvedLimits::resolve(&e);
        assert_eq!(limits.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(limits.max_response_bytes, 4096);
    }

    #[test]
    fn every_call_rereads_the_environment() {
        let mut e = env(&[(AGENT_TIMEOUT_ENV, "10")]);
        assert_eq!(resolve_timeout(&e), 10);
        e.insert(AGENT_TIMEOUT_ENV.to_string(), "20".to_string());
        assert_eq!(resolve_timeout(&e), 20);
    }
}
