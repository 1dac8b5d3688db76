//! Environment access and the optional-tool enablement gate.
//!
//! Every environment read goes through [`EnvSource`] so callers can hand a
//! fixed snapshot to the resolvers in tests instead of mutating the process
//! environment.

use std::collections::HashMap;

/// Environment variable listing the optional tools that may run.
pub const ENABLE_ADDITIONAL_TOOLS_ENV: &str = "ENABLE_ADDITIONAL_TOOLS";

/// Read-only view of environment-style settings.
pub trait EnvSource: Send + Sync {
    /// Return the raw value for `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment, read on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Tool identifiers listed in [`ENABLE_ADDITIONAL_TOOLS_ENV`].
///
/// Entries may be separated by commas, semicolons or whitespace; empty
/// entries are dropped and the rest lowercased.
pub fn enabled_tools(env: &dyn EnvSource) -> Vec<String> {
    env.var(ENABLE_ADDITIONAL_TOOLS_ENV)
        .map(|raw| {
            raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `tool` appears in the enablement list (case-insensitive).
pub fn is_tool_enabled(env: &dyn EnvSource, tool: &str) -> bool {
    let wanted = tool.to_lowercase();
    enabled_tools(env).iter().any(|t| *t == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(value: &str) -> HashMap<String, String> {
        HashMap::from([(ENABLE_ADDITIONAL_TOOLS_ENV.to_string(), value.to_string())])
    }

    #[test]
    fn unset_gate_enables_nothing() {
        let env = HashMap::new();
        assert!(enabled_tools(&env).is_empty());
        assert!(!is_tool_enabled(&env, "q-developer-agent"));
    }

    #[test]
    fn single_entry_matches() {
        let env = env_with("q-developer-agent");
        assert!(is_tool_enabled(&env, "q-developer-agent"));
    }

    #[test]
    fn mixed_separators_and_padding() {
        let env = env_with(" sbom ,q-developer-agent;  memory\tthink ");
        assert_eq!(
            enabled_tools(&env),
            vec!["sbom", "q-developer-agent", "memory", "think"]
        );
        assert!(is_tool_enabled(&env, "think"));
    }

    #[test]
    fn match_is_case_insensitive() {
        let env = env_with("Q-Developer-Agent");
        assert!(is_tool_enabled(&env, "q-developer-agent"));
    }

    #[test]
    fn prefix_is_not_a_match() {
        let env = env_with("q-developer");
        assert!(!is_tool_enabled(&env, "q-developer-agent"));
    }
}
