//! Gateway tool registry.
//!
//! Tool implementations live in `qbridge-agent`; this module only decides
//! which of them the server exposes and how they are configured.

use std::sync::Arc;

use qbridge_agent::tools::q_developer::QDeveloperTool;
use qbridge_agent::tools::ToolRegistry;

/// Build the registry served over MCP. `q_command` is the Q CLI program.
pub fn build_registry(q_command: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(QDeveloperTool::new(q_command)));
    registry
}

/// Whether `command` resolves to an executable on `PATH`.
pub fn is_command_available(command: &str) -> bool {
    which::which(command).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_q_developer() {
        let registry = build_registry("q");
        assert_eq!(registry.names(), vec!["q-developer-agent"]);
    }

    #[cfg(unix)]
    #[test]
    fn availability_check() {
        assert!(is_command_available("sh"));
        assert!(!is_command_available("qbridge-test-no-such-binary"));
    }
}
