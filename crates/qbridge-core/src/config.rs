use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_NAME: &str = "qbridge";
pub const DEFAULT_Q_COMMAND: &str = "q";
/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "QBRIDGE_CONFIG";

/// Top-level config (qbridge.toml + QBRIDGE_* env overrides).
///
/// Per-invocation limits and the tool enablement gate are deliberately not
/// part of this struct; they are read from the environment on every call
/// (see [`crate::limits`] and [`crate::env`]).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QbridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub q_cli: QCliConfig,
}

/// Identity advertised in the MCP `initialize` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_server_version")]
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

/// How to reach the Q Developer CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QCliConfig {
    /// Program name or absolute path. Resolved on `PATH` when relative.
    #[serde(default = "default_q_command")]
    pub command: String,
}

impl Default for QCliConfig {
    fn default() -> Self {
        Self {
            command: default_q_command(),
        }
    }
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}
fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
fn default_q_command() -> String {
    DEFAULT_Q_COMMAND.to_string()
}

impl QbridgeConfig {
    /// Load config from a TOML file with QBRIDGE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.qbridge/qbridge.toml
    ///
    /// A missing file is not an error; compiled defaults fill every field.
    /// Nested keys use a double underscore: `QBRIDGE_Q_CLI__COMMAND=/opt/q`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(QbridgeConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("QBRIDGE_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.qbridge/qbridge.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let missing = jail.directory().join("nope.toml");
            let config = QbridgeConfig::load(missing.to_str()).expect("load");
            assert_eq!(config.q_cli.command, "q");
            assert_eq!(config.server.name, "qbridge");
            assert_eq!(config.server.version, env!("CARGO_PKG_VERSION"));
            Ok(())
        });
    }

    #[test]
    fn file_values_are_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "qbridge.toml",
                r#"
                [server]
                name = "devtools"

                [q_cli]
                command = "/opt/amazon-q/bin/q"
                "#,
            )?;
            let config = QbridgeConfig::load(Some("qbridge.toml")).expect("load");
            assert_eq!(config.server.name, "devtools");
            assert_eq!(config.q_cli.command, "/opt/amazon-q/bin/q");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("qbridge.toml", "[q_cli]\ncommand = \"q\"\n")?;
            jail.set_env("QBRIDGE_Q_CLI__COMMAND", "q-nightly");
            let config = QbridgeConfig::load(Some("qbridge.toml")).expect("load");
            assert_eq!(config.q_cli.command, "q-nightly");
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("qbridge.toml", "[q_cli\ncommand = ")?;
            let err = QbridgeConfig::load(Some("qbridge.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }
}
