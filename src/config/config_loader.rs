/// Configuration loader for rs_webterm
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::info;

use crate::config::{ConfigError, TerminalConfig};

/// Prefix for environment overrides, e.g. `WEBTERM__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "WEBTERM";

/// Configuration loader responsible for layering defaults, the TOML file and
/// environment overrides
#[derive(Debug, Default)]
pub struct ConfigLoader {
    environment: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader that reads overrides from the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `vars` instead of the process environment
    pub fn with_environment(vars: HashMap<String, String>) -> Self {
        Self {
            environment: Some(vars),
        }
    }

    /// Load configuration.
    ///
    /// An explicit `config_path` must exist. Without one, `config.toml` in the
    /// working directory is used when present and silently skipped otherwise.
    pub fn load_config(&self, config_path: Option<&Path>) -> Result<TerminalConfig, ConfigError> {
        let (path, required) = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                }
                (path.to_path_buf(), true)
            }
            None => (default_config_path(), false),
        };
        info!("Loading configuration from file: {:?} (required: {})", path, required);

        let config = Config::builder()
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.environment.clone()),
            )
            .build()?
            .try_deserialize::<TerminalConfig>()?;

        validate(&config)?;
        info!("Configuration loaded successfully");
        Ok(config)
    }
}

fn validate(config: &TerminalConfig) -> Result<(), ConfigError> {
    if config.sessions.poll_interval_ms == 0 {
        return Err(ConfigError::InvalidStructure(
            "sessions.poll_interval_ms must be greater than zero".to_string(),
        ));
    }
    if config.sessions.read_chunk_size == 0 {
        return Err(ConfigError::InvalidStructure(
            "sessions.read_chunk_size must be greater than zero".to_string(),
        ));
    }
    if config.sessions.output_channel_capacity == 0 {
        return Err(ConfigError::InvalidStructure(
            "sessions.output_channel_capacity must be greater than zero".to_string(),
        ));
    }
    if config.terminal.columns == 0 || config.terminal.rows == 0 {
        return Err(ConfigError::InvalidStructure(
            "terminal.columns and terminal.rows must be greater than zero".to_string(),
        ));
    }
    if matches!(config.shell.command.as_deref(), Some([])) {
        return Err(ConfigError::InvalidStructure(
            "shell.command must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Default configuration path: `config.toml` in the working directory
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = TerminalConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.sessions.poll_interval_ms, 100);
        assert_eq!(config.sessions.read_chunk_size, 20 * 1024);
        assert!(!config.sessions.reap_exited);
        assert_eq!((config.terminal.columns, config.terminal.rows), (80, 24));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 9001

            [shell]
            command = ["/bin/sh", "-l"]

            [[shell.env]]
            name = "TERM"
            value = "xterm-256color"

            [logging]
            format = "json"
            "#,
        );

        let config = ConfigLoader::with_environment(HashMap::new())
            .load_config(Some(file.path()))
            .unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.shell.command,
            Some(vec!["/bin/sh".to_string(), "-l".to_string()])
        );
        assert_eq!(config.shell.env[0].name, "TERM");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.sessions.read_chunk_size, 20 * 1024);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config("[server]\nport = 9001\n");
        let vars = HashMap::from([
            ("WEBTERM__SERVER__PORT".to_string(), "9100".to_string()),
            ("WEBTERM__SESSIONS__REAP_EXITED".to_string(), "true".to_string()),
        ]);

        let config = ConfigLoader::with_environment(vars)
            .load_config(Some(file.path()))
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert!(config.sessions.reap_exited);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = ConfigLoader::with_environment(HashMap::new())
            .load_config(Some(Path::new("/nonexistent/rs_webterm.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let file = write_config("[sessions]\npoll_interval_ms = 0\n");
        let result = ConfigLoader::with_environment(HashMap::new()).load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::InvalidStructure(_))));
    }
}
