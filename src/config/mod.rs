/// Configuration module for rs_webterm
mod config;
mod config_loader;
mod error;
mod logging;

pub use config::*;
pub use config_loader::{ConfigLoader, ENV_PREFIX, default_config_path};
pub use error::ConfigError;
pub use logging::init_logging;
