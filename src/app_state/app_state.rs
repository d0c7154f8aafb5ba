/// Application state shared by every handler
use std::sync::Arc;

use crate::config::TerminalConfig;
use crate::pty::{PortablePtyFactory, PtyFactory};
use crate::service::SessionManager;

#[derive(Clone)]
pub struct AppState {
    /// Live terminal sessions
    pub sessions: SessionManager,
    /// Application configuration
    pub config: Arc<TerminalConfig>,
}

impl AppState {
    /// Create the state with the portable-pty backend
    pub fn new(config: TerminalConfig) -> Self {
        Self::with_factory(config, Arc::new(PortablePtyFactory::default()))
    }

    /// Create the state with a specific PTY backend
    pub fn with_factory(config: TerminalConfig, factory: Arc<dyn PtyFactory>) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: SessionManager::new(config.clone(), factory),
            config,
        }
    }
}
