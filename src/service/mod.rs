/// Service layer for terminal session management
mod error;
mod message_handler;
mod output_hub;
mod output_pump;
mod session_handler;
mod session_manager;
mod session_registry;

pub use error::SessionError;
pub use message_handler::{MessageHandler, Reply};
pub use output_hub::{OutputEvent, OutputHub};
pub use output_pump::{OutputPump, PumpExit, PumpSettings, Utf8Decoder};
pub use session_handler::handle_terminal_connection;
pub use session_manager::{DEFAULT_SESSION_ID, SessionManager};
pub use session_registry::SessionRegistry;
