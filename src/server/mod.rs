/// Server management for rs_webterm
mod server;

pub use server::{build_router, run_server_with_graceful_shutdown, serve, shutdown_signal};
