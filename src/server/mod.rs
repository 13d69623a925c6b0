// Server module entry point
// Listener setup, accept loop, per-connection tasks and shutdown signals

pub mod connection;
pub mod listener;
pub mod serve;
pub mod signal;

// Re-export commonly used items
pub use connection::ConnectionSettings;
pub use listener::create_reusable_listener;
pub use serve::serve;
pub use signal::shutdown_signal;
