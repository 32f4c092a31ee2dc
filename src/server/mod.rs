// Server module entry
// Listener setup, accept loop, per-connection serving and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::run_until_shutdown;
