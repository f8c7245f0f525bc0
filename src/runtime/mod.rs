//! Process lifecycle: component wiring, the HTTP server, shutdown

pub mod lifetime;
pub mod server;

pub use server::run_server;
