pub mod config;
pub mod error;
pub mod navigation;
pub mod routes;
pub mod state;
pub mod tracing_init;
