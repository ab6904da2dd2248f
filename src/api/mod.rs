pub mod auth;
pub mod client;
pub mod interceptor;
pub mod students;
