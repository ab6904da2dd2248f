pub mod api;
pub mod core;
pub mod handlers;
pub mod models;
pub mod security;
pub mod stores;

#[cfg(test)]
mod test_support;
