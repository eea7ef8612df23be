// Library exports for statuswatch
// This allows integration tests to use the modules

pub mod api;
pub mod config;
pub mod imap_client;
pub mod reconciler;
pub mod status;
pub mod store;
