// HTTP request handlers for the local provider bridge
pub mod provider;
pub mod types;


// Re-export the main handler functions
pub use provider::{begin_create, begin_get, clear, configure_services, create, get, health};
