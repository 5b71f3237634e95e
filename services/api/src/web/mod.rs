pub mod access_requests;
pub mod auth;
pub mod dashboard;
pub mod edit_requests;
pub mod employees;
pub mod locations;
pub mod middleware;
pub mod models;
pub mod projects;
pub mod reports;
pub mod rest;
pub mod router;
pub mod state;
pub mod time_entries;
pub mod token;

// Re-export what the binaries need to assemble the server.
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use router::build_router;
