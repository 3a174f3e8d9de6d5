pub mod auth_request_repo;
pub mod error;
