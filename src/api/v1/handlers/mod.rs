pub mod auth_requests;
pub mod extraction;
pub mod health;
