pub mod auth_requests;
