//! Authentication middleware.
pub mod access;
