/*
 * Responsibility
 * - Business logic and adapters to external systems
 *   - auth: credential check
 *   - auth_requests: authorization-request lifecycle
 *   - extraction: upload → AI → form fields
 *   - supabase: hosted database / auth HTTP client
 */
pub mod auth;
pub mod auth_requests;
pub mod extraction;
pub mod supabase;
