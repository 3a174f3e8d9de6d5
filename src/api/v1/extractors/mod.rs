/*
 * Responsibility
 * - handler 向けの独自 extractor
 */
pub mod auth_ctx;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
