/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 */

use crate::services::auth::{Identity, token_fingerprint};

/// Context attached to every request that passed the bearer check.
///
/// - `identity` is either the verified end user or the service caller
/// - `token_fingerprint` is a short hash of the bearer token, for log correlation only
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub token_fingerprint: String,
}

impl AuthCtx {
    pub fn new(identity: Identity, token: &str) -> Self {
        Self {
            identity,
            token_fingerprint: token_fingerprint(token),
        }
    }
}
