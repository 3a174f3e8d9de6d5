/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module が `apply(router, ...)` を持ち、app.rs はそれを順に呼ぶだけ
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
