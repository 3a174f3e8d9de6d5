//! Bearer credential check → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を読む（scheme は大文字小文字を区別しない）
//! - 検証そのものは AuthService（service token 照合 or provider への session 確認）
//! - 失敗は常に 401 + `WWW-Authenticate: Bearer`

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// 認証が必要な route 群に middleware を掛ける。
///
/// `route_layer` なので、マッチしない path は 401 ではなく 404 のまま返る。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        tracing::debug!("request without bearer credentials");
        AuthError::MissingCredentials
    })?;

    let identity = state.auth.authenticate(token).await?;
    let auth_ctx = AuthCtx::new(identity, token);

    tracing::debug!(
        user_id = %auth_ctx.identity.id,
        token = %auth_ctx.token_fingerprint,
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
