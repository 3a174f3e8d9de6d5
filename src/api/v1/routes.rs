/*
 * Responsibility
 * - URL 構造を定義
 *   - /health                          認証なし
 *   - /auth-requests/...               Bearer 必須 (route_layer)
 *   - /api/v1/extract-form-data/       認証なし, multipart
 * - 末尾スラッシュ有り/無しの両方を明示的に登録する
 */
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::api::v1::handlers::{
    auth_requests::{
        create_auth_request, get_auth_request, list_auth_requests, update_auth_request_status,
    },
    extraction::extract_form_data,
    health::health,
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth_request_routes(state))
        .nest("/api/v1", extraction_routes())
}

fn auth_request_routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route(
            "/auth-requests",
            get(list_auth_requests).post(create_auth_request),
        )
        .route(
            "/auth-requests/",
            get(list_auth_requests).post(create_auth_request),
        )
        .route("/auth-requests/{id}", get(get_auth_request))
        .route("/auth-requests/{id}/status", put(update_auth_request_status));

    middleware::auth::access::apply(router, state)
}

fn extraction_routes() -> Router<AppState> {
    // uploads are bounded by the global request body limit, not axum's 2 MB default
    Router::new()
        .route("/extract-form-data/", post(extract_form_data))
        .route("/extract-form-data", post(extract_form_data))
        .layer(DefaultBodyLimit::disable())
}
