/*
 * Responsibility
 * - /auth-requests 系 handler (create / list / get / status update)
 * - Path/Query/Json を extractor で受け、DTO validation → service 呼び出し
 * - 認証は middleware 済み。handler は AuthCtxExtractor で identity を受け取るだけ
 */
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::auth_requests::{
            AuthRequestResponse, CreateAuthRequestRequest, ListAuthRequestsQuery,
            UpdateStatusQuery,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

const RESOURCE: &str = "Authorization request";

pub async fn create_auth_request(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    body: Result<Json<CreateAuthRequestRequest>, JsonRejection>,
) -> Result<Json<AuthRequestResponse>, AppError> {
    let Json(req) = body?;
    req.validate().map_err(AppError::bad_request)?;

    let row = state
        .auth_requests
        .create(req.into_draft(), &ctx.identity)
        .await?;

    Ok(Json(row.into()))
}

pub async fn list_auth_requests(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    query: Result<Query<ListAuthRequestsQuery>, QueryRejection>,
) -> Result<Json<Vec<AuthRequestResponse>>, AppError> {
    let Query(query) = query?;
    let rows = state.auth_requests.list_by_provider(query.provider_id).await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn get_auth_request(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AuthRequestResponse>, AppError> {
    let Path(id) = id?;
    let row = state
        .auth_requests
        .get(id)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row.into()))
}

pub async fn update_auth_request_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<UpdateStatusQuery>, QueryRejection>,
) -> Result<Json<AuthRequestResponse>, AppError> {
    let Path(id) = id?;
    let Query(query) = query?;

    tracing::debug!(%id, caller = %ctx.identity.id, status = %query.status, "status update requested");

    let row = state
        .auth_requests
        .update_status(id, &query.status)
        .await?
        .ok_or(AppError::not_found(RESOURCE))?;

    Ok(Json(row.into()))
}
