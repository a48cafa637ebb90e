// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use super::blocking;
use crate::{
    auth::Auth,
    error::{ApiResponse, ApiResult, ErrorBody},
    models::{Alarm, CredentialsRequest, LoginResponse, User},
    pagination::{Page, PageRequest},
    state::AppState,
};

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/users/join",
    request_body = CredentialsRequest,
    tag = "Users",
    responses(
        (status = 200, description = "User registered", body = ApiResponse<User>),
        (status = 409, description = "Handle already taken", body = ErrorBody),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload?;
    let users = state.users.clone();
    let user = blocking(move || users.join(&request.handle, &request.password)).await?;
    Ok(ApiResponse::success(user))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = CredentialsRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown handle", body = ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let users = state.users.clone();
    let token = blocking(move || users.login(&request.handle, &request.password)).await?;
    Ok(ApiResponse::success(LoginResponse { token }))
}

/// Alarms addressed to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/alarm",
    params(PageRequest),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Alarm page", body = ApiResponse<Page<Alarm>>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn alarm_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> ApiResult<Page<Alarm>> {
    let Query(request) = query?;
    let users = state.users.clone();
    let page = blocking(move || users.alarm_list(&user, request)).await?;
    Ok(ApiResponse::success(page))
}
