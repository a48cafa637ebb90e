// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post, like and comment endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::blocking;
use crate::{
    auth::Auth,
    error::{ApiResponse, ApiResult, ErrorBody},
    ids::PostId,
    models::{Comment, CommentRequest, Post, PostWriteRequest},
    pagination::{Page, PageRequest},
    state::AppState,
};

type PostPath = Result<Path<PostId>, PathRejection>;
type PageQuery = Result<Query<PageRequest>, QueryRejection>;

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = PostWriteRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Post created", body = ApiResponse<Post>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    Auth(user): Auth,
    payload: Result<Json<PostWriteRequest>, JsonRejection>,
) -> ApiResult<Post> {
    let Json(request) = payload?;
    let posts = state.posts.clone();
    let post = blocking(move || posts.create(&user, &request.title, &request.body)).await?;
    Ok(ApiResponse::success(post))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PageRequest),
    tag = "Posts",
    security(("bearer" = [])),
    responses((status = 200, description = "Newest posts first", body = ApiResponse<Page<Post>>))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Auth(_caller): Auth,
    query: PageQuery,
) -> ApiResult<Page<Post>> {
    let Query(request) = query?;
    let posts = state.posts.clone();
    let page = blocking(move || posts.list(request)).await?;
    Ok(ApiResponse::success(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/my",
    params(PageRequest),
    tag = "Posts",
    security(("bearer" = [])),
    responses((status = 200, description = "Caller's posts, newest first", body = ApiResponse<Page<Post>>))
)]
pub async fn my_posts(
    State(state): State<AppState>,
    Auth(user): Auth,
    query: PageQuery,
) -> ApiResult<Page<Post>> {
    let Query(request) = query?;
    let posts = state.posts.clone();
    let page = blocking(move || posts.my(&user, request)).await?;
    Ok(ApiResponse::success(page))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post to modify")),
    request_body = PostWriteRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Post modified", body = ApiResponse<Post>),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
pub async fn modify_post(
    State(state): State<AppState>,
    Auth(user): Auth,
    path: PostPath,
    payload: Result<Json<PostWriteRequest>, JsonRejection>,
) -> ApiResult<Post> {
    let Path(post_id) = path?;
    let Json(request) = payload?;
    let posts = state.posts.clone();
    let post =
        blocking(move || posts.modify(&user, post_id, &request.title, &request.body)).await?;
    Ok(ApiResponse::success(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post to delete")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Auth(user): Auth,
    path: PostPath,
) -> ApiResult<()> {
    let Path(post_id) = path?;
    let posts = state.posts.clone();
    blocking(move || posts.delete(&user, post_id)).await?;
    Ok(ApiResponse::empty())
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/likes",
    params(("post_id" = u64, Path, description = "Post to like")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Liked"),
        (status = 404, description = "No such post", body = ErrorBody),
        (status = 409, description = "Already liked", body = ErrorBody),
    )
)]
pub async fn like_post(
    State(state): State<AppState>,
    Auth(user): Auth,
    path: PostPath,
) -> ApiResult<()> {
    let Path(post_id) = path?;
    let posts = state.posts.clone();
    blocking(move || posts.like(&user, post_id)).await?;
    Ok(ApiResponse::empty())
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/likes",
    params(("post_id" = u64, Path, description = "Post to count likes on")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Number of likes", body = ApiResponse<u64>),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
pub async fn like_count(
    State(state): State<AppState>,
    Auth(_caller): Auth,
    path: PostPath,
) -> ApiResult<u64> {
    let Path(post_id) = path?;
    let posts = state.posts.clone();
    let count = blocking(move || posts.like_count(post_id)).await?;
    Ok(ApiResponse::success(count))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = u64, Path, description = "Post to comment on")),
    request_body = CommentRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Comment added", body = ApiResponse<Comment>),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Auth(user): Auth,
    path: PostPath,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Comment> {
    let Path(post_id) = path?;
    let Json(request) = payload?;
    let posts = state.posts.clone();
    let comment = blocking(move || posts.comment(&user, post_id, &request.comment)).await?;
    Ok(ApiResponse::success(comment))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = u64, Path, description = "Post whose comments to list"), PageRequest),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Comments, oldest first", body = ApiResponse<Page<Comment>>),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Auth(_caller): Auth,
    path: PostPath,
    query: PageQuery,
) -> ApiResult<Page<Comment>> {
    let Path(post_id) = path?;
    let Query(request) = query?;
    let posts = state.posts.clone();
    let page = blocking(move || posts.comments(post_id, request)).await?;
    Ok(ApiResponse::success(page))
}
