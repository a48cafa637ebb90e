// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    alarm::{AlarmArgs, AlarmKind},
    auth::{authenticate, enforce_access, Role},
    error::{ApiError, ErrorBody, ErrorCode, Outcome},
    ids::{AlarmId, CommentId, PostId, UserId},
    models::{
        Alarm, Comment, CommentRequest, CredentialsRequest, DevAlarmRequest, LoginResponse, Post,
        PostWriteRequest, User, UserSummary,
    },
    service::ServiceResult,
    state::AppState,
};

pub mod dev;
pub mod health;
pub mod posts;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Run a blocking service call off the async workers.
///
/// Store transactions and password hashing both block.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/join", post(users::join))
        .route("/users/login", post(users::login))
        .route("/users/alarm", get(users::alarm_list))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/my", get(posts::my_posts))
        .route(
            "/posts/{post_id}",
            put(posts::modify_post).delete(posts::delete_post),
        )
        .route(
            "/posts/{post_id}/likes",
            get(posts::like_count).post(posts::like_post),
        )
        .route(
            "/posts/{post_id}/comments",
            get(posts::list_comments).post(posts::create_comment),
        );

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let mut app = Router::new()
        .nest("/api/v1", v1_routes)
        .merge(health_routes);

    if state.dev_routes {
        app = app.route("/api-dev/v1/alarms", post(dev::deliver_alarm));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    app.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Layers run bottom-up: identity is established before access is enforced
        .layer(from_fn_with_state(state.clone(), enforce_access))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::join,
        users::login,
        users::alarm_list,
        posts::create_post,
        posts::list_posts,
        posts::my_posts,
        posts::modify_post,
        posts::delete_post,
        posts::like_post,
        posts::like_count,
        posts::create_comment,
        posts::list_comments,
        health::health,
        health::liveness,
        health::readiness,
        dev::deliver_alarm
    ),
    components(
        schemas(
            User,
            UserSummary,
            Role,
            UserId,
            PostId,
            CommentId,
            AlarmId,
            Post,
            Comment,
            Alarm,
            AlarmKind,
            AlarmArgs,
            CredentialsRequest,
            LoginResponse,
            PostWriteRequest,
            CommentRequest,
            DevAlarmRequest,
            Outcome,
            ErrorCode,
            ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "Registration, login and alarms"),
        (name = "Posts", description = "Posts, likes and comments"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Dev", description = "Developer utilities")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
