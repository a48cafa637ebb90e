// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response envelope and the error taxonomy visible to clients.
//!
//! Successful bodies are `{"result":"success","data":...}`; errors are
//! `{"result":"error","errorCode":"..."}`. The error message is logged and
//! never sent, so bodies do not leak internal state.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::service::ServiceError;

/// Top-level result marker in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// Error codes returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DuplicatedUserName,
    UserNotFound,
    InvalidPassword,
    InvalidToken,
    PostNotFound,
    InvalidPermission,
    AlreadyLiked,
    InvalidRequest,
    DatabaseError,
    InternalServerError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::DuplicatedUserName | ErrorCode::AlreadyLiked => StatusCode::CONFLICT,
            ErrorCode::UserNotFound | ErrorCode::PostNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidPassword | ErrorCode::InvalidToken | ErrorCode::InvalidPermission => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError | ErrorCode::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Error body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub result: Outcome,
    pub error_code: ErrorCode,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            debug!(code = ?self.code, message = %self.message, "Request rejected");
        }

        let body = Json(ErrorBody {
            result: Outcome::Error,
            error_code: self.code,
        });
        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Success envelope. `data` is omitted for operations without a result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub result: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            result: Outcome::Success,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            result: Outcome::Success,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn codes_map_to_statuses() {
        assert_eq!(ErrorCode::DuplicatedUserName.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::AlreadyLiked.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::PostNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InvalidPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InvalidPermission.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::DatabaseError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::DuplicatedUserName).unwrap();
        assert_eq!(json, "\"DUPLICATED_USER_NAME\"");
        let json = serde_json::to_string(&ErrorCode::InvalidPermission).unwrap();
        assert_eq!(json, "\"INVALID_PERMISSION\"");
    }

    #[tokio::test]
    async fn error_body_hides_message() {
        let response = ApiError::new(ErrorCode::DatabaseError, "disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"result":"error","errorCode":"DATABASE_ERROR"}"#);
    }

    #[tokio::test]
    async fn empty_success_omits_data() {
        let response = ApiResponse::empty().into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body_bytes[..], br#"{"result":"success"}"#);
    }
}
