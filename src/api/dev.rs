// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Developer utilities. Mounted only when `DEV_ROUTES` is set.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use super::blocking;
use crate::{
    alarm::AlarmEvent,
    error::{ApiResponse, ApiResult, ErrorBody},
    models::DevAlarmRequest,
    state::AppState,
};

/// Deliver an arbitrary alarm through the configured dispatcher.
#[utoipa::path(
    post,
    path = "/api-dev/v1/alarms",
    request_body = DevAlarmRequest,
    tag = "Dev",
    responses(
        (status = 200, description = "Alarm dispatched"),
        (status = 400, description = "Malformed body", body = ErrorBody),
    )
)]
pub async fn deliver_alarm(
    State(state): State<AppState>,
    payload: Result<Json<DevAlarmRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    let event = AlarmEvent::new(request.recipient_id, request.kind, request.args);
    info!(event_id = %event.event_id, recipient_id = %event.recipient_id, "Developer alarm submitted");

    let alarms = state.alarms.clone();
    blocking(move || Ok(alarms.submit(event)?)).await?;

    Ok(ApiResponse::empty())
}
