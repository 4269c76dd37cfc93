use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::LiveClassStatus;
use crate::repositories;
use crate::schemas::live::{
    AttendanceEntry, AttendanceHistoryResponse, AttendeeResponse, AttendeesResponse,
    JoinResponse, LeaveResponse,
};
use crate::services::jitsi;

use super::super::helpers;

pub(in crate::api::live) async fn join_class(
    Path(class_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<JoinResponse>, ApiError> {
    helpers::sync_statuses(&state).await?;
    let class = helpers::fetch_class(&state, &class_id).await?;
    require_enrollment(&state, &user, &class.course_id, "You are not enrolled in this course")
        .await?;

    if matches!(class.status, LiveClassStatus::Cancelled | LiveClassStatus::Completed) {
        return Err(ApiError::bad_request("This live class is not available"));
    }

    repositories::live_classes::join(
        state.db(),
        &Uuid::new_v4().to_string(),
        &class.id,
        &user.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record attendance"))?;

    let jwt = jitsi::room_token(state.settings(), &class.meeting_id, &user)
        .map_err(|e| ApiError::internal(e, "Failed to sign meeting token"))?;

    tracing::info!(class_id = %class.id, user_id = %user.id, "Joined live class");

    Ok(Json(JoinResponse {
        message: "Successfully joined live class".to_string(),
        meeting_url: class.meeting_url,
        room_name: class.meeting_id,
        display_name: user.full_name(),
        domain: state.settings().jitsi().domain.clone(),
        is_moderator: user.is_admin(),
        jwt,
    }))
}

pub(in crate::api::live) async fn leave_class(
    Path(class_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let attendance =
        repositories::live_classes::leave(state.db(), &class_id, &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update attendance"))?
            .ok_or_else(|| ApiError::not_found("Attendance record not found"))?;

    Ok(Json(LeaveResponse {
        message: "Successfully left live class".to_string(),
        duration_minutes: attendance.duration_minutes,
    }))
}

pub(in crate::api::live) async fn list_attendees(
    Path(class_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AttendeesResponse>, ApiError> {
    let class = helpers::fetch_class(&state, &class_id).await?;
    let rows = repositories::live_classes::list_attendees(state.db(), &class.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendees"))?;

    let attendees: Vec<_> = rows.into_iter().map(AttendeeResponse::from_db).collect();
    let currently_online = attendees.iter().filter(|attendee| attendee.is_online).count();

    Ok(Json(AttendeesResponse {
        live_class_id: class.id,
        total_attendees: attendees.len(),
        currently_online,
        attendees,
    }))
}

pub(in crate::api::live) async fn attendance_history(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttendanceHistoryResponse>, ApiError> {
    let rows = repositories::live_classes::attendance_history(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attendance"))?;

    let total_duration_minutes =
        rows.iter().map(|row| i64::from(row.attendance.duration_minutes)).sum();

    Ok(Json(AttendanceHistoryResponse {
        total_classes_attended: rows.len(),
        total_duration_minutes,
        attendance: rows.into_iter().map(AttendanceEntry::from_db).collect(),
    }))
}
