use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_active_enrollment, CurrentUser};
use crate::core::metrics::ASSESSMENT_SUBMISSIONS;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, whole_minutes_between};
use crate::db;
use crate::repositories;
use crate::schemas::assessment::{
    AssessmentResponse, AttemptResponse, MyAttemptResponse, StartAttemptResponse, SubmitRequest,
    SubmitResponse,
};
use crate::services::{grading, progress};

use super::super::helpers;

const ATTEMPT_NOT_FOUND: &str = "Assessment or attempt not found";

pub(in crate::api::assessments) async fn start_assessment(
    Path(assessment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StartAttemptResponse>, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .filter(|assessment| assessment.is_published)
        .ok_or_else(|| ApiError::not_found(helpers::ASSESSMENT_NOT_FOUND))?;

    // No admin bypass: every attempt belongs to an enrolled student.
    require_active_enrollment(
        &state,
        &user,
        &assessment.course_id,
        "You are not enrolled in this course",
    )
    .await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    db::advisory_xact_lock(&mut *tx, &format!("attempt:{}:{}", user.id, assessment.id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock attempts"))?;

    let attempts = repositories::attempts::count_for(&mut *tx, &user.id, &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    if attempts >= i64::from(assessment.max_attempts) {
        return Err(ApiError::bad_request("Maximum attempts reached"));
    }

    let attempt_number = i32::try_from(attempts + 1)
        .map_err(|e| ApiError::internal(e, "Attempt number overflow"))?;
    let attempt = repositories::attempts::create(
        &mut *tx,
        &Uuid::new_v4().to_string(),
        &user.id,
        &assessment.id,
        attempt_number,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit attempt"))?;

    tracing::info!(
        user_id = %user.id,
        assessment_id = %assessment.id,
        attempt_number,
        "Assessment attempt started"
    );

    Ok(Json(StartAttemptResponse {
        message: "Assessment started successfully".to_string(),
        student_assessment_id: attempt.id,
        attempt_number,
        assessment: AssessmentResponse::from_db(assessment),
    }))
}

pub(in crate::api::assessments) async fn submit_assessment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), payload.assessment_id.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .ok_or_else(|| ApiError::bad_request(helpers::ASSESSMENT_NOT_FOUND))?;
    if !assessment.is_published {
        return Err(ApiError::bad_request("Assessment is not published"));
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let attempt = repositories::attempts::lock_latest(&mut *tx, &user.id, &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock attempt"))?
        .ok_or_else(|| ApiError::not_found(ATTEMPT_NOT_FOUND))?;

    let now = primitive_now_utc();
    let mut obtained_marks = Decimal::ZERO;

    for answer in &payload.answers {
        let question = repositories::assessments::find_question(&mut *tx, answer.question.trim())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
            .filter(|question| question.assessment_id == assessment.id)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid question: {}", answer.question.trim()))
            })?;

        let selected = match answer.selected_option.as_deref().map(str::trim) {
            Some(option_id) if !option_id.is_empty() => Some(
                repositories::assessments::find_option(&mut *tx, option_id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch option"))?
                    .filter(|option| option.question_id == question.id)
                    .ok_or_else(|| {
                        ApiError::BadRequest(format!(
                            "Invalid option for question: {}",
                            question.id
                        ))
                    })?,
            ),
            _ => None,
        };

        let graded = grading::grade_answer(
            question.question_type,
            question.marks,
            selected.as_ref().map(|option| option.is_correct),
        );

        repositories::attempts::insert_answer(
            &mut *tx,
            repositories::attempts::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                attempt_id: &attempt.id,
                question_id: &question.id,
                selected_option_id: selected.as_ref().map(|option| option.id.as_str()),
                answer_text: answer.answer_text.as_deref().unwrap_or("").trim(),
                marks_awarded: graded.marks_awarded,
                is_correct: graded.is_correct,
                now,
            },
        )
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::BadRequest(format!("Duplicate answer for question: {}", question.id))
            } else {
                ApiError::internal(e, "Failed to save answer")
            }
        })?;

        obtained_marks += graded.marks_awarded;
    }

    let status = grading::status_after_submit(assessment.assessment_type);
    let finished = repositories::attempts::finish(
        &mut *tx,
        &attempt.id,
        status,
        obtained_marks,
        whole_minutes_between(attempt.started_at, now),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to finish attempt"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit submission"))?;

    metrics::counter!(ASSESSMENT_SUBMISSIONS).increment(1);
    tracing::info!(
        user_id = %user.id,
        assessment_id = %assessment.id,
        attempt_id = %finished.id,
        obtained_marks = %finished.obtained_marks,
        "Assessment submitted"
    );

    if let Err(e) = progress::recompute_course(state.db(), &user.id, &assessment.course_id).await {
        tracing::warn!(
            error = %e,
            user_id = %user.id,
            course_id = %assessment.course_id,
            "Failed to recompute course progress after submission"
        );
    }

    Ok(Json(SubmitResponse {
        message: "Assessment submitted successfully".to_string(),
        student_assessment_id: finished.id,
        obtained_marks: finished.obtained_marks,
        total_marks: assessment.total_marks,
        status: finished.status,
    }))
}

pub(in crate::api::assessments) async fn assessment_results(
    Path(assessment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let attempts = repositories::attempts::list_for(state.db(), &user.id, &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    if attempts.is_empty() {
        return Err(ApiError::not_found("No attempts found"));
    }

    Ok(Json(attempts.into_iter().map(AttemptResponse::from_db).collect()))
}

pub(in crate::api::assessments) async fn my_assessments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyAttemptResponse>>, ApiError> {
    let rows = repositories::attempts::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    Ok(Json(rows.into_iter().map(MyAttemptResponse::from_db).collect()))
}
