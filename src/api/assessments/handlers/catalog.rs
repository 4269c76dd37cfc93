use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::assessment::{
    AssessmentCreate, AssessmentDetailResponse, AssessmentResponse, AssessmentUpdate,
    QuestionCreate, QuestionResponse,
};

use super::super::helpers;

pub(in crate::api::assessments) async fn list_assessments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssessmentResponse>>, ApiError> {
    let course_ids = if user.is_admin() {
        None
    } else {
        Some(
            repositories::enrollments::active_course_ids(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load enrollments"))?,
        )
    };

    let assessments = repositories::assessments::list_published(state.db(), course_ids.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assessments"))?;

    Ok(Json(assessments.into_iter().map(AssessmentResponse::from_db).collect()))
}

pub(in crate::api::assessments) async fn create_assessment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AssessmentCreate>,
) -> Result<(StatusCode, Json<AssessmentDetailResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.passing_marks > payload.total_marks {
        return Err(ApiError::bad_request("passing_marks cannot exceed total_marks"));
    }
    for question in &payload.questions {
        helpers::validate_question(question)?;
    }

    let course = repositories::courses::find_by_id(state.db(), payload.course.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let assessment = repositories::assessments::create(
        &mut *tx,
        repositories::assessments::CreateAssessment {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            title: payload.title.trim(),
            description: payload.description.trim(),
            assessment_type: payload.assessment_type,
            total_marks: payload.total_marks,
            passing_marks: payload.passing_marks,
            duration_minutes: payload.duration_minutes,
            max_attempts: payload.max_attempts,
            is_published: payload.is_published,
            due_date: payload.due_date,
            instructions: payload.instructions.trim(),
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assessment"))?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    for question in &payload.questions {
        let (question, options) = helpers::insert_question(&mut tx, &assessment.id, question, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
        questions.push(QuestionResponse::from_db(question, options, true));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit assessment"))?;

    tracing::info!(
        assessment_id = %assessment.id,
        course_id = %course.id,
        admin_id = %admin.id,
        questions = questions.len(),
        "Assessment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(AssessmentDetailResponse {
            assessment: AssessmentResponse::from_db(assessment),
            questions,
        }),
    ))
}

pub(in crate::api::assessments) async fn get_assessment(
    Path(assessment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AssessmentDetailResponse>, ApiError> {
    let assessment = helpers::fetch_visible_assessment(&state, &user, &assessment_id).await?;
    let detail = helpers::assessment_detail(&state, assessment, user.is_admin()).await?;
    Ok(Json(detail))
}

pub(in crate::api::assessments) async fn update_assessment(
    Path(assessment_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AssessmentUpdate>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let current = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .ok_or_else(|| ApiError::not_found(helpers::ASSESSMENT_NOT_FOUND))?;

    let total_marks = payload.total_marks.unwrap_or(current.total_marks);
    let passing_marks = payload.passing_marks.unwrap_or(current.passing_marks);
    if passing_marks > total_marks {
        return Err(ApiError::bad_request("passing_marks cannot exceed total_marks"));
    }

    let updated = repositories::assessments::update(
        state.db(),
        &current.id,
        repositories::assessments::UpdateAssessment {
            title: payload.title.map(|value| value.trim().to_string()),
            description: payload.description,
            total_marks: payload.total_marks,
            passing_marks: payload.passing_marks,
            duration_minutes: payload.duration_minutes,
            max_attempts: payload.max_attempts,
            is_published: payload.is_published,
            due_date: payload.due_date,
            instructions: payload.instructions,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update assessment"))?
    .ok_or_else(|| ApiError::not_found(helpers::ASSESSMENT_NOT_FOUND))?;

    Ok(Json(AssessmentResponse::from_db(updated)))
}

pub(in crate::api::assessments) async fn add_question(
    Path(assessment_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    helpers::validate_question(&payload)?;

    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .ok_or_else(|| ApiError::not_found(helpers::ASSESSMENT_NOT_FOUND))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let (question, options) =
        helpers::insert_question(&mut tx, &assessment.id, &payload, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question, options, true))))
}
