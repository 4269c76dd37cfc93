use std::collections::HashMap;

use sqlx::PgConnection;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Assessment, Question, QuestionOption, User};
use crate::repositories;
use crate::schemas::assessment::{
    AssessmentDetailResponse, AssessmentResponse, QuestionCreate, QuestionResponse,
};

pub(super) const ASSESSMENT_NOT_FOUND: &str = "Assessment not found";

/// Admins see every assessment. Students only see published ones in courses
/// they are actively enrolled in; anything else is reported as missing.
pub(super) async fn fetch_visible_assessment(
    state: &AppState,
    user: &User,
    assessment_id: &str,
) -> Result<Assessment, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
        .ok_or_else(|| ApiError::not_found(ASSESSMENT_NOT_FOUND))?;

    if user.is_admin() {
        return Ok(assessment);
    }

    if !assessment.is_published {
        return Err(ApiError::not_found(ASSESSMENT_NOT_FOUND));
    }

    let enrolled = repositories::enrollments::is_active(state.db(), &user.id, &assessment.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if enrolled {
        Ok(assessment)
    } else {
        Err(ApiError::not_found(ASSESSMENT_NOT_FOUND))
    }
}

pub(super) fn validate_question(question: &QuestionCreate) -> Result<(), ApiError> {
    if question.question_type.is_auto_graded()
        && !question.options.iter().any(|option| option.is_correct)
    {
        return Err(ApiError::bad_request(
            "mcq and true_false questions need at least one correct option",
        ));
    }
    Ok(())
}

pub(super) async fn insert_question(
    conn: &mut PgConnection,
    assessment_id: &str,
    question: &QuestionCreate,
    now: PrimitiveDateTime,
) -> Result<(Question, Vec<QuestionOption>), sqlx::Error> {
    let created = repositories::assessments::create_question(
        &mut *conn,
        repositories::assessments::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            assessment_id,
            question_text: question.question_text.trim(),
            question_type: question.question_type,
            marks: question.marks,
            sort_order: question.sort_order,
            explanation: question.explanation.trim(),
            now,
        },
    )
    .await?;

    let mut options = Vec::with_capacity(question.options.len());
    for option in &question.options {
        let option = repositories::assessments::create_option(
            &mut *conn,
            repositories::assessments::CreateOption {
                id: &Uuid::new_v4().to_string(),
                question_id: &created.id,
                option_text: option.option_text.trim(),
                is_correct: option.is_correct,
                sort_order: option.sort_order,
                now,
            },
        )
        .await?;
        options.push(option);
    }

    Ok((created, options))
}

pub(super) async fn assessment_detail(
    state: &AppState,
    assessment: Assessment,
    reveal_answers: bool,
) -> Result<AssessmentDetailResponse, ApiError> {
    let questions = repositories::assessments::list_questions(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let options = repositories::assessments::list_options_for_assessment(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load options"))?;

    let mut options_by_question: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    let questions = questions
        .into_iter()
        .map(|question| {
            let options = options_by_question.remove(&question.id).unwrap_or_default();
            QuestionResponse::from_db(question, options, reveal_answers)
        })
        .collect();

    Ok(AssessmentDetailResponse { assessment: AssessmentResponse::from_db(assessment), questions })
}
