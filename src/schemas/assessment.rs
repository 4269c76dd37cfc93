use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Assessment, CourseNote, Question, QuestionOption, StudentAssessment};
use crate::db::types::{AssessmentType, AttemptStatus, QuestionType};
use crate::repositories::attempts::AttemptWithTitle;
use crate::schemas::datetime::deserialize_option_datetime;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, message = "option_text must not be empty"))]
    pub(crate) option_text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
    #[serde(default, rename = "order")]
    pub(crate) sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    #[serde(default = "default_marks")]
    #[validate(range(min = 0, message = "marks must be non-negative"))]
    pub(crate) marks: i32,
    #[serde(default, rename = "order")]
    pub(crate) sort_order: i32,
    #[serde(default)]
    pub(crate) explanation: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentCreate {
    /// Course id.
    #[validate(length(min = 1, message = "course must not be empty"))]
    pub(crate) course: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default = "default_assessment_type")]
    pub(crate) assessment_type: AssessmentType,
    #[validate(range(min = 0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "passing_marks must be non-negative"))]
    pub(crate) passing_marks: i32,
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default)]
    pub(crate) is_published: bool,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) due_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub(crate) instructions: String,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0, message = "passing_marks must be non-negative"))]
    pub(crate) passing_marks: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: Option<i32>,
    #[serde(default)]
    pub(crate) is_published: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) due_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub(crate) instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) total_marks: i32,
    pub(crate) passing_marks: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) is_published: bool,
    pub(crate) due_date: Option<String>,
    pub(crate) instructions: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AssessmentResponse {
    pub(crate) fn from_db(assessment: Assessment) -> Self {
        Self {
            id: assessment.id,
            course_id: assessment.course_id,
            title: assessment.title,
            description: assessment.description,
            assessment_type: assessment.assessment_type,
            total_marks: assessment.total_marks,
            passing_marks: assessment.passing_marks,
            duration_minutes: assessment.duration_minutes,
            max_attempts: assessment.max_attempts,
            is_published: assessment.is_published,
            due_date: assessment.due_date.map(format_primitive),
            instructions: assessment.instructions,
            created_at: format_primitive(assessment.created_at),
            updated_at: format_primitive(assessment.updated_at),
        }
    }
}

/// `is_correct` is only serialized for admins.
#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) option_text: String,
    #[serde(rename = "order")]
    pub(crate) sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

impl OptionResponse {
    pub(crate) fn from_db(option: QuestionOption, reveal_answers: bool) -> Self {
        Self {
            id: option.id,
            option_text: option.option_text,
            sort_order: option.sort_order,
            is_correct: reveal_answers.then_some(option.is_correct),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    #[serde(rename = "order")]
    pub(crate) sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) explanation: Option<String>,
    pub(crate) options: Vec<OptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(
        question: Question,
        options: Vec<QuestionOption>,
        reveal_answers: bool,
    ) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            question_type: question.question_type,
            marks: question.marks,
            sort_order: question.sort_order,
            explanation: reveal_answers.then_some(question.explanation),
            options: options
                .into_iter()
                .map(|option| OptionResponse::from_db(option, reveal_answers))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentDetailResponse {
    #[serde(flatten)]
    pub(crate) assessment: AssessmentResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptResponse {
    pub(crate) message: String,
    pub(crate) student_assessment_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) assessment: AssessmentResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSubmit {
    /// Question id.
    pub(crate) question: String,
    #[serde(default)]
    pub(crate) selected_option: Option<String>,
    #[serde(default)]
    pub(crate) answer_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) assessment_id: String,
    #[serde(default)]
    pub(crate) answers: Vec<AnswerSubmit>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) message: String,
    pub(crate) student_assessment_id: String,
    pub(crate) obtained_marks: Decimal,
    pub(crate) total_marks: i32,
    pub(crate) status: AttemptStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) status: AttemptStatus,
    pub(crate) obtained_marks: Decimal,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) time_taken_minutes: i32,
    pub(crate) feedback: String,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: StudentAssessment) -> Self {
        Self {
            id: attempt.id,
            assessment_id: attempt.assessment_id,
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            obtained_marks: attempt.obtained_marks,
            started_at: format_primitive(attempt.started_at),
            submitted_at: attempt.submitted_at.map(format_primitive),
            time_taken_minutes: attempt.time_taken_minutes,
            feedback: attempt.feedback,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MyAttemptResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) assessment_title: String,
    pub(crate) total_marks: i32,
}

impl MyAttemptResponse {
    pub(crate) fn from_db(row: AttemptWithTitle) -> Self {
        Self {
            attempt: AttemptResponse::from_db(row.attempt),
            assessment_title: row.assessment_title,
            total_marks: row.total_marks,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NoteListQuery {
    #[serde(default)]
    pub(crate) course_id: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NoteCreate {
    #[serde(alias = "course")]
    #[validate(length(min = 1, message = "Course is required"))]
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    /// Base64 encoded PDF.
    #[serde(alias = "pdf_data")]
    #[validate(length(min = 1, message = "pdf_base64 must not be empty"))]
    pub(crate) pdf_base64: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct NoteUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
    #[serde(default, alias = "pdf_data")]
    pub(crate) pdf_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NoteResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) file_size: i32,
    pub(crate) file_size_mb: Decimal,
    pub(crate) uploaded_by: String,
    pub(crate) is_active: bool,
    pub(crate) download_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl NoteResponse {
    pub(crate) fn from_db(note: CourseNote) -> Self {
        let file_size_mb = (Decimal::from(note.file_size) / Decimal::from(1024 * 1024)).round_dp(2);
        Self {
            id: note.id,
            course_id: note.course_id,
            title: note.title,
            description: note.description,
            file_size: note.file_size,
            file_size_mb,
            uploaded_by: note.uploaded_by,
            is_active: note.is_active,
            download_count: note.download_count,
            created_at: format_primitive(note.created_at),
            updated_at: format_primitive(note.updated_at),
        }
    }
}

fn default_marks() -> i32 {
    1
}

fn default_assessment_type() -> AssessmentType {
    AssessmentType::Quiz
}

fn default_duration() -> i32 {
    30
}

fn default_max_attempts() -> i32 {
    1
}
