use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{
    AssessmentType, AttemptStatus, CertificateType, DifficultyLevel, GoalType, LessonType,
    LiveClassStatus, LivePlatform, NotificationPriority, NotificationType, PaymentMethod,
    PaymentStatus, QuestionType, ResourceType, SubscriptionType, UserType,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) user_type: UserType,
    pub(crate) phone: Option<String>,
    pub(crate) bio: String,
    pub(crate) is_active: bool,
    pub(crate) is_verified: bool,
    pub(crate) token_version: i32,
    pub(crate) date_joined: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    /// "First Last", falling back to the username when both are blank.
    pub(crate) fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserProfile {
    pub(crate) user_id: String,
    pub(crate) date_of_birth: Option<Date>,
    pub(crate) address: String,
    pub(crate) city: String,
    pub(crate) state: String,
    pub(crate) country: String,
    pub(crate) postal_code: String,
    pub(crate) linkedin_url: Option<String>,
    pub(crate) github_url: Option<String>,
    pub(crate) portfolio_url: Option<String>,
    pub(crate) reset_otp: Option<String>,
    pub(crate) otp_created_at: Option<PrimitiveDateTime>,
    pub(crate) reset_token: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Category {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) icon: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) category_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) instructor: String,
    pub(crate) price: Decimal,
    pub(crate) discounted_price: Option<Decimal>,
    pub(crate) duration_hours: i32,
    pub(crate) difficulty_level: DifficultyLevel,
    pub(crate) prerequisites: String,
    pub(crate) what_you_learn: Json<Vec<String>>,
    pub(crate) requirements: Json<Vec<String>>,
    pub(crate) is_published: bool,
    pub(crate) enrollment_count: i32,
    pub(crate) rating: Decimal,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Course {
    pub(crate) fn effective_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseSection {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) sort_order: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) video_url: Option<String>,
    pub(crate) video_duration_seconds: Option<i32>,
    pub(crate) lesson_type: LessonType,
    pub(crate) sort_order: i32,
    pub(crate) is_free: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseResource {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) url: String,
    pub(crate) description: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) is_active: bool,
    pub(crate) completion_percentage: Decimal,
    pub(crate) payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseReview {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) rating: i16,
    pub(crate) comment: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseBundle {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) total_price: Decimal,
    pub(crate) discount_percentage: Decimal,
    pub(crate) final_price: Decimal,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct RecordedVideo {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) storage_key: String,
    pub(crate) content_type: String,
    pub(crate) size_bytes: i64,
    pub(crate) uploaded_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assessment {
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
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) instructions: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) sort_order: i32,
    pub(crate) explanation: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) option_text: String,
    pub(crate) is_correct: bool,
    pub(crate) sort_order: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentAssessment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) assessment_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) time_taken_minutes: i32,
    pub(crate) obtained_marks: Decimal,
    pub(crate) status: AttemptStatus,
    pub(crate) feedback: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentAnswer {
    pub(crate) id: String,
    pub(crate) student_assessment_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answer_text: String,
    pub(crate) marks_awarded: Decimal,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Note metadata. The PDF bytes are only loaded by the download query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseNote {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) file_size: i32,
    pub(crate) uploaded_by: String,
    pub(crate) is_active: bool,
    pub(crate) download_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LiveClass {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructor: String,
    pub(crate) scheduled_start: PrimitiveDateTime,
    pub(crate) scheduled_end: PrimitiveDateTime,
    pub(crate) platform: LivePlatform,
    pub(crate) meeting_id: String,
    pub(crate) meeting_url: String,
    pub(crate) status: LiveClassStatus,
    pub(crate) max_participants: i32,
    pub(crate) recording_url: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LiveClassAttendance {
    pub(crate) id: String,
    pub(crate) live_class_id: String,
    pub(crate) student_id: String,
    pub(crate) joined_at: PrimitiveDateTime,
    pub(crate) left_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Coupon {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) description: String,
    pub(crate) discount_percentage: Option<Decimal>,
    pub(crate) discount_amount: Option<Decimal>,
    pub(crate) max_uses: i32,
    pub(crate) used_count: i32,
    pub(crate) valid_from: PrimitiveDateTime,
    pub(crate) valid_to: PrimitiveDateTime,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Payment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: Option<String>,
    pub(crate) bundle_id: Option<String>,
    pub(crate) amount: Decimal,
    pub(crate) discount_amount: Decimal,
    pub(crate) final_amount: Decimal,
    pub(crate) coupon_id: Option<String>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) gateway_order_id: Option<String>,
    pub(crate) gateway_payment_id: Option<String>,
    pub(crate) gateway_signature: Option<String>,
    pub(crate) status: PaymentStatus,
    pub(crate) failure_reason: Option<String>,
    pub(crate) enrollment_completed: bool,
    pub(crate) enrollment_date: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PaymentReceipt {
    pub(crate) id: String,
    pub(crate) payment_id: String,
    pub(crate) receipt_number: String,
    pub(crate) billing_name: String,
    pub(crate) billing_email: String,
    pub(crate) amount: Decimal,
    pub(crate) issued_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subscription {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) subscription_type: SubscriptionType,
    pub(crate) price: Decimal,
    pub(crate) starts_at: PrimitiveDateTime,
    pub(crate) ends_at: PrimitiveDateTime,
    pub(crate) is_active: bool,
    pub(crate) payment_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LessonProgress {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) lesson_id: String,
    pub(crate) is_completed: bool,
    pub(crate) watch_time_seconds: i64,
    pub(crate) progress_percentage: Decimal,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) last_accessed: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseProgress {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) completed_lessons: i32,
    pub(crate) total_lessons: i32,
    pub(crate) completed_quizzes: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) average_quiz_score: Decimal,
    pub(crate) completion_percentage: Decimal,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) time_spent_seconds: i64,
    pub(crate) last_accessed: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct BundleProgress {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) bundle_id: String,
    pub(crate) completed_courses: i32,
    pub(crate) total_courses: i32,
    pub(crate) completion_percentage: Decimal,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudyStreak {
    pub(crate) user_id: String,
    pub(crate) current_streak: i32,
    pub(crate) longest_streak: i32,
    pub(crate) last_activity_date: Option<Date>,
    pub(crate) total_study_days: i32,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LearningGoal {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) goal_type: GoalType,
    pub(crate) target_value: i32,
    pub(crate) current_value: i32,
    pub(crate) deadline: Option<Date>,
    pub(crate) is_achieved: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CertificateTemplate {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) layout_svg: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Certificate metadata; `has_file` stands in for the rendered SVG bytes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Certificate {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) certificate_type: CertificateType,
    pub(crate) course_id: Option<String>,
    pub(crate) bundle_id: Option<String>,
    pub(crate) template_id: Option<String>,
    pub(crate) certificate_number: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) issue_date: PrimitiveDateTime,
    pub(crate) completion_date: PrimitiveDateTime,
    pub(crate) verification_url: String,
    pub(crate) has_file: bool,
    pub(crate) is_valid: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) recipient_id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) is_read: bool,
    pub(crate) course_id: Option<String>,
    pub(crate) action_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct NotificationTemplate {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) title_template: String,
    pub(crate) message_template: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct BulkNotification {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) notification_type: NotificationType,
    pub(crate) priority: NotificationPriority,
    pub(crate) target_all_users: bool,
    pub(crate) target_user_ids: Json<Vec<String>>,
    pub(crate) created_by: String,
    pub(crate) sent_at: Option<PrimitiveDateTime>,
    pub(crate) sent_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
