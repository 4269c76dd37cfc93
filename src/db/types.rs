use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "usertype", rename_all = "lowercase")]
pub(crate) enum UserType {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficultylevel", rename_all = "lowercase")]
pub(crate) enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lessontype", rename_all = "lowercase")]
pub(crate) enum LessonType {
    Video,
    Text,
    Quiz,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "resourcetype", rename_all = "lowercase")]
pub(crate) enum ResourceType {
    Pdf,
    Code,
    Link,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assessmenttype", rename_all = "lowercase")]
pub(crate) enum AssessmentType {
    Quiz,
    Assignment,
    Project,
    Exam,
}

impl AssessmentType {
    /// Assignments and projects wait for a human; quizzes and exams are final
    /// once auto-graded.
    pub(crate) fn needs_manual_grading(self) -> bool {
        matches!(self, Self::Assignment | Self::Project)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
    Essay,
    Code,
}

impl QuestionType {
    pub(crate) fn is_auto_graded(self) -> bool {
        matches!(self, Self::Mcq | Self::TrueFalse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptstatus", rename_all = "snake_case")]
pub(crate) enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitted,
    Graded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "liveplatform", rename_all = "lowercase")]
pub(crate) enum LivePlatform {
    Jitsi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "liveclassstatus", rename_all = "lowercase")]
pub(crate) enum LiveClassStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentmethod", rename_all = "lowercase")]
pub(crate) enum PaymentMethod {
    Razorpay,
    Stripe,
    Paypal,
}

impl PaymentMethod {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentstatus", rename_all = "lowercase")]
pub(crate) enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "subscriptiontype", rename_all = "lowercase")]
pub(crate) enum SubscriptionType {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "certificatetype", rename_all = "lowercase")]
pub(crate) enum CertificateType {
    Course,
    Bundle,
    Quiz,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "notificationtype", rename_all = "snake_case")]
pub(crate) enum NotificationType {
    CourseEnrollment,
    LiveClass,
    Assignment,
    Payment,
    Certificate,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "notificationpriority", rename_all = "lowercase")]
pub(crate) enum NotificationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "goaltype", rename_all = "snake_case")]
pub(crate) enum GoalType {
    DailyTime,
    WeeklyLessons,
    MonthlyCourses,
    Streak,
}
