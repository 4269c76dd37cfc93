use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{BundleProgress, CourseProgress, LearningGoal, LessonProgress, StudyStreak};
use crate::db::types::GoalType;
use crate::schemas::datetime::deserialize_option_date;

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct LessonProgressUpdate {
    #[serde(default)]
    pub(crate) is_completed: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 0, message = "watch_time_seconds must be non-negative"))]
    pub(crate) watch_time_seconds: Option<i64>,
    #[serde(default)]
    pub(crate) progress_percentage: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonProgressResponse {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) is_completed: bool,
    pub(crate) watch_time_seconds: i64,
    pub(crate) progress_percentage: Decimal,
    pub(crate) completed_at: Option<String>,
    pub(crate) last_accessed: String,
}

impl LessonProgressResponse {
    pub(crate) fn from_db(progress: LessonProgress) -> Self {
        Self {
            id: progress.id,
            lesson_id: progress.lesson_id,
            is_completed: progress.is_completed,
            watch_time_seconds: progress.watch_time_seconds,
            progress_percentage: progress.progress_percentage,
            completed_at: progress.completed_at.map(format_primitive),
            last_accessed: format_primitive(progress.last_accessed),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseProgressResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) completed_lessons: i32,
    pub(crate) total_lessons: i32,
    pub(crate) completed_quizzes: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) average_quiz_score: Decimal,
    pub(crate) completion_percentage: Decimal,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<String>,
    pub(crate) time_spent_seconds: i64,
    pub(crate) last_accessed: String,
}

impl CourseProgressResponse {
    pub(crate) fn from_db(progress: CourseProgress) -> Self {
        Self {
            id: progress.id,
            course_id: progress.course_id,
            completed_lessons: progress.completed_lessons,
            total_lessons: progress.total_lessons,
            completed_quizzes: progress.completed_quizzes,
            total_quizzes: progress.total_quizzes,
            average_quiz_score: progress.average_quiz_score,
            completion_percentage: progress.completion_percentage,
            is_completed: progress.is_completed,
            completed_at: progress.completed_at.map(format_primitive),
            time_spent_seconds: progress.time_spent_seconds,
            last_accessed: format_primitive(progress.last_accessed),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonProgressUpdateResponse {
    pub(crate) lesson_progress: LessonProgressResponse,
    pub(crate) course_progress: CourseProgressResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct BundleProgressResponse {
    pub(crate) id: String,
    pub(crate) bundle_id: String,
    pub(crate) completed_courses: i32,
    pub(crate) total_courses: i32,
    pub(crate) completion_percentage: Decimal,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<String>,
}

impl BundleProgressResponse {
    pub(crate) fn from_db(progress: BundleProgress) -> Self {
        Self {
            id: progress.id,
            bundle_id: progress.bundle_id,
            completed_courses: progress.completed_courses,
            total_courses: progress.total_courses,
            completion_percentage: progress.completion_percentage,
            is_completed: progress.is_completed,
            completed_at: progress.completed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct StreakResponse {
    pub(crate) current_streak: i32,
    pub(crate) longest_streak: i32,
    pub(crate) last_activity_date: Option<String>,
    pub(crate) total_study_days: i32,
}

impl StreakResponse {
    pub(crate) fn from_db(streak: StudyStreak) -> Self {
        Self {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_activity_date: streak.last_activity_date.map(format_date),
            total_study_days: streak.total_study_days,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GoalCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) goal_type: GoalType,
    #[validate(range(min = 1, message = "target_value must be positive"))]
    pub(crate) target_value: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "current_value must be non-negative"))]
    pub(crate) current_value: i32,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) deadline: Option<Date>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GoalUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) goal_type: Option<GoalType>,
    #[serde(default)]
    #[validate(range(min = 1, message = "target_value must be positive"))]
    pub(crate) target_value: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0, message = "current_value must be non-negative"))]
    pub(crate) current_value: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) deadline: Option<Date>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoalResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) goal_type: GoalType,
    pub(crate) target_value: i32,
    pub(crate) current_value: i32,
    pub(crate) deadline: Option<String>,
    pub(crate) is_achieved: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl GoalResponse {
    pub(crate) fn from_db(goal: LearningGoal) -> Self {
        Self {
            id: goal.id,
            title: goal.title,
            description: goal.description,
            goal_type: goal.goal_type,
            target_value: goal.target_value,
            current_value: goal.current_value,
            deadline: goal.deadline.map(format_date),
            is_achieved: goal.is_achieved,
            created_at: format_primitive(goal.created_at),
            updated_at: format_primitive(goal.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    pub(crate) course_progress: Vec<CourseProgressResponse>,
    pub(crate) bundle_progress: Vec<BundleProgressResponse>,
    pub(crate) study_streak: StreakResponse,
    pub(crate) learning_goals: Vec<GoalResponse>,
    pub(crate) total_courses_enrolled: usize,
    pub(crate) total_courses_completed: usize,
    pub(crate) total_certificates: i64,
    pub(crate) total_study_time_seconds: i64,
}
