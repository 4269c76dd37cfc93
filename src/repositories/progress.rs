use rust_decimal::Decimal;
use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::{
    BundleProgress, CourseProgress, LearningGoal, LessonProgress, StudyStreak,
};
use crate::db::types::GoalType;

const LESSON_COLUMNS: &str = "\
    id, user_id, lesson_id, is_completed, watch_time_seconds, progress_percentage, \
    completed_at, last_accessed, created_at";
const COURSE_COLUMNS: &str = "\
    id, user_id, course_id, completed_lessons, total_lessons, completed_quizzes, total_quizzes, \
    average_quiz_score, completion_percentage, is_completed, completed_at, time_spent_seconds, \
    last_accessed, created_at, updated_at";
const BUNDLE_COLUMNS: &str = "\
    id, user_id, bundle_id, completed_courses, total_courses, completion_percentage, \
    is_completed, completed_at, created_at, updated_at";
const STREAK_COLUMNS: &str =
    "user_id, current_streak, longest_streak, last_activity_date, total_study_days, updated_at";
const GOAL_COLUMNS: &str = "\
    id, user_id, title, description, goal_type, target_value, current_value, deadline, \
    is_achieved, created_at, updated_at";

pub(crate) struct UpsertLessonProgress<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) is_completed: Option<bool>,
    pub(crate) watch_time_seconds: Option<i64>,
    pub(crate) progress_percentage: Option<Decimal>,
    pub(crate) now: PrimitiveDateTime,
}

/// Inserts or patches the lesson row. `completed_at` is stamped on the
/// first completion only.
pub(crate) async fn upsert_lesson(
    pool: &PgPool,
    params: UpsertLessonProgress<'_>,
) -> Result<LessonProgress, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress (
            id, user_id, lesson_id, is_completed, watch_time_seconds, progress_percentage,
            completed_at, last_accessed, created_at
         ) VALUES (
            $1, $2, $3, COALESCE($4, FALSE), COALESCE($5, 0), COALESCE($6, 0),
            CASE WHEN COALESCE($4, FALSE) THEN $7 END, $7, $7
         )
         ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            is_completed = COALESCE($4, lesson_progress.is_completed),
            watch_time_seconds = COALESCE($5, lesson_progress.watch_time_seconds),
            progress_percentage = COALESCE($6, lesson_progress.progress_percentage),
            completed_at = CASE
                WHEN COALESCE($4, lesson_progress.is_completed) AND lesson_progress.completed_at IS NULL
                    THEN $7
                ELSE lesson_progress.completed_at
            END,
            last_accessed = $7
         RETURNING {LESSON_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.lesson_id)
    .bind(params.is_completed)
    .bind(params.watch_time_seconds)
    .bind(params.progress_percentage)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_lessons_for_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<LessonProgress>, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(
        "SELECT lp.id, lp.user_id, lp.lesson_id, lp.is_completed, lp.watch_time_seconds,
                lp.progress_percentage, lp.completed_at, lp.last_accessed, lp.created_at
         FROM lesson_progress lp
         JOIN lessons l ON l.id = lp.lesson_id
         JOIN course_sections s ON s.id = l.section_id
         WHERE lp.user_id = $1 AND s.course_id = $2
         ORDER BY s.sort_order, l.sort_order",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Completed lessons and summed watch time of a user within a course.
pub(crate) async fn lesson_totals(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*) FILTER (WHERE lp.is_completed),
                COALESCE(SUM(lp.watch_time_seconds), 0)::bigint
         FROM lesson_progress lp
         JOIN lessons l ON l.id = lp.lesson_id
         JOIN course_sections s ON s.id = l.section_id
         WHERE lp.user_id = $1 AND s.course_id = $2",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn get_or_create_course(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    course_id: &str,
    now: PrimitiveDateTime,
) -> Result<CourseProgress, sqlx::Error> {
    sqlx::query(
        "INSERT INTO course_progress (id, user_id, course_id, last_accessed, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4, $4)
         ON CONFLICT (user_id, course_id) DO NOTHING",
    )
    .bind(id)
    .bind(user_id)
    .bind(course_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, CourseProgress>(&format!(
        "SELECT {COURSE_COLUMNS} FROM course_progress WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Option<CourseProgress>, sqlx::Error> {
    sqlx::query_as::<_, CourseProgress>(&format!(
        "SELECT {COURSE_COLUMNS} FROM course_progress WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct SaveCourseProgress {
    pub(crate) completed_lessons: i32,
    pub(crate) total_lessons: i32,
    pub(crate) completed_quizzes: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) average_quiz_score: Decimal,
    pub(crate) completion_percentage: Decimal,
    pub(crate) is_completed: bool,
    pub(crate) time_spent_seconds: i64,
    pub(crate) now: PrimitiveDateTime,
}

/// Writes recomputed counters. `completed_at` is stamped once and kept.
pub(crate) async fn save_course(
    pool: &PgPool,
    id: &str,
    params: SaveCourseProgress,
) -> Result<CourseProgress, sqlx::Error> {
    sqlx::query_as::<_, CourseProgress>(&format!(
        "UPDATE course_progress SET
            completed_lessons = $1,
            total_lessons = $2,
            completed_quizzes = $3,
            total_quizzes = $4,
            average_quiz_score = $5,
            completion_percentage = $6,
            is_completed = is_completed OR $7,
            completed_at = CASE WHEN $7 AND completed_at IS NULL THEN $9 ELSE completed_at END,
            time_spent_seconds = $8,
            last_accessed = $9,
            updated_at = $9
         WHERE id = $10
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.completed_lessons)
    .bind(params.total_lessons)
    .bind(params.completed_quizzes)
    .bind(params.total_quizzes)
    .bind(params.average_quiz_score)
    .bind(params.completion_percentage)
    .bind(params.is_completed)
    .bind(params.time_spent_seconds)
    .bind(params.now)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_completed_courses(
    pool: &PgPool,
    user_id: &str,
    course_ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM course_progress
         WHERE user_id = $1 AND course_id = ANY($2) AND is_completed = TRUE",
    )
    .bind(user_id)
    .bind(course_ids)
    .fetch_one(pool)
    .await
}

pub(crate) async fn total_time_spent(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(time_spent_seconds), 0)::bigint FROM course_progress WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn get_or_create_bundle(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    bundle_id: &str,
    now: PrimitiveDateTime,
) -> Result<BundleProgress, sqlx::Error> {
    sqlx::query(
        "INSERT INTO bundle_progress (id, user_id, bundle_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         ON CONFLICT (user_id, bundle_id) DO NOTHING",
    )
    .bind(id)
    .bind(user_id)
    .bind(bundle_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, BundleProgress>(&format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundle_progress WHERE user_id = $1 AND bundle_id = $2"
    ))
    .bind(user_id)
    .bind(bundle_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_bundle(
    pool: &PgPool,
    user_id: &str,
    bundle_id: &str,
) -> Result<Option<BundleProgress>, sqlx::Error> {
    sqlx::query_as::<_, BundleProgress>(&format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundle_progress WHERE user_id = $1 AND bundle_id = $2"
    ))
    .bind(user_id)
    .bind(bundle_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_bundles(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<BundleProgress>, sqlx::Error> {
    sqlx::query_as::<_, BundleProgress>(&format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundle_progress WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn save_bundle(
    pool: &PgPool,
    id: &str,
    completed_courses: i32,
    total_courses: i32,
    completion_percentage: Decimal,
    is_completed: bool,
    now: PrimitiveDateTime,
) -> Result<BundleProgress, sqlx::Error> {
    sqlx::query_as::<_, BundleProgress>(&format!(
        "UPDATE bundle_progress SET
            completed_courses = $1,
            total_courses = $2,
            completion_percentage = $3,
            is_completed = is_completed OR $4,
            completed_at = CASE WHEN $4 AND completed_at IS NULL THEN $5 ELSE completed_at END,
            updated_at = $5
         WHERE id = $6
         RETURNING {BUNDLE_COLUMNS}",
    ))
    .bind(completed_courses)
    .bind(total_courses)
    .bind(completion_percentage)
    .bind(is_completed)
    .bind(now)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_streak(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
) -> Result<Option<StudyStreak>, sqlx::Error> {
    sqlx::query_as::<_, StudyStreak>(&format!(
        "SELECT {STREAK_COLUMNS} FROM study_streaks WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn save_streak(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    current: i32,
    longest: i32,
    last_activity: Option<Date>,
    total_days: i32,
    now: PrimitiveDateTime,
) -> Result<StudyStreak, sqlx::Error> {
    sqlx::query_as::<_, StudyStreak>(&format!(
        "INSERT INTO study_streaks (
            user_id, current_streak, longest_streak, last_activity_date, total_study_days, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (user_id) DO UPDATE SET
            current_streak = EXCLUDED.current_streak,
            longest_streak = EXCLUDED.longest_streak,
            last_activity_date = EXCLUDED.last_activity_date,
            total_study_days = EXCLUDED.total_study_days,
            updated_at = EXCLUDED.updated_at
         RETURNING {STREAK_COLUMNS}",
    ))
    .bind(user_id)
    .bind(current)
    .bind(longest)
    .bind(last_activity)
    .bind(total_days)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_goals(pool: &PgPool, user_id: &str) -> Result<Vec<LearningGoal>, sqlx::Error> {
    sqlx::query_as::<_, LearningGoal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM learning_goals WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_goal(
    pool: &PgPool,
    user_id: &str,
    id: &str,
) -> Result<Option<LearningGoal>, sqlx::Error> {
    sqlx::query_as::<_, LearningGoal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM learning_goals WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateGoal<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) goal_type: GoalType,
    pub(crate) target_value: i32,
    pub(crate) current_value: i32,
    pub(crate) deadline: Option<Date>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_goal(
    pool: &PgPool,
    params: CreateGoal<'_>,
) -> Result<LearningGoal, sqlx::Error> {
    sqlx::query_as::<_, LearningGoal>(&format!(
        "INSERT INTO learning_goals (
            id, user_id, title, description, goal_type, target_value, current_value, deadline,
            is_achieved, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$7 >= $6,$9,$9)
         RETURNING {GOAL_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.goal_type)
    .bind(params.target_value)
    .bind(params.current_value)
    .bind(params.deadline)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateGoal {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) goal_type: Option<GoalType>,
    pub(crate) target_value: Option<i32>,
    pub(crate) current_value: Option<i32>,
    pub(crate) deadline: Option<Date>,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Patches a goal and re-derives `is_achieved` from the stored values.
pub(crate) async fn update_goal(
    pool: &PgPool,
    user_id: &str,
    id: &str,
    params: UpdateGoal,
) -> Result<Option<LearningGoal>, sqlx::Error> {
    sqlx::query_as::<_, LearningGoal>(&format!(
        "UPDATE learning_goals SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            goal_type = COALESCE($3, goal_type),
            target_value = COALESCE($4, target_value),
            current_value = COALESCE($5, current_value),
            deadline = COALESCE($6, deadline),
            is_achieved = COALESCE($5, current_value) >= COALESCE($4, target_value),
            updated_at = $7
         WHERE id = $8 AND user_id = $9
         RETURNING {GOAL_COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.goal_type)
    .bind(params.target_value)
    .bind(params.current_value)
    .bind(params.deadline)
    .bind(params.updated_at)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_goal(pool: &PgPool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM learning_goals WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
