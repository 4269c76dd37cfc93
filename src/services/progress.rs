use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{BundleProgress, CourseProgress, StudyStreak};
use crate::repositories;
use crate::services::grading;
use crate::services::progress_calc::{self, Streak};

/// Rebuilds a user's course progress from lesson rows and quiz attempts and
/// mirrors the percentage onto the enrollment.
pub(crate) async fn recompute_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<CourseProgress, sqlx::Error> {
    let now = primitive_now_utc();
    let progress = repositories::progress::get_or_create_course(
        pool,
        &Uuid::new_v4().to_string(),
        user_id,
        course_id,
        now,
    )
    .await?;

    let total_lessons = repositories::course_content::count_lessons(pool, course_id).await?;
    let (completed_lessons, watch_time) =
        repositories::progress::lesson_totals(pool, user_id, course_id).await?;
    let total_quizzes = repositories::assessments::count_published_quizzes(pool, course_id).await?;
    let best_scores = repositories::attempts::best_quiz_scores(pool, user_id, course_id).await?;

    let percentages: Vec<_> = best_scores
        .iter()
        .map(|score| grading::percentage(score.best_marks, score.total_marks))
        .collect();
    let completed_quizzes = best_scores.len() as i64;

    let completion = progress_calc::course_completion(
        completed_lessons,
        total_lessons,
        completed_quizzes,
        total_quizzes,
    );

    let saved = repositories::progress::save_course(
        pool,
        &progress.id,
        repositories::progress::SaveCourseProgress {
            completed_lessons: clamp_i32(completed_lessons),
            total_lessons: clamp_i32(total_lessons),
            completed_quizzes: clamp_i32(completed_quizzes),
            total_quizzes: clamp_i32(total_quizzes),
            average_quiz_score: progress_calc::average(&percentages),
            completion_percentage: completion,
            is_completed: progress_calc::course_is_complete(completion),
            time_spent_seconds: watch_time,
            now,
        },
    )
    .await?;

    repositories::enrollments::set_completion(pool, user_id, course_id, completion).await?;

    Ok(saved)
}

pub(crate) async fn recompute_bundle(
    pool: &PgPool,
    user_id: &str,
    bundle_id: &str,
) -> Result<BundleProgress, sqlx::Error> {
    let now = primitive_now_utc();
    let progress = repositories::progress::get_or_create_bundle(
        pool,
        &Uuid::new_v4().to_string(),
        user_id,
        bundle_id,
        now,
    )
    .await?;

    let course_ids = repositories::bundles::course_ids(pool, bundle_id).await?;
    let total = course_ids.len() as i64;
    let completed =
        repositories::progress::count_completed_courses(pool, user_id, &course_ids).await?;
    let completion = progress_calc::ratio_percentage(completed, total);

    repositories::progress::save_bundle(
        pool,
        &progress.id,
        clamp_i32(completed),
        clamp_i32(total),
        completion,
        total > 0 && progress_calc::bundle_is_complete(completion),
        now,
    )
    .await
}

/// Recomputes every bundle of the user that includes `course_id`.
pub(crate) async fn recompute_bundles_with_course(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    let bundle_ids =
        repositories::bundles::ids_containing_course(pool, user_id, course_id).await?;
    for bundle_id in bundle_ids {
        recompute_bundle(pool, user_id, &bundle_id).await?;
    }
    Ok(())
}

/// Counts today as a study day for the user.
pub(crate) async fn record_study_day(pool: &PgPool, user_id: &str) -> Result<StudyStreak, sqlx::Error> {
    let now = primitive_now_utc();
    let current = repositories::progress::find_streak(pool, user_id).await?;
    let streak = current
        .map(|row| Streak {
            current: row.current_streak,
            longest: row.longest_streak,
            total_days: row.total_study_days,
            last_activity: row.last_activity_date,
        })
        .unwrap_or(Streak { current: 0, longest: 0, total_days: 0, last_activity: None });

    let next = progress_calc::record_activity(streak, now.date());
    repositories::progress::save_streak(
        pool,
        user_id,
        next.current,
        next.longest,
        next.last_activity,
        next.total_days,
        now,
    )
    .await
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
