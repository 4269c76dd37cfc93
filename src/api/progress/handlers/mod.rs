mod courses;
mod dashboard;
mod goals;

pub(super) use courses::{
    course_lesson_progress, get_bundle_progress, get_course_progress, list_course_progress,
    update_lesson_progress,
};
pub(super) use dashboard::dashboard;
pub(super) use goals::{create_goal, delete_goal, get_goal, list_goals, update_goal};
