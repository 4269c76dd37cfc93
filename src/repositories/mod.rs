pub(crate) mod assessments;
pub(crate) mod attempts;
pub(crate) mod bundles;
pub(crate) mod categories;
pub(crate) mod certificates;
pub(crate) mod course_content;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod health;
pub(crate) mod live_classes;
pub(crate) mod notes;
pub(crate) mod notifications;
pub(crate) mod payments;
pub(crate) mod progress;
pub(crate) mod recorded_videos;
pub(crate) mod reviews;
pub(crate) mod user_profiles;
pub(crate) mod users;
