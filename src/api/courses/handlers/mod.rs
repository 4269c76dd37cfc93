mod catalog;
mod enrollment;
mod manage;
mod videos;

pub(super) use catalog::{
    get_course, list_categories, list_courses, name_slugs, programming_languages,
};
pub(super) use enrollment::{
    create_bundle, create_review, enroll, list_bundles, list_reviews, my_courses,
};
pub(super) use manage::{
    add_lesson, add_resource, add_section, admin_get_course, admin_list_courses, bulk_operations,
    create_category, create_course, delete_course, update_course,
};
pub(super) use videos::{list_videos, upload_video};
