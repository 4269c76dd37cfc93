use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{
    Category, Course, CourseBundle, CourseResource, CourseReview, CourseSection, Enrollment,
    Lesson, RecordedVideo,
};
use crate::db::types::{DifficultyLevel, LessonType, ResourceType};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CategoryCreate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) icon: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) icon: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl CategoryResponse {
    pub(crate) fn from_db(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
            is_active: category.is_active,
            created_at: format_primitive(category.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CategorySummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseNameSlug {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CourseListQuery {
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) ordering: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminCourseQuery {
    #[serde(default)]
    pub(crate) is_published: Option<bool>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) ordering: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    /// Category name.
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub(crate) category: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) instructor: Option<String>,
    pub(crate) price: Decimal,
    #[serde(default)]
    pub(crate) discounted_price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration_hours must be non-negative"))]
    pub(crate) duration_hours: i32,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub(crate) prerequisites: String,
    #[serde(default)]
    pub(crate) what_you_learn: Vec<String>,
    #[serde(default)]
    pub(crate) requirements: Vec<String>,
    #[serde(default)]
    pub(crate) is_published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructor: Option<String>,
    #[serde(default)]
    pub(crate) price: Option<Decimal>,
    #[serde(default)]
    pub(crate) discounted_price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration_hours must be non-negative"))]
    pub(crate) duration_hours: Option<i32>,
    #[serde(default)]
    pub(crate) difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub(crate) prerequisites: Option<String>,
    #[serde(default)]
    pub(crate) what_you_learn: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) requirements: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) is_published: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) category_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) instructor: String,
    pub(crate) price: Decimal,
    pub(crate) discounted_price: Option<Decimal>,
    pub(crate) effective_price: Decimal,
    pub(crate) duration_hours: i32,
    pub(crate) difficulty_level: DifficultyLevel,
    pub(crate) prerequisites: String,
    pub(crate) what_you_learn: Vec<String>,
    pub(crate) requirements: Vec<String>,
    pub(crate) is_published: bool,
    pub(crate) enrollment_count: i32,
    pub(crate) rating: Decimal,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enrolled: Option<bool>,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        let effective_price = course.effective_price();
        Self {
            id: course.id,
            category_id: course.category_id,
            title: course.title,
            slug: course.slug,
            description: course.description,
            instructor: course.instructor,
            price: course.price,
            discounted_price: course.discounted_price,
            effective_price,
            duration_hours: course.duration_hours,
            difficulty_level: course.difficulty_level,
            prerequisites: course.prerequisites,
            what_you_learn: course.what_you_learn.0,
            requirements: course.requirements.0,
            is_published: course.is_published,
            enrollment_count: course.enrollment_count,
            rating: course.rating,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
            enrolled: None,
        }
    }

    pub(crate) fn with_enrolled(mut self, enrolled: bool) -> Self {
        self.enrolled = Some(enrolled);
        self
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default, rename = "order")]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LessonCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default)]
    #[validate(url(message = "video_url must be a valid URL"))]
    pub(crate) video_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "video_duration_seconds must be non-negative"))]
    pub(crate) video_duration_seconds: Option<i32>,
    #[serde(default = "default_lesson_type")]
    pub(crate) lesson_type: LessonType,
    #[serde(default, rename = "order")]
    #[validate(range(min = 0, message = "order must be non-negative"))]
    pub(crate) sort_order: i32,
    #[serde(default)]
    pub(crate) is_free: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ResourceCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    pub(crate) resource_type: ResourceType,
    #[validate(url(message = "url must be a valid URL"))]
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) description: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) video_url: Option<String>,
    pub(crate) video_duration_seconds: Option<i32>,
    pub(crate) lesson_type: LessonType,
    #[serde(rename = "order")]
    pub(crate) sort_order: i32,
    pub(crate) is_free: bool,
    pub(crate) is_locked: bool,
}

impl LessonResponse {
    /// Locked lessons keep their outline but drop content and video.
    pub(crate) fn from_db(lesson: Lesson, unlocked: bool) -> Self {
        let is_locked = !unlocked && !lesson.is_free;
        Self {
            id: lesson.id,
            section_id: lesson.section_id,
            title: lesson.title,
            content: if is_locked { String::new() } else { lesson.content },
            video_url: if is_locked { None } else { lesson.video_url },
            video_duration_seconds: lesson.video_duration_seconds,
            lesson_type: lesson.lesson_type,
            sort_order: lesson.sort_order,
            is_free: lesson.is_free,
            is_locked,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SectionResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(rename = "order")]
    pub(crate) sort_order: i32,
    pub(crate) lessons: Vec<LessonResponse>,
}

impl SectionResponse {
    pub(crate) fn from_db(section: CourseSection, lessons: Vec<LessonResponse>) -> Self {
        Self {
            id: section.id,
            course_id: section.course_id,
            title: section.title,
            description: section.description,
            sort_order: section.sort_order,
            lessons,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) url: String,
    pub(crate) description: String,
}

impl ResourceResponse {
    pub(crate) fn from_db(resource: CourseResource) -> Self {
        Self {
            id: resource.id,
            course_id: resource.course_id,
            title: resource.title,
            resource_type: resource.resource_type,
            url: resource.url,
            description: resource.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseDetailResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) sections: Vec<SectionResponse>,
    pub(crate) resources: Vec<ResourceResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    /// Course id.
    pub(crate) course: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) enrolled_at: String,
    pub(crate) is_active: bool,
    pub(crate) completion_percentage: Decimal,
    pub(crate) payment_id: Option<String>,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            is_active: enrollment.is_active,
            completion_percentage: enrollment.completion_percentage,
            payment_id: enrollment.payment_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollResponse {
    pub(crate) message: String,
    pub(crate) enrollment: EnrollmentResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct MyCourseResponse {
    #[serde(flatten)]
    pub(crate) enrollment: EnrollmentResponse,
    pub(crate) course: CourseResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewCreate {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub(crate) rating: i16,
    #[serde(default)]
    pub(crate) comment: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) rating: i16,
    pub(crate) comment: String,
    pub(crate) created_at: String,
}

impl ReviewResponse {
    pub(crate) fn from_db(review: CourseReview) -> Self {
        Self {
            id: review.id,
            course_id: review.course_id,
            student_id: review.student_id,
            rating: review.rating,
            comment: review.comment,
            created_at: format_primitive(review.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BundleCreate {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "courses must not be empty"))]
    pub(crate) courses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BundleResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) total_price: Decimal,
    pub(crate) discount_percentage: Decimal,
    pub(crate) final_price: Decimal,
    pub(crate) courses: Vec<CourseResponse>,
    pub(crate) created_at: String,
}

impl BundleResponse {
    pub(crate) fn from_db(bundle: CourseBundle, courses: Vec<Course>) -> Self {
        Self {
            id: bundle.id,
            name: bundle.name,
            total_price: bundle.total_price,
            discount_percentage: bundle.discount_percentage,
            final_price: bundle.final_price,
            courses: courses.into_iter().map(CourseResponse::from_db).collect(),
            created_at: format_primitive(bundle.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordedVideoResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content_type: String,
    pub(crate) size_bytes: i64,
    pub(crate) video_url: Option<String>,
    pub(crate) created_at: String,
}

impl RecordedVideoResponse {
    pub(crate) fn from_db(video: RecordedVideo, video_url: Option<String>) -> Self {
        Self {
            id: video.id,
            course_id: video.course_id,
            title: video.title,
            description: video.description,
            content_type: video.content_type,
            size_bytes: video.size_bytes,
            video_url,
            created_at: format_primitive(video.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkOperationRequest {
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) course_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkOperationResponse {
    pub(crate) message: String,
    pub(crate) affected: u64,
}

fn default_difficulty() -> DifficultyLevel {
    DifficultyLevel::Beginner
}

fn default_lesson_type() -> LessonType {
    LessonType::Text
}
