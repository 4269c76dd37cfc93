use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::LiveClass;
use crate::db::types::{LiveClassStatus, LivePlatform};
use crate::repositories::live_classes::{AttendanceWithClass, AttendeeRow};
use crate::schemas::datetime::{deserialize_datetime, deserialize_option_datetime};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LiveClassCreate {
    /// Course id.
    #[validate(length(min = 1, message = "course must not be empty"))]
    pub(crate) course: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) instructor: Option<String>,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) scheduled_start: PrimitiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) scheduled_end: PrimitiveDateTime,
    #[serde(default = "default_max_participants")]
    #[validate(range(min = 1, message = "max_participants must be positive"))]
    pub(crate) max_participants: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LiveClassUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) instructor: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) scheduled_start: Option<PrimitiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) scheduled_end: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[validate(range(min = 1, message = "max_participants must be positive"))]
    pub(crate) max_participants: Option<i32>,
    #[serde(default)]
    pub(crate) status: Option<LiveClassStatus>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LiveClassResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructor: String,
    pub(crate) scheduled_start: String,
    pub(crate) scheduled_end: String,
    pub(crate) platform: LivePlatform,
    pub(crate) meeting_id: String,
    pub(crate) meeting_url: String,
    pub(crate) status: LiveClassStatus,
    pub(crate) max_participants: i32,
    pub(crate) recording_url: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
}

impl LiveClassResponse {
    pub(crate) fn from_db(class: LiveClass) -> Self {
        Self {
            id: class.id,
            course_id: class.course_id,
            title: class.title,
            description: class.description,
            instructor: class.instructor,
            scheduled_start: format_primitive(class.scheduled_start),
            scheduled_end: format_primitive(class.scheduled_end),
            platform: class.platform,
            meeting_id: class.meeting_id,
            meeting_url: class.meeting_url,
            status: class.status,
            max_participants: class.max_participants,
            recording_url: class.recording_url,
            created_by: class.created_by,
            created_at: format_primitive(class.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JoinResponse {
    pub(crate) message: String,
    pub(crate) meeting_url: String,
    pub(crate) room_name: String,
    pub(crate) display_name: String,
    pub(crate) domain: String,
    pub(crate) is_moderator: bool,
    pub(crate) jwt: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaveResponse {
    pub(crate) message: String,
    pub(crate) duration_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct LiveStatusResponse {
    pub(crate) id: String,
    pub(crate) status: LiveClassStatus,
    pub(crate) scheduled_start: String,
    pub(crate) scheduled_end: String,
    pub(crate) meeting_url: Option<String>,
}

impl LiveStatusResponse {
    pub(crate) fn from_db(class: LiveClass) -> Self {
        let meeting_url = (class.status == LiveClassStatus::Live).then_some(class.meeting_url);
        Self {
            id: class.id,
            status: class.status,
            scheduled_start: format_primitive(class.scheduled_start),
            scheduled_end: format_primitive(class.scheduled_end),
            meeting_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LiveTransitionResponse {
    pub(crate) message: String,
    pub(crate) class_id: String,
    pub(crate) status: LiveClassStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordingRequest {
    #[serde(default)]
    pub(crate) recording_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordingResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) recording_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendeeResponse {
    pub(crate) student_id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) joined_at: String,
    pub(crate) left_at: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_online: bool,
}

impl AttendeeResponse {
    pub(crate) fn from_db(row: AttendeeRow) -> Self {
        Self {
            student_id: row.attendance.student_id,
            username: row.username,
            email: row.email,
            joined_at: format_primitive(row.attendance.joined_at),
            left_at: row.attendance.left_at.map(format_primitive),
            duration_minutes: row.attendance.duration_minutes,
            is_online: row.attendance.left_at.is_none(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendeesResponse {
    pub(crate) live_class_id: String,
    pub(crate) total_attendees: usize,
    pub(crate) currently_online: usize,
    pub(crate) attendees: Vec<AttendeeResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceEntry {
    pub(crate) live_class_id: String,
    pub(crate) class_title: String,
    pub(crate) course_id: String,
    pub(crate) joined_at: String,
    pub(crate) left_at: Option<String>,
    pub(crate) duration_minutes: i32,
}

impl AttendanceEntry {
    pub(crate) fn from_db(row: AttendanceWithClass) -> Self {
        Self {
            live_class_id: row.attendance.live_class_id,
            class_title: row.class_title,
            course_id: row.course_id,
            joined_at: format_primitive(row.attendance.joined_at),
            left_at: row.attendance.left_at.map(format_primitive),
            duration_minutes: row.attendance.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceHistoryResponse {
    pub(crate) total_classes_attended: usize,
    pub(crate) total_duration_minutes: i64,
    pub(crate) attendance: Vec<AttendanceEntry>,
}

fn default_max_participants() -> i32 {
    100
}
