mod attendance;
mod classes;
mod control;

pub(super) use attendance::{attendance_history, join_class, leave_class, list_attendees};
pub(super) use classes::{
    class_status, course_classes, create_class, get_class, list_classes, update_class,
    upcoming_classes,
};
pub(super) use control::{
    end_class, get_recording, save_recording, send_reminder, start_class, stop_and_delete,
};
