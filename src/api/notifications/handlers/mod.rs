mod bulk;
mod inbox;
mod templates;

pub(super) use bulk::{create_bulk, delete_bulk, get_bulk, list_bulk, send_bulk};
pub(super) use inbox::{
    create_notification, delete_notification, get_notification, list_notifications,
    mark_all_read, mark_read, unread_count, update_notification,
};
pub(super) use templates::{
    create_template, delete_template, get_template, list_templates, update_template,
};
