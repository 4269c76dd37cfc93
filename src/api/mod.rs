pub(crate) mod assessments;
pub(crate) mod auth;
pub(crate) mod certificates;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod live;
pub(crate) mod notifications;
pub(crate) mod pagination;
pub(crate) mod payments;
pub(crate) mod progress;
pub(crate) mod router;
pub(crate) mod validation;
