use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod assessment;
pub(crate) mod auth;
pub(crate) mod certificate;
pub(crate) mod course;
pub(crate) mod datetime;
pub(crate) mod live;
pub(crate) mod notification;
pub(crate) mod payment;
pub(crate) mod progress;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) docs_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
