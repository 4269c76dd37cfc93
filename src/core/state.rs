use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::mailer::Mailer;
use crate::services::razorpay::RazorpayClient;
use crate::services::storage::StorageService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    mailer: Mailer,
    razorpay: RazorpayClient,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> anyhow::Result<Self> {
        let mailer = Mailer::from_settings(&settings)?;
        let razorpay = RazorpayClient::from_settings(&settings)?;

        Ok(Self {
            inner: Arc::new(InnerState { settings, db, redis, storage, mailer, razorpay }),
        })
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    pub(crate) fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }
}
