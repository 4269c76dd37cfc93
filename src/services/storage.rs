use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::core::config::Settings;

/// Object storage for recorded lecture videos.
#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "kodeto-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self { client, bucket: settings.s3().bucket.clone() }))
    }

    pub(crate) async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    /// Stores `bytes` under `key`; returns the size and sha256 hex digest.
    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<(i64, String)> {
        let size = bytes.len() as i64;
        let hash_hex = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok((size, hash_hex))
    }
}

pub(crate) fn video_key(course_id: &str, video_id: &str, filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp4".to_string());
    format!("recorded-videos/{course_id}/{video_id}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::{video_key, StorageService};
    use crate::core::config::Settings;
    use crate::test_support;
    use std::time::Duration;

    #[tokio::test]
    async fn presign_get_returns_url() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let key = video_key("course-1", "video-1", "lecture.MP4");
        let get_url =
            storage.presign_get(&key, Duration::from_secs(300)).await.expect("presign get");

        assert!(get_url.contains("video-1.mp4"));
    }

    #[tokio::test]
    async fn storage_is_disabled_without_keys() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings).await.expect("storage");
        assert!(storage.is_none());
    }

    #[test]
    fn video_key_sanitizes_extension() {
        assert_eq!(video_key("c", "v", "intro.webm"), "recorded-videos/c/v.webm");
        assert_eq!(video_key("c", "v", "no-extension"), "recorded-videos/c/v.mp4");
        assert_eq!(video_key("c", "v", "weird.$$$"), "recorded-videos/c/v.mp4");
    }
}
