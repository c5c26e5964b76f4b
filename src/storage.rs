use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Lifetime of signed read URLs handed out for history images.
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 60;

/// Media access used by handlers. History images are written under
/// `predict-result/image/` and only ever read through short-lived signed
/// URLs; profile images are public objects under `user/profile/`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
    fn public_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl S3Store {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                cfg.access_key.clone(),
                cfg.secret_key.clone(),
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

/// `predict-result/image/{historyId}-{unixTs}.jpg`
pub fn history_image_key(history_id: Uuid, taken_at: OffsetDateTime) -> String {
    format!(
        "predict-result/image/{}-{}.jpg",
        history_id,
        taken_at.unix_timestamp()
    )
}

/// `user/profile/{userId}-{unixTs}.jpg`
pub fn profile_image_key(user_id: Uuid, taken_at: OffsetDateTime) -> String {
    format!("user/profile/{}-{}.jpg", user_id, taken_at.unix_timestamp())
}
