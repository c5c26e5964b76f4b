use anyhow::Context;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: String,
    /// Square edge of the classifier input. 224 for the current model
    /// artifact; older exports were trained at 150.
    pub input_size: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub storage: StorageConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT").context("MINIO_ENDPOINT is not set")?,
            bucket: std::env::var("MINIO_BUCKET").context("MINIO_BUCKET is not set")?,
            access_key: std::env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY is not set")?,
            secret_key: std::env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY is not set")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        let model = ModelConfig {
            path: std::env::var("MODEL_PATH").context("MODEL_PATH is not set")?,
            input_size: std::env::var("MODEL_INPUT_SIZE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(224),
        };

        Ok(Self {
            database_url,
            storage,
            model,
        })
    }
}
