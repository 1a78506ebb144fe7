use anyhow::Context;

/// Configuration for the remote recognition service.
pub struct RecognitionConfig {
    pub api_url: String,
    pub api_key: String,
}

impl RecognitionConfig {
    /// Environment variables:
    /// - RECOGNITION_API_URL: Base URL of the recognition service (required)
    /// - RECOGNITION_API_KEY: Bearer token (required)
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url =
            std::env::var("RECOGNITION_API_URL").context("RECOGNITION_API_URL must be set")?;
        let api_key =
            std::env::var("RECOGNITION_API_KEY").context("RECOGNITION_API_KEY must be set")?;

        Ok(Self { api_url, api_key })
    }
}
