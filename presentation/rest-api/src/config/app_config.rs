use super::{
    cors_config, pipeline_config::PipelineConfig, recognition_config::RecognitionConfig,
    server_config::ServerConfig,
};
use poem::middleware::Cors;

pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: Cors,
    pub recognition: RecognitionConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            cors: cors_config::init_cors(),
            recognition: RecognitionConfig::from_env()?,
            pipeline: PipelineConfig::from_env()?,
        })
    }
}
