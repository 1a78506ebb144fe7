use std::sync::Arc;

use anyhow::Context;

use logger::TracingLogger;

use imaging::preprocessor::JpegImagePreprocessor;
use recognition::client::RecognitionHttpClient;
use recognition::recognition_client::RecognitionClientHttp;

use business::application::identification::pipeline::{IdentifyUseCaseDeps, IdentifyUseCaseImpl};
use business::application::identification::scheduler::TokioRetryScheduler;
use business::domain::identification::retry::RetryController;
use business::domain::identification::use_cases::identify::IdentifyUseCase;

use crate::config::app_config::AppConfig;

pub struct DependencyContainer {
    pub health_api: crate::api::health::routes::Api,
    pub identification_api: crate::api::identification::routes::IdentificationApi,
}

impl DependencyContainer {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let logger = Arc::new(TracingLogger);

        // Infrastructure adapters
        let http_client = RecognitionHttpClient::new(
            config.recognition.api_url.clone(),
            config.recognition.api_key.clone(),
        )
        .context("failed to build recognition HTTP client")?;
        let recognition_client = Arc::new(RecognitionClientHttp::new(http_client));
        let preprocessor = Arc::new(JpegImagePreprocessor::new(config.pipeline.preprocessor));
        let scheduler = Arc::new(TokioRetryScheduler::new());

        // Identification use case
        let identify_use_case: Arc<dyn IdentifyUseCase> =
            Arc::new(IdentifyUseCaseImpl::new(IdentifyUseCaseDeps {
                preprocessor,
                client: recognition_client,
                scheduler,
                controller: RetryController::new(config.pipeline.retry.clone()),
                attempt_timeout: config.pipeline.attempt_timeout,
                logger,
            }));

        let health_api = crate::api::health::routes::Api::new(identify_use_case.clone());
        let identification_api =
            crate::api::identification::routes::IdentificationApi::new(identify_use_case);

        Ok(Self {
            health_api,
            identification_api,
        })
    }
}
