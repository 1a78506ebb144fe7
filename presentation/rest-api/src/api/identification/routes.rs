use std::sync::Arc;

use poem_openapi::{OpenApi, payload::Json};

use business::domain::identification::use_cases::identify::{IdentifyParams, IdentifyUseCase};
use business::domain::identification::value_objects::CapturedImage;

use crate::api::error::{ErrorResponse, IntoErrorResponse};
use crate::api::identification::dto::{
    IdentificationAcceptedResponse, IdentificationStateResponse, IdentifyRequest,
};
use crate::api::tags::ApiTags;

pub struct IdentificationApi {
    identify_use_case: Arc<dyn IdentifyUseCase>,
}

impl IdentificationApi {
    pub fn new(identify_use_case: Arc<dyn IdentifyUseCase>) -> Self {
        Self { identify_use_case }
    }
}

/// Specimen identification API
///
/// One identification runs at a time. Starting a new one supersedes the
/// previous request.
#[OpenApi]
impl IdentificationApi {
    /// Start identifying a photo
    ///
    /// Preprocesses the image and sends it to the recognition service in the
    /// background. Poll `GET /identifications/current` for progress.
    #[oai(path = "/identifications", method = "post", tag = "ApiTags::Identifications")]
    async fn start_identification(&self, body: Json<IdentifyRequest>) -> StartIdentificationResponse {
        let image = match CapturedImage::from_base64(&body.0.image_base64) {
            Ok(image) => image,
            Err(err) => {
                let (_, json) = err.into_error_response();
                return StartIdentificationResponse::BadRequest(json);
            }
        };

        let request_id = self
            .identify_use_case
            .identify(IdentifyParams { image })
            .await;
        let state = self.identify_use_case.current_state();

        StartIdentificationResponse::Accepted(Json(IdentificationAcceptedResponse::new(
            request_id, state,
        )))
    }

    /// Get the current identification state
    #[oai(
        path = "/identifications/current",
        method = "get",
        tag = "ApiTags::Identifications"
    )]
    async fn current_identification(&self) -> Json<IdentificationStateResponse> {
        Json(self.identify_use_case.current_state().into())
    }

    /// Cancel the in-flight identification
    ///
    /// Returns the pipeline to idle. Finished results are left untouched.
    #[oai(
        path = "/identifications/current",
        method = "delete",
        tag = "ApiTags::Identifications"
    )]
    async fn cancel_identification(&self) -> CancelIdentificationResponse {
        self.identify_use_case.cancel();
        CancelIdentificationResponse::NoContent
    }
}

#[derive(poem_openapi::ApiResponse)]
pub enum StartIdentificationResponse {
    #[oai(status = 202)]
    Accepted(Json<IdentificationAcceptedResponse>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),
}

#[derive(poem_openapi::ApiResponse)]
pub enum CancelIdentificationResponse {
    #[oai(status = 204)]
    NoContent,
}
