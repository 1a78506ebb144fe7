use poem::http::StatusCode;
use poem_openapi::payload::Json;

use business::domain::identification::errors::IdentificationError;

use crate::api::error::{ErrorResponse, IntoErrorResponse};

impl IntoErrorResponse for IdentificationError {
    fn into_error_response(self) -> (StatusCode, Json<ErrorResponse>) {
        // Only image decoding is reachable from request input. Result
        // validation failures are folded into `malformed_response` by the
        // recognition adapter and reported through the pipeline state.
        let (status, name) = match &self {
            IdentificationError::ImageEncoding => (StatusCode::BAD_REQUEST, "ValidationError"),
            IdentificationError::NameEmpty | IdentificationError::ConfidenceOutOfRange => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
            }
        };

        (
            status,
            Json(ErrorResponse {
                name: name.to_string(),
                message: self.to_string(),
            }),
        )
    }
}
