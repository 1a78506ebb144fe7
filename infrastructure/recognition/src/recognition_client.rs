use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use business::domain::identification::errors::FailureReason;
use business::domain::identification::model::IdentificationResult;
use business::domain::identification::request::IdentificationRequest;
use business::domain::identification::services::RecognitionClient;
use business::domain::identification::value_objects::ImageReference;

use crate::client::RecognitionHttpClient;
use crate::dto::{ErrorEnvelope, IdentificationBody, IdentifyRequestBody};

const CORRELATION_HEADER: &str = "X-Correlation-Id";
const ATTEMPT_HEADER: &str = "X-Attempt";

pub struct RecognitionClientHttp {
    client: RecognitionHttpClient,
}

impl RecognitionClientHttp {
    pub fn new(client: RecognitionHttpClient) -> Self {
        Self { client }
    }

    async fn execute(
        &self,
        request: &IdentificationRequest,
    ) -> Result<IdentificationResult, FailureReason> {
        let payload = request.payload();
        let meta = request.meta();

        let response = self
            .client
            .client
            .post(self.client.identify_url())
            .header("Authorization", self.client.auth_header())
            .header(CORRELATION_HEADER, meta.correlation_id.to_string())
            .header(ATTEMPT_HEADER, meta.attempt.to_string())
            .timeout(meta.timeout)
            .json(&IdentifyRequestBody::from(payload))
            .send()
            .await
            .map_err(|err| Self::transport_failure(&err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| Self::transport_failure(&err))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        Self::parse_success(&body, payload.reference())
    }

    fn transport_failure(err: &reqwest::Error) -> FailureReason {
        if err.is_decode() {
            FailureReason::MalformedResponse
        } else {
            FailureReason::Network
        }
    }

    /// A declared error category wins over the status code.
    pub fn classify_error(status: StatusCode, body: &[u8]) -> FailureReason {
        let declared = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.category.failure_reason());

        declared.unwrap_or_else(|| {
            if status == StatusCode::TOO_MANY_REQUESTS {
                FailureReason::RateLimited
            } else if status.is_server_error() {
                FailureReason::Network
            } else {
                FailureReason::ServerRejected
            }
        })
    }

    pub fn parse_success(
        body: &[u8],
        image: &ImageReference,
    ) -> Result<IdentificationResult, FailureReason> {
        let parsed: IdentificationBody =
            serde_json::from_slice(body).map_err(|_| FailureReason::MalformedResponse)?;

        parsed
            .into_result(image.clone())
            .map_err(|_| FailureReason::MalformedResponse)
    }
}

#[async_trait]
impl RecognitionClient for RecognitionClientHttp {
    async fn send(
        &self,
        request: &IdentificationRequest,
        cancel: &CancellationToken,
    ) -> Result<IdentificationResult, FailureReason> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FailureReason::Cancelled),
            result = self.execute(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use business::domain::identification::request::AttemptMeta;
    use business::domain::identification::value_objects::{ImagePayload, RequestId};

    const FULL_BODY: &str = r#"{
        "name": "Amethyst",
        "category": "Quartz variety",
        "confidence": 0.8731,
        "physicalProperties": {
            "color": "Purple",
            "hardness": "7",
            "luster": "Vitreous",
            "crystalSystem": "Trigonal"
        },
        "chemicalProperties": {
            "formula": "SiO2",
            "elements": ["Si", "O"]
        },
        "formation": {
            "environment": "Geodes in volcanic rock",
            "localities": ["Brazil", "Uruguay"]
        },
        "uses": {
            "decorative": ["Jewelry"],
            "historical": ["Amulets"]
        }
    }"#;

    fn image() -> ImageReference {
        ImageReference::from_bytes(b"jpeg")
    }

    fn request(attempt: u32) -> IdentificationRequest {
        IdentificationRequest::new(
            Arc::new(ImagePayload::new(vec![1, 2, 3], "image/jpeg", 10, 10)),
            AttemptMeta {
                correlation_id: RequestId::new(),
                attempt,
                max_attempts: 3,
                timeout: Duration::from_secs(2),
            },
        )
    }

    #[test]
    fn should_parse_every_field_of_success_body() {
        let result = RecognitionClientHttp::parse_success(FULL_BODY.as_bytes(), &image()).unwrap();

        assert_eq!(result.name, "Amethyst");
        assert_eq!(result.category, "Quartz variety");
        assert_eq!(result.confidence.value(), 0.8731);
        assert_eq!(result.image, image());

        let physical = result.physical.unwrap();
        assert_eq!(physical.color.as_deref(), Some("Purple"));
        assert_eq!(physical.hardness.as_deref(), Some("7"));
        assert_eq!(physical.crystal_system.as_deref(), Some("Trigonal"));
        assert_eq!(physical.streak, None);

        let chemical = result.chemical.unwrap();
        assert_eq!(chemical.formula.as_deref(), Some("SiO2"));
        assert_eq!(chemical.elements, vec!["Si".to_string(), "O".to_string()]);
        assert_eq!(chemical.composition, None);

        let formation = result.formation.unwrap();
        assert_eq!(formation.localities.len(), 2);
        assert_eq!(formation.process, None);

        let uses = result.uses.unwrap();
        assert!(uses.industrial.is_empty());
        assert_eq!(uses.decorative, vec!["Jewelry".to_string()]);
    }

    #[test]
    fn should_leave_missing_groups_absent() {
        let body = r#"{"name":"Quartz","category":"Silicate","confidence":0.5}"#;

        let result = RecognitionClientHttp::parse_success(body.as_bytes(), &image()).unwrap();

        assert!(result.physical.is_none());
        assert!(result.chemical.is_none());
        assert!(result.formation.is_none());
        assert!(result.uses.is_none());
    }

    #[test]
    fn should_reject_body_missing_required_field() {
        let body = r#"{"name":"Quartz","category":"Silicate"}"#;

        assert_eq!(
            RecognitionClientHttp::parse_success(body.as_bytes(), &image()).unwrap_err(),
            FailureReason::MalformedResponse
        );
    }

    #[test]
    fn should_reject_confidence_out_of_range() {
        let body = r#"{"name":"Quartz","category":"Silicate","confidence":1.7}"#;

        assert_eq!(
            RecognitionClientHttp::parse_success(body.as_bytes(), &image()).unwrap_err(),
            FailureReason::MalformedResponse
        );
    }

    #[test]
    fn should_reject_non_json_body() {
        assert_eq!(
            RecognitionClientHttp::parse_success(b"<html>oops</html>", &image()).unwrap_err(),
            FailureReason::MalformedResponse
        );
    }

    #[test]
    fn should_classify_declared_error_categories() {
        let cases = [
            ("rate_limited", FailureReason::RateLimited),
            ("rejected", FailureReason::ServerRejected),
            ("invalid_request", FailureReason::ServerRejected),
            ("unsupported_image", FailureReason::ServerRejected),
            ("unavailable", FailureReason::Network),
            ("malformed", FailureReason::MalformedResponse),
        ];

        for (category, expected) in cases {
            let body = format!(r#"{{"error":{{"category":"{category}","message":"nope"}}}}"#);
            assert_eq!(
                RecognitionClientHttp::classify_error(StatusCode::BAD_REQUEST, body.as_bytes()),
                expected,
                "category {category}"
            );
        }
    }

    #[test]
    fn should_fall_back_to_status_without_envelope() {
        assert_eq!(
            RecognitionClientHttp::classify_error(StatusCode::TOO_MANY_REQUESTS, b""),
            FailureReason::RateLimited
        );
        assert_eq!(
            RecognitionClientHttp::classify_error(StatusCode::SERVICE_UNAVAILABLE, b"busy"),
            FailureReason::Network
        );
        assert_eq!(
            RecognitionClientHttp::classify_error(StatusCode::UNPROCESSABLE_ENTITY, b"{}"),
            FailureReason::ServerRejected
        );
    }

    #[test]
    fn should_fall_back_to_status_for_unknown_category() {
        let body = r#"{"error":{"category":"solar_flare"}}"#;

        assert_eq!(
            RecognitionClientHttp::classify_error(StatusCode::BAD_GATEWAY, body.as_bytes()),
            FailureReason::Network
        );
    }

    #[tokio::test]
    async fn should_report_network_failure_when_service_unreachable() {
        let client = RecognitionClientHttp::new(
            RecognitionHttpClient::new("http://127.0.0.1:1", "key").unwrap(),
        );

        let result = client.send(&request(1), &CancellationToken::new()).await;

        assert_eq!(result.unwrap_err(), FailureReason::Network);
    }

    #[tokio::test]
    async fn should_return_cancelled_when_token_already_cancelled() {
        let client = RecognitionClientHttp::new(
            RecognitionHttpClient::new("http://127.0.0.1:1", "key").unwrap(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.send(&request(1), &cancel).await;

        assert_eq!(result.unwrap_err(), FailureReason::Cancelled);
    }
}
