use chrono::{DateTime, Utc};
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

use business::domain::identification::errors::FailureReason;
use business::domain::identification::model::{
    ChemicalProperties, Formation, IdentificationResult, PhysicalProperties, UserAnnotations, Uses,
};
use business::domain::identification::state::IdentificationState;
use business::domain::identification::value_objects::RequestId;

#[derive(Debug, Clone, Serialize, Deserialize, Enum)]
pub enum IdentificationStatusDto {
    #[oai(rename = "idle")]
    Idle,
    #[oai(rename = "processing")]
    Processing,
    #[oai(rename = "retrying")]
    Retrying,
    #[oai(rename = "success")]
    Success,
    #[oai(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Enum)]
pub enum FailureReasonDto {
    #[oai(rename = "network")]
    Network,
    #[oai(rename = "server_rejected")]
    ServerRejected,
    #[oai(rename = "rate_limited")]
    RateLimited,
    #[oai(rename = "malformed_response")]
    MalformedResponse,
    #[oai(rename = "cancelled")]
    Cancelled,
    #[oai(rename = "invalid_image")]
    InvalidImage,
}

impl From<FailureReason> for FailureReasonDto {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Network => FailureReasonDto::Network,
            FailureReason::ServerRejected => FailureReasonDto::ServerRejected,
            FailureReason::RateLimited => FailureReasonDto::RateLimited,
            FailureReason::MalformedResponse => FailureReasonDto::MalformedResponse,
            FailureReason::Cancelled => FailureReasonDto::Cancelled,
            FailureReason::InvalidImage => FailureReasonDto::InvalidImage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct IdentifyRequest {
    /// Photo encoded as base64. A `data:image/...;base64,` prefix is accepted.
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct PhysicalPropertiesResponse {
    #[oai(skip_serializing_if_is_none)]
    pub color: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub hardness: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub luster: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub streak: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub crystal_system: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub density: Option<String>,
}

impl From<PhysicalProperties> for PhysicalPropertiesResponse {
    fn from(props: PhysicalProperties) -> Self {
        Self {
            color: props.color,
            hardness: props.hardness,
            luster: props.luster,
            streak: props.streak,
            crystal_system: props.crystal_system,
            density: props.density,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct ChemicalPropertiesResponse {
    #[oai(skip_serializing_if_is_none)]
    pub formula: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub composition: Option<String>,
    pub elements: Vec<String>,
}

impl From<ChemicalProperties> for ChemicalPropertiesResponse {
    fn from(props: ChemicalProperties) -> Self {
        Self {
            formula: props.formula,
            composition: props.composition,
            elements: props.elements,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct FormationResponse {
    #[oai(skip_serializing_if_is_none)]
    pub environment: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub process: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub geological_age: Option<String>,
    pub localities: Vec<String>,
}

impl From<Formation> for FormationResponse {
    fn from(formation: Formation) -> Self {
        Self {
            environment: formation.environment,
            process: formation.process,
            geological_age: formation.geological_age,
            localities: formation.localities,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct UsesResponse {
    pub industrial: Vec<String>,
    pub decorative: Vec<String>,
    pub historical: Vec<String>,
}

impl From<Uses> for UsesResponse {
    fn from(uses: Uses) -> Self {
        Self {
            industrial: uses.industrial,
            decorative: uses.decorative,
            historical: uses.historical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct AnnotationsResponse {
    pub favorite: bool,
    #[oai(skip_serializing_if_is_none)]
    pub notes: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub location: Option<String>,
}

impl From<UserAnnotations> for AnnotationsResponse {
    fn from(annotations: UserAnnotations) -> Self {
        Self {
            favorite: annotations.favorite,
            notes: annotations.notes,
            location: annotations.location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct IdentificationResultResponse {
    /// Result unique identifier
    pub id: String,
    /// SHA-256 of the uploaded image
    pub image_reference: String,
    pub name: String,
    pub category: String,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    #[oai(skip_serializing_if_is_none)]
    pub physical_properties: Option<PhysicalPropertiesResponse>,
    #[oai(skip_serializing_if_is_none)]
    pub chemical_properties: Option<ChemicalPropertiesResponse>,
    #[oai(skip_serializing_if_is_none)]
    pub formation: Option<FormationResponse>,
    #[oai(skip_serializing_if_is_none)]
    pub uses: Option<UsesResponse>,
    pub annotations: AnnotationsResponse,
    pub identified_at: DateTime<Utc>,
}

impl From<IdentificationResult> for IdentificationResultResponse {
    fn from(result: IdentificationResult) -> Self {
        Self {
            id: result.id.to_string(),
            image_reference: result.image.as_str().to_string(),
            name: result.name,
            category: result.category,
            confidence: result.confidence.value(),
            physical_properties: result.physical.map(|p| p.into()),
            chemical_properties: result.chemical.map(|c| c.into()),
            formation: result.formation.map(|f| f.into()),
            uses: result.uses.map(|u| u.into()),
            annotations: result.annotations.into(),
            identified_at: result.identified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct FailureResponse {
    pub reason: FailureReasonDto,
    /// Code-style identifier, e.g. "identification.network"
    pub code: String,
    /// Human-readable explanation
    pub message: String,
}

impl From<FailureReason> for FailureResponse {
    fn from(reason: FailureReason) -> Self {
        Self {
            reason: reason.into(),
            code: reason.to_string(),
            message: reason.user_message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct IdentificationStateResponse {
    pub status: IdentificationStatusDto,
    /// Attempt about to run, only while retrying
    #[oai(skip_serializing_if_is_none)]
    pub attempt: Option<u32>,
    #[oai(skip_serializing_if_is_none)]
    pub max_attempts: Option<u32>,
    #[oai(skip_serializing_if_is_none)]
    pub result: Option<IdentificationResultResponse>,
    #[oai(skip_serializing_if_is_none)]
    pub error: Option<FailureResponse>,
}

impl From<IdentificationState> for IdentificationStateResponse {
    fn from(state: IdentificationState) -> Self {
        let empty = |status| Self {
            status,
            attempt: None,
            max_attempts: None,
            result: None,
            error: None,
        };

        match state {
            IdentificationState::Idle => empty(IdentificationStatusDto::Idle),
            IdentificationState::Processing => empty(IdentificationStatusDto::Processing),
            IdentificationState::Retrying {
                attempt,
                max_attempts,
            } => Self {
                attempt: Some(attempt),
                max_attempts: Some(max_attempts),
                ..empty(IdentificationStatusDto::Retrying)
            },
            IdentificationState::Success(result) => Self {
                result: Some((*result).into()),
                ..empty(IdentificationStatusDto::Success)
            },
            IdentificationState::Error(reason) => Self {
                error: Some(reason.into()),
                ..empty(IdentificationStatusDto::Error)
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct IdentificationAcceptedResponse {
    /// Correlation id of the new request
    pub request_id: String,
    pub state: IdentificationStateResponse,
}

impl IdentificationAcceptedResponse {
    pub fn new(request_id: RequestId, state: IdentificationState) -> Self {
        Self {
            request_id: request_id.to_string(),
            state: state.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use business::domain::identification::model::NewIdentificationProps;
    use business::domain::identification::value_objects::ImageReference;

    fn result() -> IdentificationResult {
        IdentificationResult::new(NewIdentificationProps {
            image: ImageReference::from_bytes(b"photo"),
            name: "Pyrite".to_string(),
            category: "Sulfide".to_string(),
            confidence: 0.92,
            physical: Some(PhysicalProperties {
                luster: Some("Metallic".to_string()),
                ..PhysicalProperties::default()
            }),
            chemical: None,
            formation: None,
            uses: None,
        })
        .unwrap()
    }

    #[test]
    fn should_expose_attempt_counters_when_retrying() {
        let response: IdentificationStateResponse = IdentificationState::Retrying {
            attempt: 2,
            max_attempts: 3,
        }
        .into();

        assert!(matches!(response.status, IdentificationStatusDto::Retrying));
        assert_eq!(response.attempt, Some(2));
        assert_eq!(response.max_attempts, Some(3));
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn should_carry_result_when_successful() {
        let expected = result();
        let response: IdentificationStateResponse =
            IdentificationState::Success(Box::new(expected.clone())).into();

        let body = response.result.unwrap();
        assert_eq!(body.name, "Pyrite");
        assert_eq!(body.confidence, 0.92);
        assert_eq!(body.image_reference, expected.image.as_str());
        assert_eq!(
            body.physical_properties.unwrap().luster.as_deref(),
            Some("Metallic")
        );
        assert!(body.chemical_properties.is_none());
    }

    #[test]
    fn should_describe_failure_with_code_and_message() {
        let response: IdentificationStateResponse =
            IdentificationState::Error(FailureReason::RateLimited).into();

        let error = response.error.unwrap();
        assert!(matches!(error.reason, FailureReasonDto::RateLimited));
        assert_eq!(error.code, "identification.rate_limited");
        assert_eq!(error.message, FailureReason::RateLimited.user_message());
    }
}
