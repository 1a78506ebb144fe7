use serde::{Deserialize, Serialize};

use business::domain::identification::errors::{FailureReason, IdentificationError};
use business::domain::identification::model::{
    ChemicalProperties, Formation, IdentificationResult, NewIdentificationProps,
    PhysicalProperties, Uses,
};
use business::domain::identification::value_objects::{ImagePayload, ImageReference};

/// Body of `POST /identify`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequestBody<'a> {
    pub image: String,
    pub mime_type: &'a str,
    pub width: u32,
    pub height: u32,
}

impl<'a> From<&'a ImagePayload> for IdentifyRequestBody<'a> {
    fn from(payload: &'a ImagePayload) -> Self {
        Self {
            image: payload.to_base64(),
            mime_type: payload.mime_type(),
            width: payload.width(),
            height: payload.height(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationBody {
    pub name: String,
    pub category: String,
    pub confidence: f64,
    pub physical_properties: Option<PhysicalPropertiesBody>,
    pub chemical_properties: Option<ChemicalPropertiesBody>,
    pub formation: Option<FormationBody>,
    pub uses: Option<UsesBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalPropertiesBody {
    pub color: Option<String>,
    pub hardness: Option<String>,
    pub luster: Option<String>,
    pub streak: Option<String>,
    pub crystal_system: Option<String>,
    pub density: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalPropertiesBody {
    pub formula: Option<String>,
    pub composition: Option<String>,
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormationBody {
    pub environment: Option<String>,
    pub process: Option<String>,
    pub geological_age: Option<String>,
    #[serde(default)]
    pub localities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsesBody {
    #[serde(default)]
    pub industrial: Vec<String>,
    #[serde(default)]
    pub decorative: Vec<String>,
    #[serde(default)]
    pub historical: Vec<String>,
}

impl From<PhysicalPropertiesBody> for PhysicalProperties {
    fn from(body: PhysicalPropertiesBody) -> Self {
        Self {
            color: body.color,
            hardness: body.hardness,
            luster: body.luster,
            streak: body.streak,
            crystal_system: body.crystal_system,
            density: body.density,
        }
    }
}

impl From<ChemicalPropertiesBody> for ChemicalProperties {
    fn from(body: ChemicalPropertiesBody) -> Self {
        Self {
            formula: body.formula,
            composition: body.composition,
            elements: body.elements,
        }
    }
}

impl From<FormationBody> for Formation {
    fn from(body: FormationBody) -> Self {
        Self {
            environment: body.environment,
            process: body.process,
            geological_age: body.geological_age,
            localities: body.localities,
        }
    }
}

impl From<UsesBody> for Uses {
    fn from(body: UsesBody) -> Self {
        Self {
            industrial: body.industrial,
            decorative: body.decorative,
            historical: body.historical,
        }
    }
}

impl IdentificationBody {
    pub fn into_result(
        self,
        image: ImageReference,
    ) -> Result<IdentificationResult, IdentificationError> {
        IdentificationResult::new(NewIdentificationProps {
            image,
            name: self.name,
            category: self.category,
            confidence: self.confidence,
            physical: self.physical_properties.map(Into::into),
            chemical: self.chemical_properties.map(Into::into),
            formation: self.formation.map(Into::into),
            uses: self.uses.map(Into::into),
        })
    }
}

/// `{ "error": { "category": "...", "message": "..." } }`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub category: ErrorCategory,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimited,
    Rejected,
    InvalidRequest,
    UnsupportedImage,
    Unavailable,
    Malformed,
    #[serde(other)]
    Unknown,
}

impl ErrorCategory {
    /// `None` when the service did not declare a category we understand.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            ErrorCategory::RateLimited => Some(FailureReason::RateLimited),
            ErrorCategory::Rejected
            | ErrorCategory::InvalidRequest
            | ErrorCategory::UnsupportedImage => Some(FailureReason::ServerRejected),
            ErrorCategory::Unavailable => Some(FailureReason::Network),
            ErrorCategory::Malformed => Some(FailureReason::MalformedResponse),
            ErrorCategory::Unknown => None,
        }
    }
}
