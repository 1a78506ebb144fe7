use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::IdentificationError;
use super::value_objects::{Confidence, ImageReference};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicalProperties {
    pub color: Option<String>,
    pub hardness: Option<String>,
    pub luster: Option<String>,
    pub streak: Option<String>,
    pub crystal_system: Option<String>,
    pub density: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChemicalProperties {
    pub formula: Option<String>,
    pub composition: Option<String>,
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formation {
    pub environment: Option<String>,
    pub process: Option<String>,
    pub geological_age: Option<String>,
    pub localities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uses {
    pub industrial: Vec<String>,
    pub decorative: Vec<String>,
    pub historical: Vec<String>,
}

/// Notes the user attaches after identification. Owned by the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserAnnotations {
    pub favorite: bool,
    pub notes: Option<String>,
    pub location: Option<String>,
}

/// Successful outcome of an identification request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationResult {
    pub id: Uuid,
    pub image: ImageReference,
    pub name: String,
    pub category: String,
    pub confidence: Confidence,
    pub physical: Option<PhysicalProperties>,
    pub chemical: Option<ChemicalProperties>,
    pub formation: Option<Formation>,
    pub uses: Option<Uses>,
    pub annotations: UserAnnotations,
    pub identified_at: DateTime<Utc>,
}

pub struct NewIdentificationProps {
    pub image: ImageReference,
    pub name: String,
    pub category: String,
    pub confidence: f64,
    pub physical: Option<PhysicalProperties>,
    pub chemical: Option<ChemicalProperties>,
    pub formation: Option<Formation>,
    pub uses: Option<Uses>,
}

impl IdentificationResult {
    pub fn new(props: NewIdentificationProps) -> Result<Self, IdentificationError> {
        if props.name.trim().is_empty() {
            return Err(IdentificationError::NameEmpty);
        }

        let confidence = Confidence::new(props.confidence)?;

        Ok(Self {
            id: Uuid::new_v4(),
            image: props.image,
            name: props.name,
            category: props.category,
            confidence,
            physical: props.physical,
            chemical: props.chemical,
            formation: props.formation,
            uses: props.uses,
            annotations: UserAnnotations::default(),
            identified_at: Utc::now(),
        })
    }

    pub fn set_favorite(&mut self, favorite: bool) {
        self.annotations.favorite = favorite;
    }

    /// Blank text clears the notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.annotations.notes = non_blank(notes.into());
    }

    /// Blank text clears the location.
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.annotations.location = non_blank(location.into());
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(name: &str, confidence: f64) -> NewIdentificationProps {
        NewIdentificationProps {
            image: ImageReference::from_bytes(b"photo"),
            name: name.to_string(),
            category: "Mineral".to_string(),
            confidence,
            physical: None,
            chemical: None,
            formation: None,
            uses: None,
        }
    }

    #[test]
    fn should_create_result_when_props_valid() {
        let result = IdentificationResult::new(props("Quartz", 0.92)).unwrap();

        assert_eq!(result.name, "Quartz");
        assert_eq!(result.confidence.value(), 0.92);
        assert_eq!(result.annotations, UserAnnotations::default());
    }

    #[test]
    fn should_assign_unique_id_per_result() {
        let first = IdentificationResult::new(props("Quartz", 0.9)).unwrap();
        let second = IdentificationResult::new(props("Quartz", 0.9)).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn should_reject_result_when_name_is_blank() {
        assert!(matches!(
            IdentificationResult::new(props("  ", 0.5)),
            Err(IdentificationError::NameEmpty)
        ));
    }

    #[test]
    fn should_reject_result_when_confidence_above_one() {
        assert!(matches!(
            IdentificationResult::new(props("Quartz", 1.5)),
            Err(IdentificationError::ConfidenceOutOfRange)
        ));
    }

    #[test]
    fn should_update_annotations_and_clear_on_blank_text() {
        let mut result = IdentificationResult::new(props("Obsidian", 0.7)).unwrap();

        result.set_favorite(true);
        result.set_notes("Found near the creek");
        result.set_location("Lassen County");
        assert!(result.annotations.favorite);
        assert_eq!(result.annotations.notes.as_deref(), Some("Found near the creek"));

        result.set_location("   ");
        assert_eq!(result.annotations.location, None);
    }
}
