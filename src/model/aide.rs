//! Aide (grant) record as served to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AideType, PerimeterType, PublicationStatus, Stage};

/// A grant or subsidy record
///
/// `perimeter_application_code` is only meaningful together with
/// `perimeter_application_type`: an empty code means the aide applies to
/// every territory of that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aide {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    pub perimeter_application_type: PerimeterType,

    #[serde(default)]
    pub perimeter_application_name: String,

    #[serde(default)]
    pub perimeter_application_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    #[serde(default)]
    pub sponsor_structure: String,

    #[serde(default)]
    pub publication_status: PublicationStatus,

    #[serde(default)]
    pub link: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub aide_type: Option<AideType>,

    #[serde(default)]
    pub beneficiaries: Vec<String>,

    #[serde(default)]
    pub diffusion_form: Vec<String>,

    #[serde(default)]
    pub destination: Vec<String>,

    #[serde(default)]
    pub themes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particular_category: Option<String>,

    /// Free text matched by keyword searches
    #[serde(default)]
    pub keywords: String,
}

impl Aide {
    /// Create a published aide scoped to a perimeter, every other field empty
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        perimeter_type: PerimeterType,
        perimeter_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            created_at: None,
            updated_at: None,
            perimeter_application_type: perimeter_type,
            perimeter_application_name: String::new(),
            perimeter_application_code: perimeter_code.into(),
            stage: None,
            sponsor_structure: String::new(),
            publication_status: PublicationStatus::Published,
            link: String::new(),
            aide_type: None,
            beneficiaries: Vec::new(),
            diffusion_form: Vec::new(),
            destination: Vec::new(),
            themes: Vec::new(),
            deadline: None,
            particular_category: None,
            keywords: String::new(),
        }
    }

    pub fn with_type(mut self, aide_type: AideType) -> Self {
        self.aide_type = Some(aide_type);
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_status(mut self, status: PublicationStatus) -> Self {
        self.publication_status = status;
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_themes<I, T>(mut self, themes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.themes = themes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Whether the aide applies to every territory of its perimeter type
    pub fn is_universal(&self) -> bool {
        self.perimeter_application_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_with_type_key() {
        let aide = Aide::new("a1", "Fonds vert", PerimeterType::France, "")
            .with_type(AideType::Financing);
        let json = serde_json::to_value(&aide).unwrap();

        assert_eq!(json["perimeterApplicationType"], "france");
        assert_eq!(json["perimeterApplicationCode"], "");
        assert_eq!(json["publicationStatus"], "published");
        assert_eq!(json["type"], "financement");
        assert!(json.get("stage").is_none());
        assert!(aide.is_universal());
    }

    #[test]
    fn test_deserializes_sparse_record() {
        let aide: Aide = serde_json::from_value(serde_json::json!({
            "id": "a2",
            "name": "Aide Paris",
            "perimeterApplicationType": "commune",
            "perimeterApplicationCode": "75056"
        }))
        .unwrap();

        assert_eq!(aide.publication_status, PublicationStatus::Draft);
        assert!(!aide.is_universal());
        assert!(aide.themes.is_empty());
    }
}
