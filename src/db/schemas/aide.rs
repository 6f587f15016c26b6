//! Aide document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::model::{Aide, AideType, PerimeterType, PublicationStatus, Stage};

/// Default collection name for aides
pub const AIDE_COLLECTION: &str = "aides";

/// Aide document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AideDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    pub perimeter_application_type: PerimeterType,

    #[serde(default)]
    pub perimeter_application_name: String,

    /// Empty for aides covering every territory of the type
    #[serde(default)]
    pub perimeter_application_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    #[serde(default)]
    pub sponsor_structure: String,

    #[serde(default)]
    pub publication_status: PublicationStatus,

    #[serde(default)]
    pub link: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub aide_type: Option<AideType>,

    #[serde(default)]
    pub beneficiaries: Vec<String>,

    #[serde(default)]
    pub diffusion_form: Vec<String>,

    #[serde(default)]
    pub destination: Vec<String>,

    #[serde(default)]
    pub themes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub particular_category: Option<String>,

    #[serde(default)]
    pub keywords: String,
}

impl IntoIndexes for AideDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Every territory-scoped query filters on both
            (
                doc! { "perimeterApplicationType": 1, "perimeterApplicationCode": 1 },
                Some(
                    IndexOptions::builder()
                        .name("perimeter_scope_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "publicationStatus": 1 },
                Some(
                    IndexOptions::builder()
                        .name("publication_status_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "updatedAt": -1 },
                Some(
                    IndexOptions::builder()
                        .name("updated_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl From<AideDoc> for Aide {
    fn from(doc: AideDoc) -> Self {
        Aide {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name,
            description: doc.description,
            created_at: doc.created_at.map(|d| d.to_chrono()),
            updated_at: doc.updated_at.map(|d| d.to_chrono()),
            perimeter_application_type: doc.perimeter_application_type,
            perimeter_application_name: doc.perimeter_application_name,
            perimeter_application_code: doc.perimeter_application_code,
            stage: doc.stage,
            sponsor_structure: doc.sponsor_structure,
            publication_status: doc.publication_status,
            link: doc.link,
            aide_type: doc.aide_type,
            beneficiaries: doc.beneficiaries,
            diffusion_form: doc.diffusion_form,
            destination: doc.destination,
            themes: doc.themes,
            deadline: doc.deadline.map(|d| d.to_chrono()),
            particular_category: doc.particular_category,
            keywords: doc.keywords,
        }
    }
}
