//! Store query construction
//!
//! Translates [`SearchFilters`] into an [`AideQuery`]: a store-agnostic
//! descriptor of per-field conditions. Which fields are set-valued, which is
//! free text and which are literals is fixed here, not discovered from the
//! shape of the input.

use bson::{doc, Bson, Document};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::filters::{FilterSet, SearchFilters};
use crate::model::{Aide, PerimeterType, PublicationStatus, WireValue};

/// Aide fields a query can constrain or sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AideField {
    Stage,
    PublicationStatus,
    Type,
    PerimeterApplicationType,
    PerimeterApplicationCode,
    Beneficiaries,
    Themes,
    Destination,
    DiffusionForm,
    Keywords,
    Name,
    CreatedAt,
    UpdatedAt,
}

impl AideField {
    /// Field name in stored documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::PublicationStatus => "publicationStatus",
            Self::Type => "type",
            Self::PerimeterApplicationType => "perimeterApplicationType",
            Self::PerimeterApplicationCode => "perimeterApplicationCode",
            Self::Beneficiaries => "beneficiaries",
            Self::Themes => "themes",
            Self::Destination => "destination",
            Self::DiffusionForm => "diffusionForm",
            Self::Keywords => "keywords",
            Self::Name => "name",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    /// String values the aide holds for this field (empty when unset)
    fn values_of<'a>(&self, aide: &'a Aide) -> Vec<&'a str> {
        fn strings(values: &[String]) -> Vec<&str> {
            values.iter().map(String::as_str).collect()
        }

        match self {
            Self::Stage => aide.stage.iter().map(|s| s.as_str()).collect(),
            Self::PublicationStatus => vec![aide.publication_status.as_str()],
            Self::Type => aide.aide_type.iter().map(|t| t.as_str()).collect(),
            Self::PerimeterApplicationType => vec![aide.perimeter_application_type.as_str()],
            Self::PerimeterApplicationCode => vec![aide.perimeter_application_code.as_str()],
            Self::Beneficiaries => strings(&aide.beneficiaries),
            Self::Themes => strings(&aide.themes),
            Self::Destination => strings(&aide.destination),
            Self::DiffusionForm => strings(&aide.diffusion_form),
            Self::Keywords => vec![aide.keywords.as_str()],
            Self::Name => vec![aide.name.as_str()],
            Self::CreatedAt | Self::UpdatedAt => Vec::new(),
        }
    }
}

/// A constraint on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals this literal
    Equals(String),
    /// Field value is a member of this set
    In(Vec<String>),
    /// Field contains this text, ignoring case
    ContainsIgnoreCase(String),
}

impl Condition {
    fn from_set<T, F>(set: &FilterSet<T>, to_wire: F) -> Self
    where
        T: PartialEq,
        F: Fn(&T) -> String,
    {
        Self::In(set.iter().map(to_wire).collect())
    }

    /// Render as a MongoDB filter value
    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Equals(value) => Bson::String(value.clone()),
            Self::In(values) => Bson::Document(doc! { "$in": values.clone() }),
            Self::ContainsIgnoreCase(text) => Bson::Document(doc! {
                "$regex": regex::escape(text),
                "$options": "i",
            }),
        }
    }

    /// Evaluate against the values an aide holds for the field
    fn matches(&self, values: &[&str]) -> bool {
        match self {
            Self::Equals(expected) => values.iter().any(|v| v == expected),
            Self::In(set) => values.iter().any(|v| set.iter().any(|s| s == v)),
            Self::ContainsIgnoreCase(text) => regex::RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .build()
                .map(|re| values.iter().any(|v| re.is_match(v)))
                .unwrap_or(false),
        }
    }
}

/// Which publication states a query may return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Only published aides, whatever the caller asked for
    #[default]
    PublishedOnly,
    /// Honour the caller's publication status filter, if any
    IncludeUnpublished,
}

/// Store query descriptor: at most one condition per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AideQuery {
    conditions: BTreeMap<AideField, Condition>,
}

impl AideQuery {
    /// Query matching every aide
    pub fn all() -> Self {
        Self::default()
    }

    /// Build the query for a set of filters under a visibility policy
    ///
    /// Set filters become membership conditions, keywords a case-insensitive
    /// substring match. The visibility policy is applied last so a caller's
    /// publication status filter can never widen `PublishedOnly`.
    pub fn build(filters: &SearchFilters, visibility: Visibility) -> Self {
        let mut query = Self::default();

        if let Some(ref set) = filters.stage {
            query.set(AideField::Stage, Condition::from_set(set, |v| v.as_str().to_string()));
        }
        if let Some(ref set) = filters.publication_status {
            query.set(
                AideField::PublicationStatus,
                Condition::from_set(set, |v| v.as_str().to_string()),
            );
        }
        if let Some(ref set) = filters.aide_type {
            query.set(AideField::Type, Condition::from_set(set, |v| v.as_str().to_string()));
        }
        if let Some(ref set) = filters.perimeter_application_type {
            query.set(
                AideField::PerimeterApplicationType,
                Condition::from_set(set, |v| v.as_str().to_string()),
            );
        }

        let string_sets = [
            (AideField::Beneficiaries, &filters.beneficiaries),
            (AideField::Themes, &filters.themes),
            (AideField::Destination, &filters.destination),
            (AideField::DiffusionForm, &filters.diffusion_form),
        ];
        for (field, set) in string_sets {
            if let Some(set) = set {
                query.set(field, Condition::from_set(set, Clone::clone));
            }
        }

        if let Some(ref keywords) = filters.keywords {
            query.set(AideField::Keywords, Condition::ContainsIgnoreCase(keywords.clone()));
        }

        if visibility == Visibility::PublishedOnly {
            query.set(
                AideField::PublicationStatus,
                Condition::Equals(PublicationStatus::Published.as_str().to_string()),
            );
        }

        query
    }

    /// Pin the query to one perimeter type and code
    ///
    /// An empty code selects aides applying to every territory of the type.
    pub fn scoped_to(mut self, perimeter_type: PerimeterType, code: &str) -> Self {
        self.set(
            AideField::PerimeterApplicationType,
            Condition::Equals(perimeter_type.as_str().to_string()),
        );
        self.set(AideField::PerimeterApplicationCode, Condition::Equals(code.to_string()));
        self
    }

    pub fn set(&mut self, field: AideField, condition: Condition) {
        self.conditions.insert(field, condition);
    }

    pub fn condition(&self, field: AideField) -> Option<&Condition> {
        self.conditions.get(&field)
    }

    pub fn conditions(&self) -> impl Iterator<Item = (AideField, &Condition)> {
        self.conditions.iter().map(|(field, condition)| (*field, condition))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as a MongoDB filter document
    pub fn to_document(&self) -> Document {
        self.conditions
            .iter()
            .map(|(field, condition)| (field.as_str().to_string(), condition.to_bson()))
            .collect()
    }

    /// Evaluate the query in process
    pub fn matches(&self, aide: &Aide) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(&field.values_of(aide)))
    }
}

/// Result ordering requested from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: AideField,
    pub descending: bool,
}

impl SortOrder {
    /// Most recently updated first
    pub fn recently_updated() -> Self {
        Self {
            field: AideField::UpdatedAt,
            descending: true,
        }
    }

    pub fn to_document(&self) -> Document {
        let direction: i32 = if self.descending { -1 } else { 1 };
        let mut document = Document::new();
        document.insert(self.field.as_str(), direction);
        document
    }

    /// Compare two aides; unset values sort first in ascending order
    pub fn compare(&self, a: &Aide, b: &Aide) -> Ordering {
        let ordering = match self.field {
            AideField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            AideField::CreatedAt => a.created_at.cmp(&b.created_at),
            field => field.values_of(a).cmp(&field.values_of(b)),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
