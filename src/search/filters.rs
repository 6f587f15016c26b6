//! Filter normalization
//!
//! Callers send a loose JSON object of filters (form output: `null`s, empty
//! arrays, a geocoding payload nobody server-side uses). Normalization is a
//! total, side-effect free transform into [`SearchFilters`]: anything that
//! cannot be understood is dropped key by key, never failing the search.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{AideType, PerimeterType, PublicationStatus, Stage, WireValue};

/// Raw filter object as received from a caller
pub type RawFilters = Map<String, Value>;

/// Geocoding payload attached by the search form, always stripped
pub const GEOCODING_PAYLOAD_KEY: &str = "perimeterAdditionalData";

/// A filter key that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("filter `{key}` expects an array of values")]
    ExpectedArray { key: String },

    #[error("filter `{key}` expects a string")]
    ExpectedString { key: String },

    #[error("filter `{key}` has unknown value `{value}`")]
    UnknownValue { key: String, value: String },

    #[error("unknown filter `{key}`")]
    UnknownKey { key: String },
}

/// Non-empty, duplicate-free set of filter values, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet<T>(Vec<T>);

impl<T: PartialEq> FilterSet<T> {
    /// Build a set, `None` when no values remain
    pub fn new(values: impl IntoIterator<Item = T>) -> Option<Self> {
        let mut unique: Vec<T> = Vec::new();
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            None
        } else {
            Some(Self(unique))
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The location a caller searches around
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPerimeter {
    pub perimeter_type: PerimeterType,
    pub code: String,
}

/// Canonical search filters
///
/// Every field is absent, a scalar, or a non-empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub stage: Option<FilterSet<Stage>>,
    pub publication_status: Option<FilterSet<PublicationStatus>>,
    pub aide_type: Option<FilterSet<AideType>>,
    pub perimeter_application_type: Option<FilterSet<PerimeterType>>,
    pub beneficiaries: Option<FilterSet<String>>,
    pub themes: Option<FilterSet<String>>,
    pub destination: Option<FilterSet<String>>,
    pub diffusion_form: Option<FilterSet<String>>,
    pub keywords: Option<String>,
    pub initial_perimeter: Option<InitialPerimeter>,
}

/// Filter keys understood by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKey {
    Stage,
    PublicationStatus,
    AideType,
    PerimeterApplicationType,
    Beneficiaries,
    Themes,
    Destination,
    DiffusionForm,
    Keywords,
    InitialPerimeterType,
    InitialPerimeterCode,
}

impl FilterKey {
    /// Resolve a key, accepting the field names of the legacy search form
    fn parse(key: &str) -> Option<Self> {
        let parsed = match key {
            "stage" | "etape" => Self::Stage,
            "publicationStatus" | "statusPublication" => Self::PublicationStatus,
            "type" => Self::AideType,
            "perimeterApplicationType" | "perimetreApplicationType" => {
                Self::PerimeterApplicationType
            }
            "beneficiaries" | "beneficiaires" => Self::Beneficiaries,
            "themes" | "thematiques" => Self::Themes,
            "destination" => Self::Destination,
            "diffusionForm" | "formeDeDiffusion" => Self::DiffusionForm,
            "keywords" | "motsCles" => Self::Keywords,
            "initialPerimeterType" | "typePerimetreInitialDeRecherche" => {
                Self::InitialPerimeterType
            }
            "initialPerimeterCode" | "codePerimetreInitialDeRecherche" => {
                Self::InitialPerimeterCode
            }
            _ => return None,
        };
        Some(parsed)
    }
}

/// Drop keys holding `null` or an empty array, and the geocoding payload
///
/// Every other key passes through untouched.
pub fn clean_raw_filters(mut raw: RawFilters) -> RawFilters {
    raw.remove(GEOCODING_PAYLOAD_KEY);
    raw.retain(|_, value| match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    });
    raw
}

impl SearchFilters {
    /// Normalize raw caller input, logging and dropping anything unusable
    pub fn normalize(raw: RawFilters) -> Self {
        let (filters, rejected) = Self::normalize_reporting(raw);
        for err in &rejected {
            warn!(error = %err, "Ignoring search filter");
        }
        filters
    }

    /// Normalize raw caller input, returning the rejected keys alongside
    pub fn normalize_reporting(raw: RawFilters) -> (Self, Vec<ValidationError>) {
        let mut filters = Self::default();
        let mut rejected = Vec::new();
        let mut initial_type: Option<PerimeterType> = None;
        let mut initial_code: Option<String> = None;

        for (key, value) in clean_raw_filters(raw) {
            let Some(filter_key) = FilterKey::parse(&key) else {
                debug!(key = %key, "Unknown search filter key");
                rejected.push(ValidationError::UnknownKey { key });
                continue;
            };

            let outcome = match filter_key {
                FilterKey::Stage => enum_set(&key, &value).map(|s| filters.stage = s),
                FilterKey::PublicationStatus => {
                    enum_set(&key, &value).map(|s| filters.publication_status = s)
                }
                FilterKey::AideType => enum_set(&key, &value).map(|s| filters.aide_type = s),
                FilterKey::PerimeterApplicationType => {
                    enum_set(&key, &value).map(|s| filters.perimeter_application_type = s)
                }
                FilterKey::Beneficiaries => {
                    string_set(&key, &value).map(|s| filters.beneficiaries = s)
                }
                FilterKey::Themes => string_set(&key, &value).map(|s| filters.themes = s),
                FilterKey::Destination => {
                    string_set(&key, &value).map(|s| filters.destination = s)
                }
                FilterKey::DiffusionForm => {
                    string_set(&key, &value).map(|s| filters.diffusion_form = s)
                }
                FilterKey::Keywords => {
                    scalar_string(&key, &value).map(|s| filters.keywords = s)
                }
                FilterKey::InitialPerimeterType => {
                    scalar_string(&key, &value).and_then(|s| match s {
                        Some(raw_type) => PerimeterType::parse_wire(&raw_type)
                            .map(|t| initial_type = Some(t))
                            .ok_or(ValidationError::UnknownValue {
                                key: key.clone(),
                                value: raw_type,
                            }),
                        None => Ok(()),
                    })
                }
                FilterKey::InitialPerimeterCode => {
                    scalar_code(&key, &value).map(|s| initial_code = s)
                }
            };

            if let Err(err) = outcome {
                rejected.push(err);
            }
        }

        if let (Some(perimeter_type), Some(code)) = (initial_type, initial_code) {
            filters.initial_perimeter = Some(InitialPerimeter {
                perimeter_type,
                code,
            });
        }

        (filters, rejected)
    }

    /// Same filters with the free-text constraint removed
    pub fn without_keywords(&self) -> Self {
        Self {
            keywords: None,
            ..self.clone()
        }
    }

    /// Whether the caller's perimeter type restriction admits `perimeter_type`
    pub fn allows_perimeter_type(&self, perimeter_type: PerimeterType) -> bool {
        self.perimeter_application_type
            .as_ref()
            .map_or(true, |set| set.contains(&perimeter_type))
    }
}

fn enum_set<T: WireValue + PartialEq>(
    key: &str,
    value: &Value,
) -> Result<Option<FilterSet<T>>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::ExpectedArray {
        key: key.to_string(),
    })?;

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let raw = item.as_str().ok_or_else(|| ValidationError::ExpectedString {
            key: key.to_string(),
        })?;
        let wire = T::parse_wire(raw).ok_or_else(|| ValidationError::UnknownValue {
            key: key.to_string(),
            value: raw.to_string(),
        })?;
        parsed.push(wire);
    }
    Ok(FilterSet::new(parsed))
}

fn string_set(key: &str, value: &Value) -> Result<Option<FilterSet<String>>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::ExpectedArray {
        key: key.to_string(),
    })?;

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let raw = item.as_str().ok_or_else(|| ValidationError::ExpectedString {
            key: key.to_string(),
        })?;
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            parsed.push(trimmed.to_string());
        }
    }
    Ok(FilterSet::new(parsed))
}

fn scalar_string(key: &str, value: &Value) -> Result<Option<String>, ValidationError> {
    let raw = value.as_str().ok_or_else(|| ValidationError::ExpectedString {
        key: key.to_string(),
    })?;
    let trimmed = raw.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Territory codes may arrive as JSON numbers from some forms
fn scalar_code(key: &str, value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Number(n) if n.is_u64() => Ok(Some(n.to_string())),
        _ => scalar_string(key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn raw(value: Value) -> RawFilters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_clean_removes_null_and_empty_arrays() {
        let cleaned = clean_raw_filters(raw(json!({
            "type": [],
            "stage": null,
            "keywords": "eau",
            "publicationStatus": ["published"],
            "perimeterAdditionalData": {"nom": "Paris"}
        })));

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned["keywords"], json!("eau"));
        assert_eq!(cleaned["publicationStatus"], json!(["published"]));
        assert!(!cleaned.contains_key(GEOCODING_PAYLOAD_KEY));
    }

    #[test]
    fn test_clean_strips_geocoding_payload_even_when_null() {
        let cleaned = clean_raw_filters(raw(json!({ "perimeterAdditionalData": null })));
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_normalize_typed_fields() {
        let filters = SearchFilters::normalize(raw(json!({
            "type": ["financement", "financing"],
            "stage": ["operationnel"],
            "perimeterApplicationType": ["region", "france"],
            "keywords": "  rénovation  ",
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "75056"
        })));

        let types = filters.aide_type.unwrap();
        assert_eq!(types.len(), 1);
        assert!(types.contains(&AideType::Financing));
        assert!(filters.stage.unwrap().contains(&Stage::Operational));
        assert_eq!(filters.keywords.as_deref(), Some("rénovation"));
        assert_eq!(
            filters.initial_perimeter,
            Some(InitialPerimeter {
                perimeter_type: PerimeterType::Commune,
                code: "75056".to_string(),
            })
        );
    }

    #[test]
    fn test_normalize_accepts_legacy_keys() {
        let filters = SearchFilters::normalize(raw(json!({
            "etape": ["pre_operationnel"],
            "motsCles": "vélo",
            "typePerimetreInitialDeRecherche": "departement",
            "codePerimetreInitialDeRecherche": "2A"
        })));

        assert!(filters.stage.unwrap().contains(&Stage::PreOperational));
        assert_eq!(filters.keywords.as_deref(), Some("vélo"));
        assert_eq!(filters.initial_perimeter.unwrap().code, "2A");
    }

    #[test]
    fn test_malformed_keys_are_dropped_not_fatal() {
        let (filters, rejected) = SearchFilters::normalize_reporting(raw(json!({
            "type": "financement",
            "stage": ["someday"],
            "themes": ["eau", 3],
            "keywords": "eau",
            "colour": "blue"
        })));

        assert!(filters.aide_type.is_none());
        assert!(filters.stage.is_none());
        assert!(filters.themes.is_none());
        assert_eq!(filters.keywords.as_deref(), Some("eau"));
        assert_eq!(rejected.len(), 4);
        assert!(rejected.contains(&ValidationError::ExpectedArray {
            key: "type".to_string()
        }));
        assert!(rejected.contains(&ValidationError::UnknownKey {
            key: "colour".to_string()
        }));
    }

    #[test]
    fn test_initial_perimeter_requires_type_and_code() {
        let filters = SearchFilters::normalize(raw(json!({ "initialPerimeterType": "region" })));
        assert!(filters.initial_perimeter.is_none());

        let filters = SearchFilters::normalize(raw(json!({
            "initialPerimeterType": "region",
            "initialPerimeterCode": ""
        })));
        assert!(filters.initial_perimeter.is_none());
    }

    #[test]
    fn test_numeric_code_is_accepted() {
        let filters = SearchFilters::normalize(raw(json!({
            "initialPerimeterType": "region",
            "initialPerimeterCode": 11
        })));
        assert_eq!(filters.initial_perimeter.unwrap().code, "11");
    }

    #[test]
    fn test_allows_perimeter_type() {
        let open = SearchFilters::default();
        assert!(open.allows_perimeter_type(PerimeterType::Europe));

        let restricted = SearchFilters {
            perimeter_application_type: FilterSet::new([PerimeterType::France]),
            ..Default::default()
        };
        assert!(restricted.allows_perimeter_type(PerimeterType::France));
        assert!(!restricted.allows_perimeter_type(PerimeterType::Region));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            Just(json!([])),
            "[a-z]{0,6}".prop_map(Value::String),
            prop::collection::vec("[a-z]{1,4}", 1..3).prop_map(|v| json!(v)),
            any::<u32>().prop_map(|n| json!(n)),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    proptest! {
        #[test]
        fn prop_clean_removes_exactly_empty_keys(
            entries in prop::collection::btree_map("[a-zA-Z]{1,8}", arb_value(), 0..8),
            geocoding in arb_value(),
        ) {
            let mut input: RawFilters = entries.clone().into_iter().collect();
            input.insert(GEOCODING_PAYLOAD_KEY.to_string(), geocoding);

            let cleaned = clean_raw_filters(input);

            prop_assert!(!cleaned.contains_key(GEOCODING_PAYLOAD_KEY));
            for (key, value) in &entries {
                if key == GEOCODING_PAYLOAD_KEY {
                    continue;
                }
                let empty = value.is_null() || value.as_array().is_some_and(|a| a.is_empty());
                if empty {
                    prop_assert!(!cleaned.contains_key(key));
                } else {
                    prop_assert_eq!(cleaned.get(key), Some(value));
                }
            }
        }
    }

    #[test]
    fn test_unique_set_keeps_first_seen_order() {
        let set = FilterSet::new(["b", "a", "b"]).unwrap();
        assert_eq!(set.iter().copied().collect::<BTreeSet<_>>().len(), 2);
        assert_eq!(set.iter().next(), Some(&"b"));
        assert!(FilterSet::<&str>::new([]).is_none());
    }
}
