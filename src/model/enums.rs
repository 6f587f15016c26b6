//! Enumerated aide attributes
//!
//! Wire values follow what the record store holds. The English spellings are
//! accepted as input aliases so older clients keep working.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumeration with a fixed string form on the wire and in the store
pub trait WireValue: Sized + Copy + 'static {
    /// Every variant, in declaration order
    const ALL: &'static [Self];

    /// Canonical wire value
    fn as_str(&self) -> &'static str;

    /// Alternative spellings accepted on input
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Parse a canonical value or one of its aliases
    fn parse_wire(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == value || v.aliases().contains(&value))
    }
}

/// Territorial scope an aide applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerimeterType {
    Commune,
    Departement,
    Region,
    Metropole,
    OutreMer,
    France,
    Europe,
}

/// Order in which the universal sweep visits perimeter types
pub const UNIVERSAL_SWEEP: [PerimeterType; 7] = [
    PerimeterType::Commune,
    PerimeterType::Departement,
    PerimeterType::Region,
    PerimeterType::OutreMer,
    PerimeterType::Metropole,
    PerimeterType::France,
    PerimeterType::Europe,
];

impl PerimeterType {
    /// Human label used for universal-sweep subgroups
    pub fn label(&self) -> &'static str {
        match self {
            Self::Commune => "Commune",
            Self::Departement => "Département",
            Self::Region => "Région",
            Self::Metropole => "Métropole",
            Self::OutreMer => "Outre-mer",
            Self::France => "France",
            Self::Europe => "Europe",
        }
    }
}

impl WireValue for PerimeterType {
    const ALL: &'static [Self] = &[
        Self::Commune,
        Self::Departement,
        Self::Region,
        Self::Metropole,
        Self::OutreMer,
        Self::France,
        Self::Europe,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Commune => "commune",
            Self::Departement => "departement",
            Self::Region => "region",
            Self::Metropole => "metropole",
            Self::OutreMer => "outre_mer",
            Self::France => "france",
            Self::Europe => "europe",
        }
    }
}

/// Project stage an aide targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "pre_operationnel", alias = "pre_operational")]
    PreOperational,
    #[serde(rename = "operationnel", alias = "operational")]
    Operational,
    #[serde(rename = "fonctionnement", alias = "ongoing")]
    Ongoing,
}

impl WireValue for Stage {
    const ALL: &'static [Self] = &[Self::PreOperational, Self::Operational, Self::Ongoing];

    fn as_str(&self) -> &'static str {
        match self {
            Self::PreOperational => "pre_operationnel",
            Self::Operational => "operationnel",
            Self::Ongoing => "fonctionnement",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::PreOperational => &["pre_operational"],
            Self::Operational => &["operational"],
            Self::Ongoing => &["ongoing"],
        }
    }
}

/// Editorial state of an aide record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Draft,
    ReviewRequired,
    Published,
}

impl WireValue for PublicationStatus {
    const ALL: &'static [Self] = &[Self::Draft, Self::ReviewRequired, Self::Published];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ReviewRequired => "review_required",
            Self::Published => "published",
        }
    }
}

/// Kind of support an aide provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AideType {
    #[serde(rename = "financement", alias = "financing")]
    Financing,
    #[serde(rename = "ingenierie", alias = "engineering")]
    Engineering,
    #[serde(rename = "autre", alias = "other")]
    Other,
}

impl WireValue for AideType {
    const ALL: &'static [Self] = &[Self::Financing, Self::Engineering, Self::Other];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Financing => "financement",
            Self::Engineering => "ingenierie",
            Self::Other => "autre",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Financing => &["financing"],
            Self::Engineering => &["engineering"],
            Self::Other => &["other"],
        }
    }
}

macro_rules! display_as_wire {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_wire!(PerimeterType, Stage, PublicationStatus, AideType);
