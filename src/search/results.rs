//! Search response types and assembly
//!
//! Branch outputs are merged into at most two groups: the location-scoped
//! group first, then the universal one. Empty subgroups never exist and a
//! group without subgroups is left out.

use serde::Serialize;

use crate::geo::ResolutionError;
use crate::model::{Aide, PerimeterType};

/// Top-level result group discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    #[serde(rename = "vos_territoires")]
    YourTerritories,
    #[serde(rename = "tous_les_territoires")]
    AllTerritories,
}

impl GroupKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::YourTerritories => "Pour votre territoire",
            Self::AllTerritories => "Pour tous les territoires",
        }
    }
}

/// Aides found for one territory scope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritorySubgroup {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub count: usize,
    pub aides: Vec<Aide>,
}

impl TerritorySubgroup {
    /// Build a subgroup, `None` when there is nothing to show
    pub fn new(kind: impl Into<String>, label: impl Into<String>, aides: Vec<Aide>) -> Option<Self> {
        if aides.is_empty() {
            return None;
        }
        Some(Self {
            kind: kind.into(),
            label: label.into(),
            count: aides.len(),
            aides,
        })
    }
}

/// A labelled list of subgroups
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultGroup {
    #[serde(rename = "type")]
    pub kind: GroupKind,
    pub label: String,
    pub count: usize,
    pub subgroups: Vec<TerritorySubgroup>,
}

impl ResultGroup {
    /// Build a group, `None` when no subgroup survived
    pub fn new(kind: GroupKind, subgroups: Vec<TerritorySubgroup>) -> Option<Self> {
        if subgroups.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            label: kind.label().to_string(),
            count: subgroups.iter().map(|s| s.count).sum(),
            subgroups,
        })
    }
}

/// A territory the resolver could not expand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedTerritory {
    pub perimeter_type: PerimeterType,
    pub code: String,
    pub reason: String,
}

impl UnresolvedTerritory {
    pub fn new(perimeter_type: PerimeterType, code: &str, error: &ResolutionError) -> Self {
        Self {
            perimeter_type,
            code: code.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Subgroups gathered by one search branch, in presentation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchOutcome {
    pub subgroups: Vec<TerritorySubgroup>,
    pub unresolved: Vec<UnresolvedTerritory>,
}

impl BranchOutcome {
    /// Append a subgroup if it has any aide
    pub fn push(&mut self, kind: impl Into<String>, label: impl Into<String>, aides: Vec<Aide>) {
        if let Some(subgroup) = TerritorySubgroup::new(kind, label, aides) {
            self.subgroups.push(subgroup);
        }
    }

    pub fn mark_unresolved(&mut self, territory: UnresolvedTerritory) {
        self.unresolved.push(territory);
    }
}

/// Grouped, counted search results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total_count: usize,
    pub groups: Vec<ResultGroup>,
    /// Set when part of the location hierarchy could not be resolved
    pub partial: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedTerritory>,
}

/// Sum of every subgroup count across groups
pub fn total_count(groups: &[ResultGroup]) -> usize {
    groups
        .iter()
        .flat_map(|group| group.subgroups.iter())
        .map(|subgroup| subgroup.count)
        .sum()
}

/// Merge the branch outputs into a response
pub fn assemble(location: Option<BranchOutcome>, universal: BranchOutcome) -> SearchResponse {
    let mut groups = Vec::with_capacity(2);
    let mut unresolved = Vec::new();

    if let Some(location) = location {
        unresolved.extend(location.unresolved);
        groups.extend(ResultGroup::new(GroupKind::YourTerritories, location.subgroups));
    }
    unresolved.extend(universal.unresolved);
    groups.extend(ResultGroup::new(GroupKind::AllTerritories, universal.subgroups));

    SearchResponse {
        total_count: total_count(&groups),
        partial: !unresolved.is_empty(),
        unresolved,
        groups,
    }
}
