//! End-to-end search tests over the in-memory store and a fixed resolver

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use aides_territoires::geo::StaticGeoResolver;
use aides_territoires::model::{Aide, AideType, PerimeterType};
use aides_territoires::search::{
    AggregatorConfig, AideField, AideQuery, Condition, GroupKind, RawFilters, SortOrder,
    TerritoryAggregator,
};
use aides_territoires::store::{AideStore, InMemoryAideStore};
use aides_territoires::{AidesError, Result};

fn raw(value: serde_json::Value) -> RawFilters {
    value.as_object().cloned().expect("filters are an object")
}

fn ile_de_france() -> StaticGeoResolver {
    StaticGeoResolver::new()
        .with_commune("75056", "75", "11")
        .with_department("75", "11")
        .with_region("11", ["75", "77", "78", "91", "92", "93", "94", "95"])
}

fn engine(aides: Vec<Aide>, geo: StaticGeoResolver) -> TerritoryAggregator {
    TerritoryAggregator::new(
        Arc::new(InMemoryAideStore::with_aides(aides)),
        Arc::new(geo),
        AggregatorConfig::default(),
    )
}

fn paris_fixture() -> Vec<Aide> {
    vec![
        Aide::new("paris", "Aide Paris", PerimeterType::Commune, "75056")
            .with_type(AideType::Financing),
        Aide::new("idf", "Aide Île-de-France", PerimeterType::Region, "11")
            .with_type(AideType::Financing),
        Aide::new("fr", "Aide nationale", PerimeterType::France, "")
            .with_type(AideType::Financing),
        Aide::new("fr-ing", "Ingénierie nationale", PerimeterType::France, "")
            .with_type(AideType::Engineering),
    ]
}

fn scope_of(query: &AideQuery) -> Option<(String, String)> {
    match (
        query.condition(AideField::PerimeterApplicationType),
        query.condition(AideField::PerimeterApplicationCode),
    ) {
        (Some(Condition::Equals(t)), Some(Condition::Equals(c))) => Some((t.clone(), c.clone())),
        _ => None,
    }
}

#[tokio::test]
async fn test_paris_commune_search() {
    let engine = engine(paris_fixture(), ile_de_france());

    let response = engine
        .search(raw(json!({
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "75056",
            "type": ["financement"]
        })))
        .await
        .unwrap();

    assert_eq!(response.total_count, 3);
    assert_eq!(response.groups.len(), 2);
    assert!(!response.partial);

    let location = &response.groups[0];
    assert_eq!(location.kind, GroupKind::YourTerritories);
    assert_eq!(location.count, 2);
    let kinds: Vec<_> = location.subgroups.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["votre_commune", "votre_region"]);

    let universal = &response.groups[1];
    assert_eq!(universal.kind, GroupKind::AllTerritories);
    assert_eq!(universal.subgroups.len(), 1);
    assert_eq!(universal.subgroups[0].kind, "france");
    assert_eq!(universal.subgroups[0].aides[0].id, "fr");
}

#[tokio::test]
async fn test_commune_subgroups_run_commune_department_region() {
    let mut aides = paris_fixture();
    aides.push(Aide::new("d75", "Aide Paris départementale", PerimeterType::Departement, "75"));
    let engine = engine(aides, ile_de_france());

    let response = engine
        .search(raw(json!({
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "75056"
        })))
        .await
        .unwrap();

    let location = &response.groups[0];
    let subgroups: Vec<_> = location
        .subgroups
        .iter()
        .map(|s| (s.kind.as_str(), s.aides[0].id.as_str()))
        .collect();
    assert_eq!(
        subgroups,
        vec![
            ("votre_commune", "paris"),
            ("votre_departement", "d75"),
            ("votre_region", "idf"),
        ]
    );
    assert_eq!(location.count, 3);
    assert_eq!(response.total_count, 5);
}

#[tokio::test]
async fn test_unreachable_resolver_degrades_location_branch() {
    let engine = engine(paris_fixture(), StaticGeoResolver::unreachable());

    let response = engine
        .search(raw(json!({
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "75056"
        })))
        .await
        .unwrap();

    assert!(response.partial);
    assert_eq!(response.unresolved.len(), 1);
    assert_eq!(response.unresolved[0].perimeter_type, PerimeterType::Commune);
    assert_eq!(response.unresolved[0].code, "75056");

    // The commune query ran before resolution
    let location = &response.groups[0];
    assert_eq!(location.subgroups.len(), 1);
    assert_eq!(location.subgroups[0].kind, "votre_commune");

    let universal = &response.groups[1];
    assert_eq!(universal.kind, GroupKind::AllTerritories);
    assert_eq!(universal.count, 2);
    assert_eq!(response.total_count, 3);
}

#[tokio::test]
async fn test_unknown_commune_yields_universal_only() {
    let engine = engine(paris_fixture(), ile_de_france());

    let response = engine
        .search(raw(json!({
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "99999"
        })))
        .await
        .unwrap();

    assert!(response.partial);
    assert_eq!(response.groups.len(), 1);
    assert_eq!(response.groups[0].kind, GroupKind::AllTerritories);
}

#[tokio::test]
async fn test_search_is_idempotent() {
    let engine = engine(paris_fixture(), ile_de_france());
    let filters = json!({
        "initialPerimeterType": "region",
        "initialPerimeterCode": "11",
        "perimeterAdditionalData": { "label": "Île-de-France" },
        "stage": null,
        "themes": []
    });

    let first = engine.search(raw(filters.clone())).await.unwrap();
    let second = engine.search(raw(filters)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_keywords_only_narrow_the_universal_branch() {
    let aides = vec![
        Aide::new("c", "Pistes cyclables", PerimeterType::Commune, "75056"),
        Aide::new("velo", "Plan vélo", PerimeterType::France, "").with_keywords("vélo mobilité"),
        Aide::new("eau", "Plan eau", PerimeterType::France, "").with_keywords("eau potable"),
    ];
    let engine = engine(aides, ile_de_france());

    let response = engine
        .search(raw(json!({
            "initialPerimeterType": "commune",
            "initialPerimeterCode": "75056",
            "keywords": "VÉLO"
        })))
        .await
        .unwrap();

    assert_eq!(response.groups[0].subgroups[0].aides[0].id, "c");
    let universal = &response.groups[1];
    assert_eq!(universal.count, 1);
    assert_eq!(universal.subgroups[0].aides[0].id, "velo");
}

#[tokio::test]
async fn test_universal_sweep_respects_type_restriction() {
    let aides = vec![
        Aide::new("fr", "Nationale", PerimeterType::France, ""),
        Aide::new("eu", "Européenne", PerimeterType::Europe, ""),
        Aide::new("om", "Outre-mer", PerimeterType::OutreMer, ""),
    ];
    let engine = engine(aides, ile_de_france());

    let response = engine
        .search(raw(json!({ "perimeterApplicationType": ["europe", "outre_mer"] })))
        .await
        .unwrap();

    let kinds: Vec<_> = response.groups[0]
        .subgroups
        .iter()
        .map(|s| s.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["outre_mer", "europe"]);
}

/// Holds every department-scoped query until all of them have arrived
struct FanOutStore {
    inner: InMemoryAideStore,
    barrier: Barrier,
    department_queries: AtomicUsize,
    region_queries: AtomicUsize,
}

#[async_trait::async_trait]
impl AideStore for FanOutStore {
    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>> {
        match scope_of(query) {
            Some((t, c)) if t == "departement" && !c.is_empty() => {
                self.department_queries.fetch_add(1, Ordering::SeqCst);
                self.barrier.wait().await;
            }
            Some((t, c)) if t == "region" && !c.is_empty() => {
                self.region_queries.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
        self.inner.find(query, sort).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Aide>> {
        self.inner.find_by_id(id).await
    }

    fn kind(&self) -> &'static str {
        "fan-out"
    }
}

#[tokio::test]
async fn test_region_fan_out_is_concurrent() {
    let geo = ile_de_france();
    let departments = 8;
    let store = Arc::new(FanOutStore {
        inner: InMemoryAideStore::with_aides(vec![
            Aide::new("idf", "Régionale", PerimeterType::Region, "11"),
            Aide::new("d77", "Seine-et-Marne", PerimeterType::Departement, "77"),
            Aide::new("d93", "Seine-Saint-Denis", PerimeterType::Departement, "93"),
        ]),
        barrier: Barrier::new(departments),
        department_queries: AtomicUsize::new(0),
        region_queries: AtomicUsize::new(0),
    });
    let engine = TerritoryAggregator::new(store.clone(), Arc::new(geo), AggregatorConfig::default());

    // Sequential department lookups would never get past the barrier
    let response = tokio::time::timeout(
        Duration::from_secs(5),
        engine.search(raw(json!({
            "initialPerimeterType": "region",
            "initialPerimeterCode": "11"
        }))),
    )
    .await
    .expect("department queries were not issued concurrently")
    .unwrap();

    assert_eq!(store.department_queries.load(Ordering::SeqCst), departments);
    assert_eq!(store.region_queries.load(Ordering::SeqCst), 1);

    let location = &response.groups[0];
    let labels: Vec<_> = location
        .subgroups
        .iter()
        .map(|s| (s.kind.as_str(), s.label.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("region_de_recherche", "Pour votre région"),
            ("departement_de_la_region", "Pour le département 77"),
            ("departement_de_la_region", "Pour le département 93"),
        ]
    );
    assert_eq!(response.total_count, 3);
}

/// Fails every department-scoped query
struct BrokenDepartmentStore {
    inner: InMemoryAideStore,
}

#[async_trait::async_trait]
impl AideStore for BrokenDepartmentStore {
    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>> {
        match scope_of(query) {
            Some((t, c)) if t == "departement" && !c.is_empty() => {
                Err(AidesError::Database("replica set unavailable".into()))
            }
            _ => self.inner.find(query, sort).await,
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Aide>> {
        self.inner.find_by_id(id).await
    }

    fn kind(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn test_store_failure_fails_the_search() {
    let engine = TerritoryAggregator::new(
        Arc::new(BrokenDepartmentStore {
            inner: InMemoryAideStore::with_aides(paris_fixture()),
        }),
        Arc::new(ile_de_france()),
        AggregatorConfig::default(),
    );

    let err = engine
        .search(raw(json!({
            "initialPerimeterType": "region",
            "initialPerimeterCode": "11"
        })))
        .await
        .unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(err.status_code().as_u16(), 503);

    // Searches that never touch a department still work
    let response = engine.search(raw(json!({}))).await.unwrap();
    assert_eq!(response.total_count, 2);
}
