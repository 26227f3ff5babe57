//! Integration tests for the import pipeline.
//!
//! These tests run the real importer, projector and query service against the
//! in-memory store and a mock search index keyed by document id.

use std::collections::HashMap;
use std::io::{Cursor, Empty};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use facility_search::errors::{RecordKind, RowError};
use facility_search::importer::{FacilityImporter, ImportConfig};
use facility_search::pipeline::{Pipeline, PipelineConfig};
use facility_search::projector::{IndexProjector, ProjectorConfig};
use facility_search::QueryService;
use facility_search_repository::{
    BatchOperationResult, BatchOperationSummary, FacilityStore, InMemoryFacilityStore,
    SearchIndexError, SearchIndexProvider, SearchIndexService,
};
use facility_search_shared::{
    FacilityHit, FacilitySearchDocument, GeoPoint, TownDocument, TownSuggestion,
};

// Mock search index keeping the last version of every document
#[derive(Default)]
struct MockSearchIndex {
    facilities: Mutex<HashMap<String, FacilitySearchDocument>>,
    towns: Mutex<HashMap<String, TownDocument>>,
    rejected_ids: Vec<String>,
}

impl MockSearchIndex {
    fn rejecting(ids: &[&str]) -> Self {
        Self {
            rejected_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    fn facility_count(&self) -> usize {
        self.facilities.lock().unwrap().len()
    }

    fn facility(&self, id: &str) -> Option<FacilitySearchDocument> {
        self.facilities.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl SearchIndexProvider for MockSearchIndex {
    async fn ensure_indices(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn bulk_index_facilities(
        &self,
        documents: &[FacilitySearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut facilities = self.facilities.lock().unwrap();
        let results = documents
            .iter()
            .map(|doc| {
                if self.rejected_ids.contains(&doc.id) {
                    BatchOperationResult::failed(
                        doc.id.clone(),
                        SearchIndexError::index("document rejected"),
                    )
                } else {
                    facilities.insert(doc.id.clone(), doc.clone());
                    BatchOperationResult::succeeded(doc.id.clone())
                }
            })
            .collect();
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn bulk_index_towns(
        &self,
        towns: &[TownDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut indexed = self.towns.lock().unwrap();
        let results = towns
            .iter()
            .map(|town| {
                indexed.insert(town.document_id().to_string(), town.clone());
                BatchOperationResult::succeeded(town.document_id())
            })
            .collect();
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn full_text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        let query = query.to_lowercase();
        let mut hits: Vec<FacilityHit> = self
            .facilities
            .lock()
            .unwrap()
            .values()
            .filter_map(|doc| {
                let mut fields = vec![
                    (doc.locality.to_lowercase(), 3.0),
                    (doc.name.to_lowercase(), 2.0),
                ];
                fields.extend(doc.activities.iter().map(|a| (a.to_lowercase(), 1.0)));
                let score: f64 = fields
                    .iter()
                    .filter(|(text, _)| text.contains(&query))
                    .map(|(_, weight)| weight)
                    .sum();
                (score > 0.0).then(|| FacilityHit {
                    facility: doc.clone(),
                    relevance_score: score,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        let center = GeoPoint::new(lng, lat);
        let mut hits: Vec<(f64, FacilityHit)> = self
            .facilities
            .lock()
            .unwrap()
            .values()
            .map(|doc| (doc.point().distance_meters(&center), doc))
            .filter(|(distance, _)| *distance <= radius_meters)
            .map(|(distance, doc)| {
                (
                    distance,
                    FacilityHit {
                        facility: doc.clone(),
                        relevance_score: 0.0,
                    },
                )
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits.into_iter().take(limit).map(|(_, hit)| hit).collect())
    }

    async fn suggest_town_names(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<TownSuggestion>, SearchIndexError> {
        let prefix = prefix.to_lowercase();
        let mut suggestions: Vec<TownSuggestion> = self
            .towns
            .lock()
            .unwrap()
            .values()
            .filter(|town| town.name.to_lowercase().starts_with(&prefix))
            .map(|town| TownSuggestion {
                name: town.name.clone(),
                location: town.point(),
            })
            .collect();
        suggestions.sort_by(|a, b| a.name.cmp(&b.name));
        suggestions.truncate(limit);
        Ok(suggestions)
    }

    async fn town_location(&self, name: &str) -> Result<Option<GeoPoint>, SearchIndexError> {
        Ok(self
            .towns
            .lock()
            .unwrap()
            .values()
            .filter(|town| town.name.to_lowercase() == name.to_lowercase())
            .min_by(|a, b| a.code.cmp(&b.code))
            .map(TownDocument::point))
    }
}

/// Build a quote-delimited facility line with the given columns filled in.
fn facility_line(id: &str, name: &str, locality: &str, lng: f64, lat: f64) -> String {
    let lng = lng.to_string();
    let lat = lat.to_string();
    let mut columns = vec![""; 28];
    columns[0] = name;
    columns[1] = id;
    columns[2] = locality;
    columns[9] = &lng;
    columns[10] = &lat;
    columns[27] = "2015-02-12";
    format!("\"{}\"", columns.join("\",\""))
}

fn equipment_line(facility_id: &str, number: &str, name: &str) -> String {
    format!("Nantes,44,{},x,{},{},y,Sol dur,Extérieur", facility_id, number, name)
}

fn activity_line(number: &str, activity: &str) -> String {
    format!("Nantes,44,{},x,y,{}", number, activity)
}

fn csv(header: &str, lines: &[String]) -> Cursor<String> {
    let mut content = header.to_string();
    for line in lines {
        content.push('\n');
        content.push_str(line);
    }
    content.push('\n');
    Cursor::new(content)
}

struct Fixture {
    store: Arc<InMemoryFacilityStore>,
    index: Arc<MockSearchIndex>,
    pipeline: Pipeline,
    queries: QueryService,
}

fn fixture_with(index: MockSearchIndex) -> Fixture {
    let store = Arc::new(InMemoryFacilityStore::new());
    let index = Arc::new(index);
    let search = SearchIndexService::new(index.clone());
    let pipeline = Pipeline::new(
        store.clone(),
        search.clone(),
        PipelineConfig {
            import: ImportConfig::default(),
            projector: ProjectorConfig { batch_size: 2 },
        },
    );
    let queries = QueryService::new(store.clone(), search);
    Fixture {
        store,
        index,
        pipeline,
        queries,
    }
}

fn fixture() -> Fixture {
    fixture_with(MockSearchIndex::default())
}

fn sample_sources() -> (Cursor<String>, Cursor<String>, Cursor<String>) {
    let facilities = csv(
        "\"Nom\",\"Numero\"",
        &[
            facility_line("101", "Stade X", "Nantes", -1.5, 47.2),
            facility_line("202", "Complexe Tennis", "Rezé", -1.56, 47.18),
            facility_line("303", "Piscine Angers", "Angers", -0.5632, 47.4784),
        ],
    );
    let equipment = csv(
        "header",
        &[
            equipment_line("101", "E1", "Terrain A"),
            equipment_line("202", "E2", "Court 1"),
            equipment_line("202", "E3", "Court 2"),
            equipment_line("202", "E4", "Club house"),
        ],
    );
    let activities = csv(
        "header",
        &[
            activity_line("E1", "Tennis"),
            activity_line("E2", "Tennis"),
            activity_line("E2", "Padel"),
            activity_line("E3", "Tennis"),
        ],
    );
    (facilities, equipment, activities)
}

#[tokio::test]
async fn test_end_to_end_single_facility() {
    let fixture = fixture();

    let report = fixture
        .pipeline
        .run_streams(
            csv("header", &[facility_line("101", "Stade X", "Nantes", -1.5, 47.2)]),
            csv("header", &[equipment_line("101", "E1", "Terrain A")]),
            csv("header", &[activity_line("E1", "Tennis")]),
            None::<Empty>,
        )
        .await
        .unwrap();

    assert!(report.manifest.is_clean());
    assert!(report.projection.is_success());

    let facility = fixture.queries.get("101").await.unwrap().unwrap();
    assert_eq!(facility.name, "Stade X");
    assert_eq!(facility.location, GeoPoint::new(-1.5, 47.2));
    assert_eq!(facility.equipment.len(), 1);
    assert_eq!(facility.equipment[0].name, "Terrain A");
    assert_eq!(facility.equipment[0].kind, "Sol dur");
    assert_eq!(facility.equipment[0].family, "Extérieur");
    assert_eq!(facility.equipment[0].activities, vec!["Tennis".to_string()]);

    let indexed = fixture.index.facility("101").unwrap();
    assert_eq!(indexed.activities, vec!["Tennis".to_string()]);
    assert_eq!(indexed.location, [-1.5, 47.2]);
}

#[tokio::test]
async fn test_nested_counts_match_source_rows() {
    let fixture = fixture();
    let (facilities, equipment, activities) = sample_sources();

    let report = fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();

    assert_eq!(report.manifest.facilities.applied, 3);
    assert_eq!(report.manifest.equipment.applied, 4);
    assert_eq!(report.manifest.activities.applied, 4);

    let complexe = fixture.store.get("202").await.unwrap().unwrap();
    assert_eq!(complexe.equipment.len(), 3);
    assert_eq!(
        complexe.equipment_by_number("E2").unwrap().activities,
        vec!["Tennis".to_string(), "Padel".to_string()]
    );
    assert_eq!(complexe.equipment_by_number("E3").unwrap().activities.len(), 1);
    assert!(complexe.equipment_by_number("E4").unwrap().activities.is_empty());

    let piscine = fixture.store.get("303").await.unwrap().unwrap();
    assert!(piscine.equipment.is_empty());
}

#[tokio::test]
async fn test_equipment_pass_twice_doubles_equipment() {
    let store = Arc::new(InMemoryFacilityStore::new());
    let importer = FacilityImporter::new(store.clone());
    let (facilities, _, _) = sample_sources();
    let equipment = || {
        csv(
            "header",
            &[
                equipment_line("101", "E1", "Terrain A"),
                equipment_line("202", "E2", "Court 1"),
            ],
        )
    };

    importer.import_facilities(facilities).await.unwrap();
    importer.import_equipment(equipment()).await.unwrap();
    importer.import_equipment(equipment()).await.unwrap();

    assert_eq!(store.get("101").await.unwrap().unwrap().equipment.len(), 2);
    assert_eq!(store.get("202").await.unwrap().unwrap().equipment.len(), 2);
}

#[tokio::test]
async fn test_statistics() {
    let fixture = fixture();
    assert_eq!(fixture.queries.average_equipment_per_facility().await.unwrap(), None);
    assert!(fixture.queries.count_by_activity().await.unwrap().is_empty());
    assert!(fixture.queries.facility_with_most_equipment().await.unwrap().is_none());

    let (facilities, equipment, activities) = sample_sources();
    fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();

    let counts = fixture.queries.count_by_activity().await.unwrap();
    assert_eq!(counts[0].activity, "Tennis");
    assert_eq!(counts[0].total, 3);
    assert_eq!(counts[1].activity, "Padel");
    assert_eq!(counts[1].total, 1);

    let busiest = fixture.queries.facility_with_most_equipment().await.unwrap().unwrap();
    assert_eq!(busiest.id, "202");

    let average = fixture
        .queries
        .average_equipment_per_facility()
        .await
        .unwrap()
        .unwrap();
    assert!((average - 4.0 / 3.0).abs() < 1e-9);
    assert_eq!(fixture.queries.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_two_tennis_equipment_count_two() {
    let fixture = fixture();
    fixture
        .pipeline
        .run_streams(
            csv("header", &[facility_line("1", "Tennis Club", "Nantes", -1.5, 47.2)]),
            csv(
                "header",
                &[equipment_line("1", "T1", "Court 1"), equipment_line("1", "T2", "Court 2")],
            ),
            csv("header", &[activity_line("T1", "tennis"), activity_line("T2", "tennis")]),
            None::<Empty>,
        )
        .await
        .unwrap();

    let counts = fixture.queries.count_by_activity().await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].activity, "tennis");
    assert_eq!(counts[0].total, 2);
}

#[tokio::test]
async fn test_geo_search_zero_radius_is_exact() {
    let fixture = fixture();
    let (facilities, equipment, activities) = sample_sources();
    fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();

    let exact = fixture.queries.geo_search(47.2, -1.5, 0.0).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, "101");

    let around = fixture.queries.geo_search(47.2, -1.5, 10_000.0).await.unwrap();
    assert_eq!(
        around.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        vec!["101", "202"]
    );
}

#[tokio::test]
async fn test_projection_is_idempotent() {
    let fixture = fixture();
    let (facilities, equipment, activities) = sample_sources();
    fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();
    assert_eq!(fixture.index.facility_count(), 3);

    let projector = IndexProjector::new(
        fixture.store.clone(),
        SearchIndexService::new(fixture.index.clone()),
    );
    let report = projector.run().await.unwrap();

    assert_eq!(report.indexed, 3);
    assert_eq!(fixture.index.facility_count(), 3);
}

#[tokio::test]
async fn test_rejected_documents_are_reported() {
    let fixture = fixture_with(MockSearchIndex::rejecting(&["202"]));
    let (facilities, equipment, activities) = sample_sources();

    let report = fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();

    assert_eq!(report.projection.failed_ids(), vec!["202"]);
    assert_eq!(report.projection.indexed, 2);
    assert!(fixture.index.facility("202").is_none());
}

#[tokio::test]
async fn test_bad_rows_do_not_stop_the_import() {
    let fixture = fixture();

    let report = fixture
        .pipeline
        .run_streams(
            csv(
                "header",
                &[
                    facility_line("101", "Stade X", "Nantes", -1.5, 47.2),
                    "\"Sans numero\",\"\"".to_string(),
                ],
            ),
            csv(
                "header",
                &[equipment_line("999", "E9", "Orphan"), equipment_line("101", "E1", "Terrain A")],
            ),
            csv(
                "header",
                &[activity_line("E404", "Golf"), "a,b,E1".to_string(), activity_line("E1", "Rugby")],
            ),
            None::<Empty>,
        )
        .await
        .unwrap();

    let manifest = &report.manifest;
    assert_eq!(manifest.total_failures(), 3);
    assert_eq!(manifest.facilities.failures[0].line, 3);
    assert_eq!(
        manifest.equipment.failures[0].error,
        RowError::unresolved(RecordKind::Facility, "999")
    );
    assert_eq!(
        manifest.activities.failures[0].error,
        RowError::unresolved(RecordKind::Equipment, "E404")
    );
    assert_eq!(manifest.activities.skipped, 1);

    let facility = fixture.store.get("101").await.unwrap().unwrap();
    assert_eq!(facility.equipment[0].activities, vec!["Rugby".to_string()]);
}

#[tokio::test]
async fn test_towns_import_and_lookup() {
    let fixture = fixture();
    let (facilities, equipment, activities) = sample_sources();
    let towns = Cursor::new(
        "code,nom,a,b,c,d,lng,lat\n\
         44109,Nantes,x,x,x,x,-1.5,47.2\n\
         44143,Rezé,x,x,x,x,-1.56,47.18\n\
         44162,\"Saint-Herblain\",x,x,x,x,-1.65,47.21\n\
         49007,Angers,x,x,x,x,east,47.47\n",
    );

    let report = fixture
        .pipeline
        .run_streams(facilities, equipment, activities, Some(towns))
        .await
        .unwrap();

    let towns = report.towns.unwrap();
    assert_eq!(towns.rows.processed, 4);
    assert_eq!(towns.rows.applied, 3);
    assert_eq!(towns.rows.failed(), 1);
    assert!(towns.failed_ids.is_empty());

    let suggestions = fixture.queries.suggest_town_names("sai", None).await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].name, "Saint-Herblain");

    let location = fixture.queries.town_location("nantes").await.unwrap();
    assert_eq!(location, Some(GeoPoint::new(-1.5, 47.2)));

    let near = fixture.queries.search_near_town("Nantes", 10_000.0).await.unwrap();
    assert_eq!(
        near.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        vec!["101", "202"]
    );
}

#[tokio::test]
async fn test_towns_sharing_a_name_are_both_indexed() {
    let fixture = fixture();
    let towns = Cursor::new(
        "code,nom,a,b,c,d,lng,lat\n\
         44150,Saint-Aubin-des-Châteaux,x,x,x,x,-1.49,47.72\n\
         49269,Saint-Aubin-des-Châteaux,x,x,x,x,-0.57,47.35\n",
    );

    let report = fixture
        .pipeline
        .run_streams(
            Cursor::new("header\n"),
            Cursor::new("header\n"),
            Cursor::new("header\n"),
            Some(towns),
        )
        .await
        .unwrap();

    let towns = report.towns.unwrap();
    assert_eq!(towns.rows.applied, 2);
    assert_eq!(fixture.index.towns.lock().unwrap().len(), 2);

    let suggestions = fixture.queries.suggest_town_names("saint-aubin", None).await.unwrap();
    let mut points: Vec<GeoPoint> = suggestions.iter().map(|s| s.location).collect();
    points.sort_by(|a, b| a.longitude().total_cmp(&b.longitude()));
    assert_eq!(
        points,
        vec![GeoPoint::new(-1.49, 47.72), GeoPoint::new(-0.57, 47.35)]
    );
}

#[tokio::test]
async fn test_full_text_and_nearby_search() {
    let fixture = fixture();
    let (facilities, equipment, activities) = sample_sources();
    fixture
        .pipeline
        .run_streams(facilities, equipment, activities, None::<Empty>)
        .await
        .unwrap();

    let hits = fixture.queries.full_text_search("angers", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].facility.id, "303");

    assert!(fixture.queries.full_text_search("   ", None).await.unwrap().is_empty());

    let nearby = fixture
        .queries
        .search_nearby(47.2, -1.5, 5_000.0, Some(1))
        .await
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].facility.id, "101");
}
