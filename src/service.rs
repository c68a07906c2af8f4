// src/service.rs
//! Facade over the collaborators: fetch → extract → classify for patch pages,
//! and the cached cosmetic catalog with attribution on top.
//!
//! Only this layer reports [`SourceError`]; `Ok(vec![])` is a valid empty result.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::attribution::{AttributionEngine, OverrideError, OverrideStore};
use crate::cache::SnapshotCache;
use crate::catalog::{build_cosmetic_catalog, CatalogStats, CosmeticCatalog, ReferenceCatalog};
use crate::classify::{ClassificationPipeline, ClassificationReport, KeywordTables};
use crate::config::AppConfig;
use crate::extract::RecordExtractor;
use crate::patch_dates::PatchDateIndex;
use crate::source::{DocumentSource, SourceError};
use crate::types::{CosmeticItem, MatchCandidate, VersionedRecord};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("catalog_rebuild_total", "Cosmetic catalog rebuilds.");
        describe_counter!(
            "catalog_cache_hits_total",
            "Cosmetic catalog reads served from the cached snapshot."
        );
    });
}

/// An unattributed item and its ranked owner guesses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UnattributedItem {
    pub item: CosmeticItem,
    pub candidates: Vec<MatchCandidate>,
}

pub struct PatchService {
    source: Arc<dyn DocumentSource>,
    extractor: RecordExtractor,
    pipeline: ClassificationPipeline,
    reference: Arc<ReferenceCatalog>,
    overrides: OverrideStore,
    engine: AttributionEngine,
    catalog: SnapshotCache<CosmeticCatalog>,
    catalog_table: String,
    catalog_ttl: Duration,
    top_owners: usize,
}

impl PatchService {
    pub fn new(source: Arc<dyn DocumentSource>, config: &AppConfig, reference: ReferenceCatalog) -> Self {
        ensure_metrics_described();
        let tables = Arc::new(config.keywords.clone());
        let mut extractor = RecordExtractor::new(tables.clone(), config.classify.extract_options());
        if let Some(id) = &config.source.patch_schedule {
            match source.fetch_table(id) {
                Ok(rows) => {
                    let index = PatchDateIndex::from_rows(
                        rows.iter()
                            .filter(|r| r.len() >= 2)
                            .map(|r| (r[0].as_str(), r[1].as_str())),
                    );
                    info!(target: "service", table = %id, versions = index.len(), "patch dates indexed");
                    extractor = extractor.with_patch_dates(Arc::new(index));
                }
                Err(e) => {
                    warn!(target: "service", error = %e, "patch schedule unavailable; using label dates")
                }
            }
        }

        Self {
            pipeline: ClassificationPipeline::new(tables, config.classify.options()),
            extractor,
            overrides: reference.override_store(),
            engine: AttributionEngine::new(reference.prefixes.clone()),
            reference: Arc::new(reference),
            source,
            catalog: SnapshotCache::new(),
            catalog_table: config.catalog.table.clone(),
            catalog_ttl: config.catalog.ttl(),
            top_owners: config.catalog.top_owners,
        }
    }

    /// Load the reference catalog from `[catalog].reference_path` (seed if absent).
    pub fn from_config(source: Arc<dyn DocumentSource>, config: &AppConfig) -> anyhow::Result<Self> {
        let reference = ReferenceCatalog::load_or_seed(&config.catalog.reference_path)?;
        Ok(Self::new(source, config, reference))
    }

    /// Service with built-in tables and reference data.
    pub fn with_defaults(source: Arc<dyn DocumentSource>) -> Self {
        Self::new(source, &AppConfig::default(), ReferenceCatalog::default_seed())
    }

    pub fn reference(&self) -> &ReferenceCatalog {
        &self.reference
    }

    pub fn tables(&self) -> &Arc<KeywordTables> {
        self.pipeline.tables()
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Gameplay-significant records of one page, newest version first.
    pub fn patches(&self, id: &str) -> Result<Vec<VersionedRecord>, SourceError> {
        let fragments = self.source.fetch_document(id)?;
        let records = self.extractor.extract(&fragments);
        let out = self.pipeline.classify(records);
        info!(target: "service", page = id, records = out.len(), "patches ready");
        Ok(out)
    }

    /// Every record of one page with its inclusion status and exclusion label.
    pub fn classification_report(&self, id: &str) -> Result<ClassificationReport, SourceError> {
        let fragments = self.source.fetch_document(id)?;
        let extraction = self.extractor.extract_detailed(&fragments);
        let classified = self.pipeline.classify_detailed(extraction.records);
        Ok(ClassificationReport::build(
            &self.pipeline,
            &classified,
            &extraction.skipped,
        ))
    }

    pub fn cosmetic_catalog(&self) -> Result<Arc<CosmeticCatalog>, SourceError> {
        self.cosmetic_catalog_at(Instant::now())
    }

    /// Catalog snapshot as seen at `now`; rebuilt when older than the TTL.
    /// A failed rebuild that falls back to the old snapshot counts as a hit.
    pub fn cosmetic_catalog_at(&self, now: Instant) -> Result<Arc<CosmeticCatalog>, SourceError> {
        let mut rebuilt = false;
        let snapshot = self.catalog.get_or_refresh(now, self.catalog_ttl, || {
            let rows = self.source.fetch_table(&self.catalog_table)?;
            let catalog = build_cosmetic_catalog(&rows, &self.reference, &self.overrides);
            rebuilt = true;
            Ok::<_, SourceError>(catalog)
        })?;
        if rebuilt {
            counter!("catalog_rebuild_total").increment(1);
        } else {
            counter!("catalog_cache_hits_total").increment(1);
        }
        Ok(snapshot)
    }

    pub fn items_for(&self, owner: &str) -> Result<Vec<CosmeticItem>, SourceError> {
        let catalog = self.cosmetic_catalog()?;
        let owner = self.reference.canonical_entity(owner).unwrap_or(owner);
        Ok(catalog.items_for(owner).to_vec())
    }

    pub fn catalog_stats(&self, include_defaults: bool) -> Result<CatalogStats, SourceError> {
        Ok(self.cosmetic_catalog()?.stats(self.top_owners, include_defaults))
    }

    /// Ranked owner candidates for an item name.
    pub fn match_item(&self, name: &str) -> Vec<MatchCandidate> {
        self.engine.match_item(
            name,
            &self.reference.known_entities,
            &self.reference.aliases,
            &self.overrides,
        )
    }

    /// Unattributed catalog items with their ranked guesses.
    pub fn unattributed(&self) -> Result<Vec<UnattributedItem>, SourceError> {
        let catalog = self.cosmetic_catalog()?;
        Ok(catalog
            .unattributed
            .iter()
            .map(|item| UnattributedItem {
                item: item.clone(),
                candidates: self.match_item(&item.name),
            })
            .collect())
    }

    /// Record an operator correction; the next catalog read rebuilds with it.
    pub fn register_override(&self, item: &str, entity: &str) -> Result<(), OverrideError> {
        self.overrides
            .register(item, entity, &self.reference.known_entities)?;
        self.catalog.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Fragment, StaticSource, TableRows};
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingRecorder {
        counters: Mutex<HashMap<String, Arc<AtomicU64>>>,
    }

    impl CountingRecorder {
        fn get(&self, name: &str) -> u64 {
            let counters = self.counters.lock().unwrap();
            counters.get(name).map_or(0, |c| c.load(Ordering::Relaxed))
        }
    }

    impl Recorder for CountingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let mut counters = self.counters.lock().unwrap();
            Counter::from_arc(counters.entry(key.name().to_string()).or_default().clone())
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    /// Table source that can be switched off mid-test.
    struct FlakySource {
        inner: StaticSource,
        down: AtomicBool,
    }

    impl DocumentSource for FlakySource {
        fn fetch_document(&self, id: &str) -> Result<Vec<Fragment>, SourceError> {
            self.inner.fetch_document(id)
        }

        fn fetch_table(&self, id: &str) -> Result<TableRows, SourceError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable {
                    id: id.to_string(),
                    reason: "offline".into(),
                });
            }
            self.inner.fetch_table(id)
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn service() -> PatchService {
        let src = StaticSource::new()
            .with_document(
                "Ahri",
                vec![
                    Fragment::term("V14.3"),
                    Fragment::list(["Orb of Deception Q: damage increased to 60 from 50"]),
                ],
            )
            .with_table(
                "List_of_champion_skins",
                vec![
                    vec!["Ahri", "Arcade Ahri", "2019-06-12"],
                    vec!["", "Glimmering Trinket", "2020-01-01"],
                ],
            );
        PatchService::with_defaults(Arc::new(src))
    }

    #[test]
    fn missing_page_is_a_source_error() {
        let svc = service();
        assert!(matches!(svc.patches("Zed"), Err(SourceError::Unavailable { .. })));
        assert_eq!(svc.patches("Ahri").unwrap().len(), 1);
    }

    #[test]
    fn override_invalidates_catalog() {
        let svc = service();
        let before = svc.cosmetic_catalog().unwrap();
        assert_eq!(before.unattributed.len(), 1);

        svc.register_override("Glimmering Trinket", "ahri").unwrap();
        let after = svc.cosmetic_catalog().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.unattributed.is_empty());
        assert_eq!(svc.items_for("ahri").unwrap().len(), 2);
    }

    #[test]
    fn failed_rebuild_is_not_counted_as_rebuild() {
        let src = Arc::new(FlakySource {
            inner: StaticSource::new().with_table(
                "List_of_champion_skins",
                vec![vec!["Ahri", "Arcade Ahri", "2019-06-12"]],
            ),
            down: AtomicBool::new(false),
        });
        let config = AppConfig::default();
        let svc = PatchService::new(src.clone(), &config, ReferenceCatalog::default_seed());
        let recorder = CountingRecorder::default();

        metrics::with_local_recorder(&recorder, || {
            let t0 = Instant::now();
            let fresh = svc.cosmetic_catalog_at(t0).unwrap();
            src.down.store(true, Ordering::SeqCst);
            let expired = t0 + config.catalog.ttl() + Duration::from_secs(1);
            let stale = svc.cosmetic_catalog_at(expired).unwrap();
            assert!(Arc::ptr_eq(&fresh, &stale));
        });

        assert_eq!(recorder.get("catalog_rebuild_total"), 1);
        assert_eq!(recorder.get("catalog_cache_hits_total"), 1);
    }
}
