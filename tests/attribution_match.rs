// tests/attribution_match.rs
//
// Owner scoring against the built-in reference catalog.

use patch_sieve::attribution::{AttributionEngine, OverrideError, OverrideStore, MAX_CONFIDENCE};
use patch_sieve::catalog::ReferenceCatalog;

fn best(engine: &AttributionEngine, reference: &ReferenceCatalog, name: &str) -> Option<String> {
    engine
        .best_match(
            name,
            &reference.known_entities,
            &reference.aliases,
            &reference.override_store(),
        )
        .map(|c| c.entity_name)
}

#[test]
fn prefixed_names_resolve_to_their_owner() {
    let reference = ReferenceCatalog::default();
    let engine = AttributionEngine::new(reference.prefixes.clone());

    assert_eq!(best(&engine, &reference, "Arcade Ahri").as_deref(), Some("Ahri"));
    assert_eq!(
        best(&engine, &reference, "Pool Party Miss Fortune").as_deref(),
        Some("Miss Fortune")
    );
}

#[test]
fn overrides_win_outright() {
    let reference = ReferenceCatalog::default();
    let engine = AttributionEngine::new(reference.prefixes.clone());
    let got = engine.match_item(
        "Gun Goddess Miss Fortune",
        &reference.known_entities,
        &reference.aliases,
        &reference.override_store(),
    );
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].entity_name, "Miss Fortune");
    assert_eq!(got[0].score, MAX_CONFIDENCE);
}

#[test]
fn candidates_are_ranked_highest_first() {
    let reference = ReferenceCatalog::default();
    let engine = AttributionEngine::default();
    let got = engine.match_item(
        "Spirit Blossom Ahri",
        &reference.known_entities,
        &reference.aliases,
        &OverrideStore::new(),
    );
    assert!(!got.is_empty());
    assert_eq!(got[0].entity_name, "Ahri");
    assert!(got.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(got.iter().all(|c| c.score > 0));
}

#[test]
fn core_name_strips_one_prefix() {
    let engine = AttributionEngine::default();
    assert_eq!(engine.core_name("Dark Star Thresh"), "thresh");
    assert_eq!(engine.core_name("Hextech Project Zed"), "project zed");
    assert_eq!(engine.core_name("Zed"), "zed");
}

#[test]
fn registering_unknown_entity_suggests_closest() {
    let reference = ReferenceCatalog::default();
    let store = OverrideStore::new();

    let err = store
        .register("Beezcrank", "Blitzcrnak", &reference.known_entities)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown entity `Blitzcrnak` (did you mean `Blitzcrank`?)"
    );
    assert_eq!(
        store.register("  ", "Ahri", &reference.known_entities),
        Err(OverrideError::EmptyItem)
    );
    assert!(store.is_empty());

    store
        .register("Beezcrank", "BLITZCRANK", &reference.known_entities)
        .unwrap();
    assert_eq!(store.snapshot().get("Beezcrank").map(String::as_str), Some("Blitzcrank"));
    assert_eq!(store.remove("Beezcrank").as_deref(), Some("Blitzcrank"));
    assert!(store.is_empty());
}
