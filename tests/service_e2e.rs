// tests/service_e2e.rs
//
// Fetch → extract → classify and the catalog operations through the facade.

use std::sync::Arc;

use patch_sieve::attribution::OverrideError;
use patch_sieve::catalog::ReferenceCatalog;
use patch_sieve::config::AppConfig;
use patch_sieve::service::PatchService;
use patch_sieve::source::{DirectorySource, Fragment, SourceError, StaticSource};

fn demo_service() -> PatchService {
    PatchService::with_defaults(Arc::new(DirectorySource::new("demos")))
}

#[test]
fn demo_page_keeps_only_gameplay_records() {
    let svc = demo_service();
    let out = svc.patches("Ahri").unwrap();
    let labels: Vec<_> = out.iter().map(|r| r.version_label.as_str()).collect();
    assert_eq!(labels, vec!["V14.3"]);
    assert_eq!(out[0].date, "Unknown");
    assert_eq!(out[0].change_lines.len(), 4);
}

#[test]
fn demo_report_explains_every_exclusion() {
    let report = demo_service().classification_report("Ahri").unwrap();
    assert_eq!(report.total, 5);
    assert_eq!(report.included_count, 1);
    assert_eq!(report.excluded_count, 4);
    for key in [
        "game_mode_only",
        "no_numeric_value",
        "bug_fix_only",
        "alpha_or_dated_prefix",
    ] {
        assert_eq!(report.counts.get(key), Some(&1), "{key}");
    }
    assert!(report
        .records
        .iter()
        .any(|r| r.included && r.version_label == "V14.3"));
}

#[test]
fn unknown_page_is_reported_not_empty() {
    let svc = demo_service();
    assert!(matches!(
        svc.patches("Nobody"),
        Err(SourceError::Unavailable { .. })
    ));
    assert!(svc.classification_report("Nobody").is_err());
}

#[test]
fn schedule_table_supplies_record_dates() {
    let src = StaticSource::new()
        .with_document(
            "Zed",
            vec![
                Fragment::term("V14.3"),
                Fragment::list(["Razor Shuriken Q: damage increased to 80 from 70"]),
                Fragment::term("V13.1 (January 10, 2023)"),
                Fragment::list(["Living Shadow W: cooldown reduced to 18 from 20"]),
            ],
        )
        .with_table("Patch_schedule", vec![vec!["14.3", "2024-02-07"]]);
    let cfg = AppConfig::from_toml_str("[source]\npatch_schedule = \"Patch_schedule\"\n").unwrap();
    let svc = PatchService::new(Arc::new(src), &cfg, ReferenceCatalog::default());

    let out = svc.patches("Zed").unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].date, "07-Feb-2024");
    // not in the schedule: falls back to the date inside the label
    assert_eq!(out[1].date, "10-Jan-2023");
}

#[test]
fn catalog_operations_over_demo_table() {
    let svc = demo_service();
    assert_eq!(svc.items_for("AHRI").unwrap().len(), 3);
    assert!(svc.items_for("Zed").unwrap().is_empty());

    let stats = svc.catalog_stats(true).unwrap();
    assert_eq!(stats.items, 5);

    let pending = svc.unattributed().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].item.name, "Glimmering Trinket");
}

#[test]
fn override_registration_flows_into_catalog() {
    let svc = demo_service();
    let err = svc.register_override("Glimmering Trinket", "Blitzcrnak").unwrap_err();
    assert!(matches!(
        err,
        OverrideError::UnknownEntity { suggestion: Some(ref s), .. } if s == "Blitzcrank"
    ));

    svc.register_override("Glimmering Trinket", "blitzcrank").unwrap();
    let blitz: Vec<_> = svc
        .items_for("Blitzcrank")
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert!(blitz.contains(&"Glimmering Trinket".to_string()));
    assert!(svc.unattributed().unwrap().is_empty());

    let m = svc.match_item("Glimmering Trinket");
    assert_eq!(m[0].entity_name, "Blitzcrank");
    assert_eq!(m[0].score, patch_sieve::MAX_CONFIDENCE);
}
