// tests/classify_pipeline.rs
//
// End-state behaviour of the classification stages.

use patch_sieve::classify::{
    classify, ClassificationPipeline, ClassificationReport, ClassifyOptions,
};
use patch_sieve::types::{ClassificationLabel, CosmeticKind, VersionedRecord};

fn rec(label: &str, lines: &[&str]) -> VersionedRecord {
    VersionedRecord::new(label, "Unknown", lines.iter().map(|s| s.to_string()).collect())
}

fn sample() -> Vec<VersionedRecord> {
    vec![
        rec("V9.1", &["Orb of Deception Q: damage increased to 60 from 50"]),
        rec("V14.3", &["Base armor 30 + 4 per level", "Fixed a bug with Q particles"]),
        rec("V14.10", &["Mana cost reduced to 70 from 80"]),
        rec("V4.1", &["Splash art resized to 50%", "Updated splash artwork"]),
        rec("V3.1", &["Patch contains undocumented changes to damage 5%"]),
        rec("V0.9.25.21", &["Base damage 40/65/90"]),
    ]
}

#[test]
fn dominion_records() {
    let opts = ClassifyOptions::default();
    let all_dominion = rec(
        "Dominion Update",
        &["Dominion: heal 10", "Dominion: capture speed 20%"],
    );
    let mixed = rec(
        "Dominion Update",
        &["Dominion: heal 10", "Base damage increased to 60 from 50"],
    );
    assert!(classify(vec![all_dominion], opts).is_empty());
    assert_eq!(classify(vec![mixed], opts).len(), 1);
}

#[test]
fn survivors_are_sorted_and_non_empty() {
    let out = classify(sample(), ClassifyOptions::default());
    let labels: Vec<_> = out.iter().map(|r| r.version_label.as_str()).collect();
    assert_eq!(labels, vec!["V14.10", "V14.3", "V9.1", "V3.1"]);
    assert!(out.iter().all(|r| !r.change_lines.is_empty()));
    // noise lines are narrowed away
    assert_eq!(out[1].change_lines, vec!["Base armor 30 + 4 per level"]);
}

#[test]
fn classification_is_idempotent() {
    let opts = ClassifyOptions {
        include_undocumented: false,
        exclude_art_sustainability: true,
        exclude_alpha_or_dated_labels: true,
    };
    let once = classify(sample(), opts);
    let twice = classify(once.clone(), opts);
    assert_eq!(once, twice);
}

#[test]
fn option_toggles() {
    let strict = ClassifyOptions {
        include_undocumented: false,
        ..ClassifyOptions::default()
    };
    let out = classify(sample(), strict);
    assert!(out.iter().all(|r| r.version_label != "V3.1"));

    let slot = rec("V7.1", &["Orb of Deception Q: undocumented damage 40 to 50"]);
    let plain = rec("V7.2", &["Undocumented: damage 40 to 50"]);
    assert_eq!(classify(vec![slot], strict).len(), 1);
    assert!(classify(vec![plain], strict).is_empty());

    let keep_alpha = ClassifyOptions {
        exclude_alpha_or_dated_labels: false,
        ..ClassifyOptions::default()
    };
    let out = classify(sample(), keep_alpha);
    assert!(out.iter().any(|r| r.version_label == "V0.9.25.21"));
}

#[test]
fn cosmetic_only_records_are_dropped_with_their_category() {
    let p = ClassificationPipeline::with_defaults(ClassifyOptions::default());
    let out = p.classify_detailed(vec![
        rec("V6.1", &["Splash art resized to 50%", "Updated splash artwork"]),
        rec("V6.2", &["Splash art resized to 50%", "Attack range 550 to 575"]),
        // no stat signal, but not provably cosmetic either
        rec("V6.3", &["Splash art resized to 50%", "Now slows enemies"]),
    ]);
    let labels: Vec<_> = out.included.iter().map(|r| r.version_label.as_str()).collect();
    assert_eq!(labels, vec!["V6.3", "V6.2"]);
    assert_eq!(out.excluded.len(), 1);
    assert_eq!(
        out.excluded[0].label,
        ClassificationLabel::Cosmetic(CosmeticKind::Splash)
    );
}

#[test]
fn report_counts_every_category() {
    let p = ClassificationPipeline::with_defaults(ClassifyOptions::default());
    let classified = p.classify_detailed(sample());
    let report = ClassificationReport::build(&p, &classified, &[]);
    assert_eq!(report.total, 6);
    assert_eq!(report.included_count, 4);
    assert_eq!(report.excluded_count, 2);
    assert_eq!(report.counts.get("alpha_or_dated_prefix"), Some(&1));
    assert_eq!(report.counts.get("cosmetic_splash"), Some(&1));
    assert_eq!(report.records[0].version_label, "V14.10");
}
