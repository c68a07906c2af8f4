// src/classify/mod.rs
//! Classification pipeline: an ordered list of independent [`Stage`]s applied
//! to extracted records, followed by a newest-first version sort.
//!
//! Order:
//! 0) art & sustainability labels (opt-in)
//! 1) game-mode labels / all-game-mode content
//! 2) numeric significance (narrows change lines)
//! 3) undocumented markers (only when `include_undocumented` is off)
//! 4) alpha / `v0.x` / `v1.x` / month-named labels (opt-in)
//! 5) stat-change signal vs. cosmetic-only content
//!
//! A stage error never aborts the batch: the record is excluded as `Other`.

pub mod keywords;
pub mod report;
pub mod signals;
pub mod stages;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use keywords::{KeywordRule, KeywordTables, MatchPolicy, TableClassifier};
pub use report::{ClassificationReport, RecordStatus};
pub use stages::{Stage, StageError, Verdict};

use crate::types::{ClassificationLabel, VersionedRecord};
use crate::version::sort_records_desc;
use stages::{AlphaLabelStage, CosmeticStage, GameModeStage, NumericStage, UndocumentedStage};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("classify_records_total", "Records entering the pipeline.");
        describe_counter!("classify_included_total", "Records surviving every stage.");
        describe_counter!(
            "classify_excluded_total",
            "Records dropped, labelled by exclusion category."
        );
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    pub include_undocumented: bool,
    pub exclude_art_sustainability: bool,
    pub exclude_alpha_or_dated_labels: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            include_undocumented: true,
            exclude_art_sustainability: false,
            exclude_alpha_or_dated_labels: true,
        }
    }
}

/// One excluded record with the stage that dropped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub version_label: String,
    pub date: String,
    pub change_lines: Vec<String>,
    pub label: ClassificationLabel,
    pub stage: String,
}

impl Exclusion {
    fn from_record(record: VersionedRecord, label: ClassificationLabel, stage: &str) -> Self {
        Self {
            version_label: record.version_label,
            date: record.date,
            change_lines: record.change_lines,
            label,
            stage: stage.to_string(),
        }
    }
}

/// Included records (sorted newest first) plus every exclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub included: Vec<VersionedRecord>,
    pub excluded: Vec<Exclusion>,
}

struct ArtSustainabilityStage {
    tables: Arc<KeywordTables>,
}

impl Stage for ArtSustainabilityStage {
    fn name(&self) -> &'static str {
        "art_sustainability"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        let label = record.version_label.to_lowercase();
        if keywords::contains_any(&label, &self.tables.art_sustainability) {
            return Ok(Verdict::Drop(ClassificationLabel::ArtSustainability));
        }
        Ok(Verdict::Keep)
    }
}

enum Outcome {
    Kept { record: VersionedRecord, narrowed: bool },
    Dropped(Exclusion),
}

pub struct ClassificationPipeline {
    stages: Vec<Box<dyn Stage>>,
    tables: Arc<KeywordTables>,
    options: ClassifyOptions,
}

impl ClassificationPipeline {
    pub fn new(tables: Arc<KeywordTables>, options: ClassifyOptions) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if options.exclude_art_sustainability {
            stages.push(Box::new(ArtSustainabilityStage {
                tables: tables.clone(),
            }));
        }
        stages.push(Box::new(GameModeStage::new(tables.clone())));
        stages.push(Box::new(NumericStage::new(tables.clone())));
        if !options.include_undocumented {
            stages.push(Box::new(UndocumentedStage::new(tables.clone())));
        }
        if options.exclude_alpha_or_dated_labels {
            stages.push(Box::new(AlphaLabelStage::new(tables.clone())));
        }
        stages.push(Box::new(CosmeticStage::new(tables.clone())));
        Self {
            stages,
            tables,
            options,
        }
    }

    /// Pipeline with the built-in keyword tables.
    pub fn with_defaults(options: ClassifyOptions) -> Self {
        Self::new(Arc::new(KeywordTables::default()), options)
    }

    pub fn tables(&self) -> &Arc<KeywordTables> {
        &self.tables
    }

    pub fn options(&self) -> ClassifyOptions {
        self.options
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn classify(&self, records: Vec<VersionedRecord>) -> Vec<VersionedRecord> {
        self.classify_detailed(records).included
    }

    /// Runs every stage until no record is narrowed any further, so that a
    /// second run over the output is a no-op.
    pub fn classify_detailed(&self, records: Vec<VersionedRecord>) -> Classified {
        ensure_metrics_described();
        counter!("classify_records_total").increment(records.len() as u64);

        let mut current = records;
        let mut excluded = Vec::new();
        loop {
            let mut survivors = Vec::with_capacity(current.len());
            let mut narrowed_any = false;
            for record in current {
                match self.run_stages(record) {
                    Outcome::Kept { record, narrowed } => {
                        narrowed_any |= narrowed;
                        survivors.push(record);
                    }
                    Outcome::Dropped(exclusion) => {
                        counter!("classify_excluded_total", "label" => exclusion.label.as_str())
                            .increment(1);
                        excluded.push(exclusion);
                    }
                }
            }
            current = survivors;
            if !narrowed_any {
                break;
            }
        }

        sort_records_desc(&mut current);
        counter!("classify_included_total").increment(current.len() as u64);
        info!(
            target: "classify",
            included = current.len(),
            excluded = excluded.len(),
            "classification finished"
        );
        Classified {
            included: current,
            excluded,
        }
    }

    fn run_stages(&self, mut record: VersionedRecord) -> Outcome {
        let mut narrowed = false;
        for stage in &self.stages {
            match stage.evaluate(&record) {
                Ok(Verdict::Keep) => {}
                Ok(Verdict::Narrow(lines)) => {
                    debug!(
                        target: "classify",
                        version = %record.version_label,
                        stage = stage.name(),
                        before = record.change_lines.len(),
                        after = lines.len(),
                        "narrowed change lines"
                    );
                    record.change_lines = lines;
                    narrowed = true;
                }
                Ok(Verdict::Drop(label)) => {
                    debug!(
                        target: "classify",
                        version = %record.version_label,
                        stage = stage.name(),
                        %label,
                        "filtered out"
                    );
                    return Outcome::Dropped(Exclusion::from_record(record, label, stage.name()));
                }
                Err(e) => {
                    warn!(
                        target: "classify",
                        version = %record.version_label,
                        stage = stage.name(),
                        error = %e,
                        "stage failed; excluding record"
                    );
                    return Outcome::Dropped(Exclusion::from_record(
                        record,
                        ClassificationLabel::Other,
                        stage.name(),
                    ));
                }
            }
        }
        debug!(target: "classify", version = %record.version_label, "included");
        Outcome::Kept { record, narrowed }
    }
}

/// Convenience entry point with the built-in keyword tables.
pub fn classify(records: Vec<VersionedRecord>, options: ClassifyOptions) -> Vec<VersionedRecord> {
    ClassificationPipeline::with_defaults(options).classify(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(label: &str, lines: &[&str]) -> VersionedRecord {
        VersionedRecord::new(label, "Unknown", lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn stage_list_follows_options() {
        let p = ClassificationPipeline::with_defaults(ClassifyOptions {
            include_undocumented: false,
            exclude_art_sustainability: true,
            exclude_alpha_or_dated_labels: false,
        });
        assert_eq!(
            p.stage_names(),
            vec![
                "art_sustainability",
                "game_mode",
                "numeric_significance",
                "undocumented",
                "stat_vs_cosmetic"
            ]
        );
    }

    #[test]
    fn narrowing_that_exposes_game_mode_content_is_settled_in_one_call() {
        let p = ClassificationPipeline::with_defaults(ClassifyOptions::default());
        let out = p.classify_detailed(vec![rec(
            "V4.2",
            &["ARAM: damage reduced by 10%", "Fixed a bug with the recall animation"],
        )]);
        assert!(out.included.is_empty());
        assert_eq!(out.excluded[0].label, ClassificationLabel::GameModeOnly);
    }

    #[test]
    fn stage_errors_do_not_abort_the_batch() {
        let p = ClassificationPipeline::with_defaults(ClassifyOptions::default());
        let out = p.classify_detailed(vec![
            rec("V5.1", &[]),
            rec("V5.2", &["Base damage increased from 40 to 50"]),
        ]);
        assert_eq!(out.included.len(), 1);
        assert_eq!(out.excluded.len(), 1);
        assert_eq!(out.excluded[0].label, ClassificationLabel::Other);
    }
}
