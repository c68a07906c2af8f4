// src/classify/report.rs
//! Read-only diagnostic projection: every record's status plus counts per
//! exclusion category. Not a control input to the pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

use super::signals::has_digit;
use super::stages::{AlphaLabelStage, GameModeStage};
use super::{Classified, ClassificationPipeline, Exclusion, TableClassifier};
use crate::types::ClassificationLabel;
use crate::version::VersionKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordStatus {
    pub version_label: String,
    pub date: String,
    pub change_lines: Vec<String>,
    pub included: bool,
    pub label: Option<ClassificationLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationReport {
    pub total: usize,
    pub included_count: usize,
    pub excluded_count: usize,
    pub counts: BTreeMap<String, usize>,
    /// All records, newest version first.
    pub records: Vec<RecordStatus>,
}

impl ClassificationReport {
    /// `skipped` are records the extractor never instantiated (label-level exclusions).
    pub fn build(
        pipeline: &ClassificationPipeline,
        classified: &Classified,
        skipped: &[Exclusion],
    ) -> Self {
        let tables = pipeline.tables().clone();
        let alpha = AlphaLabelStage::new(tables.clone());
        let game_mode = GameModeStage::new(tables.clone());
        let noise = TableClassifier::noise(&tables);
        let check_alpha = pipeline.options().exclude_alpha_or_dated_labels;

        let categorize = |ex: &Exclusion| -> ClassificationLabel {
            if ex.label == ClassificationLabel::ArtSustainability {
                return ex.label;
            }
            if check_alpha && alpha.is_alpha_or_dated(&ex.version_label) {
                return ClassificationLabel::AlphaOrDatedPrefix;
            }
            let as_record = crate::types::VersionedRecord::new(
                ex.version_label.clone(),
                ex.date.clone(),
                ex.change_lines.clone(),
            );
            if game_mode.is_game_mode(&as_record) {
                return ClassificationLabel::GameModeOnly;
            }
            if let Some(label) = noise.first_match(&ex.change_lines) {
                return label;
            }
            if !ex.change_lines.is_empty() && !ex.change_lines.iter().any(|l| has_digit(l)) {
                return ClassificationLabel::NoNumericValue;
            }
            ex.label
        };

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut records = Vec::new();

        for ex in skipped.iter().chain(classified.excluded.iter()) {
            let label = categorize(ex);
            *counts.entry(label.as_str().to_string()).or_insert(0) += 1;
            records.push(RecordStatus {
                version_label: ex.version_label.clone(),
                date: ex.date.clone(),
                change_lines: ex.change_lines.clone(),
                included: false,
                label: Some(label),
            });
        }
        let excluded_count = records.len();

        for r in &classified.included {
            records.push(RecordStatus {
                version_label: r.version_label.clone(),
                date: r.date.clone(),
                change_lines: r.change_lines.clone(),
                included: true,
                label: None,
            });
        }

        records.sort_by_cached_key(|r| std::cmp::Reverse(VersionKey::parse(&r.version_label)));

        Self {
            total: records.len(),
            included_count: classified.included.len(),
            excluded_count,
            counts,
            records,
        }
    }
}
