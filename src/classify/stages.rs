// src/classify/stages.rs
//! Independent filter/transform stages. Each one looks at a single record and
//! answers keep / narrow / drop; the pipeline owns ordering and bookkeeping.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

use super::keywords::{contains_any, is_ability_slot_line, KeywordTables, TableClassifier};
use super::signals::{has_digit, is_noise_line, is_numerically_significant, is_stat_change};
use crate::types::{ClassificationLabel, VersionedRecord};

static RE_EARLY_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?[01]\.\d+").expect("early version regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    /// Keep the record but replace its change lines.
    Narrow(Vec<String>),
    Drop(ClassificationLabel),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("record `{0}` has no change lines")]
    EmptyRecord(String),
}

pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError>;
}

fn require_lines(record: &VersionedRecord) -> Result<(), StageError> {
    if record.change_lines.is_empty() {
        return Err(StageError::EmptyRecord(record.version_label.clone()));
    }
    Ok(())
}

/// Drops records whose every line names a game mode, and records whose label
/// names one unless a line carries base-game numbers.
pub struct GameModeStage {
    tables: Arc<KeywordTables>,
}

impl GameModeStage {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }

    fn mentions_mode(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.tables.game_modes)
    }

    pub fn is_game_mode(&self, record: &VersionedRecord) -> bool {
        let lines = &record.change_lines;
        if !lines.is_empty() && lines.iter().all(|l| self.mentions_mode(l)) {
            return true;
        }
        if !self.mentions_mode(&record.version_label) {
            return false;
        }
        !lines
            .iter()
            .any(|l| !self.mentions_mode(l) && is_numerically_significant(l, &self.tables))
    }
}

impl Stage for GameModeStage {
    fn name(&self) -> &'static str {
        "game_mode"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        require_lines(record)?;
        if self.is_game_mode(record) {
            return Ok(Verdict::Drop(ClassificationLabel::GameModeOnly));
        }
        Ok(Verdict::Keep)
    }
}

/// Keeps records with at least one numerically significant line and narrows
/// them to significant lines plus lines free of bug-fix/animation/model noise.
pub struct NumericStage {
    tables: Arc<KeywordTables>,
    noise: TableClassifier,
}

impl NumericStage {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        let noise = TableClassifier::noise(&tables);
        Self { tables, noise }
    }

    /// Why a record without numeric content is noise, for diagnostics.
    fn drop_label(&self, lines: &[String]) -> ClassificationLabel {
        if let Some(label) = self.noise.first_match(lines) {
            return label;
        }
        if !lines.iter().any(|l| has_digit(l)) {
            return ClassificationLabel::NoNumericValue;
        }
        ClassificationLabel::Other
    }
}

impl Stage for NumericStage {
    fn name(&self) -> &'static str {
        "numeric_significance"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        require_lines(record)?;
        let mut kept = Vec::with_capacity(record.change_lines.len());
        let mut significant = false;
        for line in &record.change_lines {
            if is_numerically_significant(line, &self.tables) {
                significant = true;
                kept.push(line.clone());
            } else if !is_noise_line(line, &self.tables) {
                kept.push(line.clone());
            }
        }
        if !significant {
            return Ok(Verdict::Drop(self.drop_label(&record.change_lines)));
        }
        if kept == record.change_lines {
            Ok(Verdict::Keep)
        } else {
            Ok(Verdict::Narrow(kept))
        }
    }
}

/// Drops records that mention undocumented/unlisted changes.
pub struct UndocumentedStage {
    tables: Arc<KeywordTables>,
}

impl UndocumentedStage {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }
}

impl Stage for UndocumentedStage {
    fn name(&self) -> &'static str {
        "undocumented"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        require_lines(record)?;
        let hit = record.change_lines.iter().any(|l| {
            !is_ability_slot_line(l, &self.tables.ability_slots)
                && contains_any(&l.to_lowercase(), &self.tables.undocumented)
        });
        if hit {
            return Ok(Verdict::Drop(ClassificationLabel::Other));
        }
        Ok(Verdict::Keep)
    }
}

/// Drops alpha builds, `v0.x`/`v1.x` labels and month-named snapshots.
pub struct AlphaLabelStage {
    tables: Arc<KeywordTables>,
}

impl AlphaLabelStage {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }

    pub fn is_alpha_or_dated(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        let trimmed = lower.trim();
        lower.contains("alpha")
            || RE_EARLY_VERSION.is_match(&lower)
            || self
                .tables
                .month_names
                .iter()
                .any(|m| !m.is_empty() && trimmed.starts_with(m.to_lowercase().as_str()))
    }
}

impl Stage for AlphaLabelStage {
    fn name(&self) -> &'static str {
        "alpha_or_dated_label"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        if self.is_alpha_or_dated(&record.version_label) {
            return Ok(Verdict::Drop(ClassificationLabel::AlphaOrDatedPrefix));
        }
        Ok(Verdict::Keep)
    }
}

/// Keeps anything with a stat-change signal; otherwise drops records that are
/// provably icon/tooltip/recommended-items/splash only.
pub struct CosmeticStage {
    tables: Arc<KeywordTables>,
    cosmetic: TableClassifier,
}

impl CosmeticStage {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        let cosmetic = TableClassifier::cosmetic(&tables);
        Self { tables, cosmetic }
    }
}

impl Stage for CosmeticStage {
    fn name(&self) -> &'static str {
        "stat_vs_cosmetic"
    }

    fn evaluate(&self, record: &VersionedRecord) -> Result<Verdict, StageError> {
        require_lines(record)?;
        if record
            .change_lines
            .iter()
            .any(|l| is_stat_change(l, &self.tables))
        {
            return Ok(Verdict::Keep);
        }
        match self.cosmetic.first_match(&record.change_lines) {
            Some(label) => Ok(Verdict::Drop(label)),
            None => Ok(Verdict::Keep),
        }
    }
}
