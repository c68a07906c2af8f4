// src/types.rs
//! Value objects shared by the extraction, classification and attribution paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One versioned patch entry: label as written, normalized date, ordered bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    pub version_label: String,
    pub date: String,
    pub change_lines: Vec<String>,
}

impl VersionedRecord {
    pub fn new(version_label: impl Into<String>, date: impl Into<String>, change_lines: Vec<String>) -> Self {
        Self {
            version_label: version_label.into(),
            date: date.into(),
            change_lines,
        }
    }
}

/// Cosmetic sub-category used when a record only touches presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticKind {
    Icon,
    Tooltip,
    Items,
    Splash,
}

/// Diagnostic tag for an excluded record. Exactly one applies per exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "label", content = "kind")]
pub enum ClassificationLabel {
    GameModeOnly,
    BugFixOnly,
    AnimationOnly,
    ModelTextureOnly,
    NoNumericValue,
    Cosmetic(CosmeticKind),
    AlphaOrDatedPrefix,
    ArtSustainability,
    Other,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::GameModeOnly => "game_mode_only",
            ClassificationLabel::BugFixOnly => "bug_fix_only",
            ClassificationLabel::AnimationOnly => "animation_only",
            ClassificationLabel::ModelTextureOnly => "model_texture_only",
            ClassificationLabel::NoNumericValue => "no_numeric_value",
            ClassificationLabel::Cosmetic(CosmeticKind::Icon) => "cosmetic_icon",
            ClassificationLabel::Cosmetic(CosmeticKind::Tooltip) => "cosmetic_tooltip",
            ClassificationLabel::Cosmetic(CosmeticKind::Items) => "cosmetic_items",
            ClassificationLabel::Cosmetic(CosmeticKind::Splash) => "cosmetic_splash",
            ClassificationLabel::AlphaOrDatedPrefix => "alpha_or_dated_prefix",
            ClassificationLabel::ArtSustainability => "art_sustainability",
            ClassificationLabel::Other => "other",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A skin/chroma-like item scraped from a cosmetics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticItem {
    pub name: String,
    pub release_date: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Ranked attribution guess. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub entity_name: String,
    pub score: u32,
}

impl MatchCandidate {
    pub fn new(entity_name: impl Into<String>, score: u32) -> Self {
        Self {
            entity_name: entity_name.into(),
            score,
        }
    }
}
