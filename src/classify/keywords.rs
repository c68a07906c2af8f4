// src/classify/keywords.rs
//! Keyword tables and the table-driven category classifier.
//!
//! Every "is this record only X?" question is one [`CategoryRule`]:
//! a keyword set, an optional set of anchor terms that must also appear, and an
//! all/any policy. Lines whose prefix names an ability slot (`Q`, `W`, `E`, `R`,
//! `Passive`) are exempt from single-line keyword checks.
//!
//! All lists can be overridden from the `[keywords]` table of the app config;
//! missing lists fall back to the built-in seed below.

use serde::Deserialize;

use crate::types::{ClassificationLabel, CosmeticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Every non-exempt line must match (and there must be at least one).
    #[default]
    All,
    /// One matching non-exempt line is enough.
    Any,
}

/// Keyword set + anchor terms + policy, as configured.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default)]
    pub policy: MatchPolicy,
}

impl KeywordRule {
    fn new(keywords: &[&str], anchors: &[&str]) -> Self {
        Self {
            keywords: owned(keywords),
            anchors: owned(anchors),
            policy: MatchPolicy::All,
        }
    }

    /// Does a single (already lower-cased) line satisfy this rule?
    pub fn line_matches(&self, lower: &str) -> bool {
        contains_any(lower, &self.keywords)
            && (self.anchors.is_empty() || contains_any(lower, &self.anchors))
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Case-insensitive substring check against an already lower-cased haystack.
pub fn contains_any(lower: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && lower.contains(n.to_lowercase().as_str()))
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeywordTables {
    pub game_modes: Vec<String>,
    pub art_sustainability: Vec<String>,
    pub undocumented: Vec<String>,
    pub ability_slots: Vec<String>,
    pub stat_block_headers: Vec<String>,
    pub inline_markers: Vec<String>,
    pub trigger_phrases: Vec<String>,
    pub month_names: Vec<String>,
    /// Stat words that make a bare number numerically significant.
    pub numeric_stats: Vec<String>,
    /// Stat words that turn any digit into a stat-change signal.
    pub signal_stats: Vec<String>,
    pub change_verbs: Vec<String>,
    pub bug_fix: KeywordRule,
    pub animation: KeywordRule,
    pub model_texture: KeywordRule,
    pub icon: KeywordRule,
    pub tooltip: KeywordRule,
    pub items: KeywordRule,
    pub splash: KeywordRule,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            game_modes: owned(&[
                "regular modes",
                "featured game modes",
                "game modes",
                "featured modes",
                "aram",
                "twisted treeline",
                "all random all mid",
                "featured game mode",
                "howling abyss",
                "normal games",
                "ranked games",
                "game mode",
                "dominion",
                "nexus blitz",
                "teamfight tactics",
                "featured mode",
                "wild rift",
                "urf",
                "one for all",
                "ultimate spellbook",
                "ascension",
                "poro king",
                "doom bots",
                "showdown",
                "hexakill",
                "odyssey",
                "star guardian",
                "project",
                "rgm",
                "rgms",
            ]),
            art_sustainability: owned(&["art & sustainability"]),
            undocumented: owned(&[
                "undocumented",
                "unlisted",
                "not documented",
                "not listed",
                "no patch notes",
                "unreleased",
            ]),
            ability_slots: owned(&["Q", "W", "E", "R", "Passive"]),
            stat_block_headers: owned(&["Stats", "General"]),
            inline_markers: owned(&[
                "<span class=\"inline-image",
                "<span class=\"ability-icon",
                "<span class=\"template_sbc\"><b>New Effect:</b></span>",
                "New Effect:",
            ]),
            trigger_phrases: owned(&["New Effect:", "Now triggers"]),
            month_names: owned(&[
                "january",
                "february",
                "march",
                "april",
                "may",
                "june",
                "july",
                "august",
                "september",
                "october",
                "november",
                "december",
                "jan",
                "feb",
                "mar",
                "apr",
                "jun",
                "jul",
                "aug",
                "sep",
                "oct",
                "nov",
                "dec",
            ]),
            numeric_stats: owned(&[
                "damage", "health", "mana", "cooldown", "range", "speed", "armor", "resist",
            ]),
            signal_stats: owned(&["bonus", "cooldown", "damage", "mana"]),
            change_verbs: owned(&["increased", "decreased", "reduced"]),
            bug_fix: KeywordRule::new(
                &[
                    "bug",
                    "fix",
                    "fixed",
                    "fixes",
                    "bugfix",
                    "resolved an issue",
                    "fixed a bug",
                    "fixed an issue",
                    "corrected",
                    "no longer",
                    "resolved a bug",
                    "now correctly",
                    "now properly",
                ],
                &[],
            ),
            animation: KeywordRule::new(
                &[
                    "animation",
                    "animations",
                    "animated",
                    "visual effect",
                    "vfx",
                    "sfx",
                    "particle",
                    "particles",
                    "effect",
                    "effects",
                    "visual update",
                    "animation update",
                    "new animation",
                    "updated animation",
                    "visual polish",
                    "animation polish",
                    "run animation",
                    "walk animation",
                    "attack animation",
                ],
                &["animation", "visual", "effect", "vfx", "particle"],
            ),
            model_texture: KeywordRule::new(
                &[
                    "model",
                    "models",
                    "texture",
                    "textures",
                    "new model",
                    "new texture",
                    "model update",
                    "texture update",
                    "model and texture",
                    "models and textures",
                    "visual update",
                    "visual upgrade",
                    "visual overhaul",
                    "character model",
                    "model rework",
                    "texture rework",
                ],
                &["model", "texture", "visual"],
            ),
            icon: KeywordRule::new(
                &[
                    "hud",
                    "interface",
                    "user interface",
                    "ui",
                    "icon",
                    "icons",
                    "ability icon",
                    "visual update",
                    "visual effect",
                    "visual display",
                    "ability art",
                    "portrait",
                    "minimap icon",
                ],
                &["icon", "hud", "ui"],
            ),
            tooltip: KeywordRule::new(
                &[
                    "tooltip",
                    "description",
                    "text",
                    "wording",
                    "description text",
                    "ability description",
                    "tooltip text",
                    "description updated",
                    "tooltip updated",
                    "text updated",
                    "wording updated",
                ],
                &["tooltip", "text", "description"],
            ),
            items: KeywordRule::new(
                &[
                    "recommended",
                    "item",
                    "items",
                    "recommended items",
                    "item build",
                    "recommended build",
                    "item recommendation",
                    "item set",
                    "item loadout",
                ],
                &["recommend", "item"],
            ),
            splash: KeywordRule::new(
                &[
                    "splash",
                    "artwork",
                    "splash art",
                    "splash artwork",
                    "art",
                    "artwork updated",
                    "updated artwork",
                    "updated splash",
                    "visual update",
                    "splash screen",
                    "portrait",
                    "champion portrait",
                    "splash image",
                    "loading screen",
                ],
                &["splash", "art", "portrait", "loading screen"],
            ),
        }
    }
}

/// One row of the classifier table.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub label: ClassificationLabel,
    pub rule: KeywordRule,
}

/// Uniform evaluator over `(label, keyword rule, policy)` rows.
#[derive(Debug, Clone)]
pub struct TableClassifier {
    rows: Vec<CategoryRule>,
    ability_slots: Vec<String>,
}

impl TableClassifier {
    pub fn new(rows: Vec<CategoryRule>, ability_slots: &[String]) -> Self {
        Self {
            rows,
            ability_slots: ability_slots.to_vec(),
        }
    }

    /// Cosmetic-only categories applied by the stat-vs-cosmetic stage.
    pub fn cosmetic(tables: &KeywordTables) -> Self {
        Self::new(
            vec![
                CategoryRule {
                    label: ClassificationLabel::Cosmetic(CosmeticKind::Icon),
                    rule: tables.icon.clone(),
                },
                CategoryRule {
                    label: ClassificationLabel::Cosmetic(CosmeticKind::Tooltip),
                    rule: tables.tooltip.clone(),
                },
                CategoryRule {
                    label: ClassificationLabel::Cosmetic(CosmeticKind::Items),
                    rule: tables.items.clone(),
                },
                CategoryRule {
                    label: ClassificationLabel::Cosmetic(CosmeticKind::Splash),
                    rule: tables.splash.clone(),
                },
            ],
            &tables.ability_slots,
        )
    }

    /// Diagnostic-only categories (why a record failed the numeric stage).
    pub fn noise(tables: &KeywordTables) -> Self {
        Self::new(
            vec![
                CategoryRule {
                    label: ClassificationLabel::BugFixOnly,
                    rule: tables.bug_fix.clone(),
                },
                CategoryRule {
                    label: ClassificationLabel::AnimationOnly,
                    rule: tables.animation.clone(),
                },
                CategoryRule {
                    label: ClassificationLabel::ModelTextureOnly,
                    rule: tables.model_texture.clone(),
                },
            ],
            &tables.ability_slots,
        )
    }

    pub fn is_exempt(&self, line: &str) -> bool {
        is_ability_slot_line(line, &self.ability_slots)
    }

    fn rule_matches(&self, rule: &KeywordRule, lines: &[String]) -> bool {
        let mut considered = 0usize;
        for line in lines.iter().filter(|l| !self.is_exempt(l)) {
            considered += 1;
            let hit = rule.line_matches(&line.to_lowercase());
            match rule.policy {
                MatchPolicy::Any if hit => return true,
                MatchPolicy::All if !hit => return false,
                _ => {}
            }
        }
        match rule.policy {
            MatchPolicy::Any => false,
            MatchPolicy::All => considered > 0,
        }
    }

    /// First row (in table order) whose rule holds for `lines`.
    pub fn first_match(&self, lines: &[String]) -> Option<ClassificationLabel> {
        self.rows
            .iter()
            .find(|row| self.rule_matches(&row.rule, lines))
            .map(|row| row.label)
    }
}

/// `"Fox-Fire R: ..."`-style lines: the text before the first colon ends with a slot name.
pub fn is_ability_slot_line(line: &str, slots: &[String]) -> bool {
    match line.split_once(':') {
        Some((prefix, _)) => {
            let prefix = prefix.trim();
            slots.iter().any(|s| !s.is_empty() && prefix.ends_with(s.as_str()))
        }
        None => false,
    }
}
