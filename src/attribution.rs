// src/attribution.rs
//! Best-effort owner attribution for cosmetic item names.
//!
//! `match_item` returns every catalog entity with a positive score, highest
//! first. Scores are additive and uncapped:
//!
//! | signal | points |
//! |---|---|
//! | entity name as a whole word in the core name | +10 |
//! | entity name as a plain substring | +5 |
//! | each word (len > 2) of a multi-word entity in the core name | +3 |
//! | punctuation-free entity name in the space-free core name | +2 |
//! | alias found in the raw name mapping to this entity | +5 each |
//! | space-free entity name or its first four chars in the raw name | +3 |
//!
//! An explicit override short-circuits with a single [`MAX_CONFIDENCE`] hit.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, info};

use crate::types::MatchCandidate;

pub const MAX_CONFIDENCE: u32 = 100;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGEST_THRESHOLD: f64 = 0.8;

/// Theme/skin-line prefixes stripped (first match only) before scoring.
pub fn default_prefixes() -> Vec<String> {
    [
        "hextech ",
        "project: ",
        "arcade ",
        "pool party ",
        "battle ",
        "cosmic ",
        "dark star ",
        "blood moon ",
        "spirit blossom ",
        "project ",
        "elderwood ",
        "snowdown ",
        "lunar wraith ",
        "championship ",
        "victorious ",
        "conqueror ",
        "bee",
        "beez",
        "pug'",
        "meow",
        "snow",
        "nutcrack",
        "bro",
        "lolli",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("unknown entity `{entity}`{}", did_you_mean(.suggestion))]
    UnknownEntity {
        entity: String,
        suggestion: Option<String>,
    },
    #[error("item name must not be empty")]
    EmptyItem,
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean `{s}`?)"),
        None => String::new(),
    }
}

/// Operator-maintained `item name → entity` corrections.
#[derive(Debug, Default)]
pub struct OverrideStore {
    inner: RwLock<HashMap<String, String>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn get(&self, item: &str) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.get(item).cloned()
    }

    /// Register a correction. The entity must be in `known` (compared
    /// case-insensitively); the stored name takes the catalog's spelling.
    pub fn register(&self, item: &str, entity: &str, known: &[String]) -> Result<(), OverrideError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(OverrideError::EmptyItem);
        }
        let Some(canonical) = known
            .iter()
            .find(|k| k.eq_ignore_ascii_case(entity.trim()))
        else {
            return Err(OverrideError::UnknownEntity {
                entity: entity.to_string(),
                suggestion: suggest_entity(entity, known),
            });
        };
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(item.to_string(), canonical.clone());
        info!(target: "attribution", item, entity = %canonical, "override registered");
        Ok(())
    }

    pub fn remove(&self, item: &str) -> Option<String> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.remove(item)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy, for persistence or display.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Closest known entity by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_entity(name: &str, known: &[String]) -> Option<String> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    known
        .iter()
        .map(|k| (k, strsim::jaro_winkler(&needle, &k.to_lowercase())))
        .filter(|(_, s)| *s >= SUGGEST_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k.clone())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_boundary(left: Option<char>, right: Option<char>) -> bool {
    left.is_some_and(is_word_char) != right.is_some_and(is_word_char)
}

/// `needle` occurs in `hay` delimited by word boundaries on both sides.
pub(crate) fn contains_word(hay: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let first = needle.chars().next();
    let last = needle.chars().next_back();
    hay.match_indices(needle).any(|(i, m)| {
        let before = hay[..i].chars().next_back();
        let after = hay[i + m.len()..].chars().next();
        is_boundary(before, first) && is_boundary(last, after)
    })
}

pub struct AttributionEngine {
    prefixes: Vec<String>,
}

impl Default for AttributionEngine {
    fn default() -> Self {
        Self::new(default_prefixes())
    }
}

impl AttributionEngine {
    pub fn new(prefixes: Vec<String>) -> Self {
        let prefixes = prefixes.into_iter().map(|p| p.to_lowercase()).collect();
        Self { prefixes }
    }

    /// Lower-cased name with the first matching prefix removed.
    pub fn core_name(&self, item_name: &str) -> String {
        let lower = item_name.to_lowercase();
        for p in &self.prefixes {
            if !p.is_empty() {
                if let Some(rest) = lower.strip_prefix(p.as_str()) {
                    return rest.to_string();
                }
            }
        }
        lower
    }

    /// Ranked candidates for `item_name`. `aliases` maps alias text to entity name.
    pub fn match_item(
        &self,
        item_name: &str,
        catalog: &[String],
        aliases: &BTreeMap<String, String>,
        overrides: &OverrideStore,
    ) -> Vec<MatchCandidate> {
        if let Some(entity) = overrides.get(item_name) {
            debug!(target: "attribution", item = item_name, %entity, "explicit override");
            return vec![MatchCandidate::new(entity, MAX_CONFIDENCE)];
        }
        if item_name.trim().is_empty() || catalog.is_empty() {
            return Vec::new();
        }

        let raw = item_name.to_lowercase();
        let core = self.core_name(item_name);
        let core_compact: String = core.chars().filter(|c| *c != ' ').collect();

        let mut out = Vec::new();
        for entity in catalog {
            let score = score_entity(entity, &raw, &core, &core_compact, aliases);
            if score > 0 {
                out.push(MatchCandidate::new(entity.clone(), score));
            }
        }
        // stable: ties keep catalog order
        out.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(
            target: "attribution",
            item = item_name,
            candidates = out.len(),
            best = out.first().map(|c| c.entity_name.as_str()).unwrap_or(""),
            "scored"
        );
        out
    }

    /// Highest-scoring entity, if any.
    pub fn best_match(
        &self,
        item_name: &str,
        catalog: &[String],
        aliases: &BTreeMap<String, String>,
        overrides: &OverrideStore,
    ) -> Option<MatchCandidate> {
        self.match_item(item_name, catalog, aliases, overrides)
            .into_iter()
            .next()
    }
}

fn score_entity(
    entity: &str,
    raw: &str,
    core: &str,
    core_compact: &str,
    aliases: &BTreeMap<String, String>,
) -> u32 {
    let lower = entity.to_lowercase();
    if lower.is_empty() {
        return 0;
    }
    let mut score = 0;

    if core.contains(lower.as_str()) {
        score += if contains_word(core, &lower) { 10 } else { 5 };
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() > 1 {
        for w in words {
            if w.chars().count() > 2 && core.contains(w) {
                score += 3;
            }
        }
    }

    let stripped: String = lower.chars().filter(|c| *c != '\'' && *c != ' ').collect();
    if !stripped.is_empty() && core_compact.contains(stripped.as_str()) {
        score += 2;
    }

    for (alias, target) in aliases {
        if !alias.is_empty()
            && raw.contains(alias.to_lowercase().as_str())
            && target.eq_ignore_ascii_case(&lower)
        {
            score += 5;
        }
    }

    let spaceless: String = lower.chars().filter(|c| *c != ' ').collect();
    let head: String = lower.chars().take(4).collect();
    if raw.contains(spaceless.as_str()) || raw.contains(head.as_str()) {
        score += 3;
    }

    score
}
