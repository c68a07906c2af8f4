// src/classify/signals.rs
//! Line-level numeric signals used by the numeric-significance and
//! stat-vs-cosmetic stages.

use once_cell::sync::Lazy;
use regex::Regex;

use super::keywords::{contains_any, KeywordTables};

static RE_RATIO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s*/\s*\d+").expect("ratio regex"));
static RE_FROM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+.*from.*\d+").expect("from regex"));
static RE_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+.*to.*\d+").expect("to regex"));
static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+%").expect("percent regex"));
static RE_DELTA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d*)?\s*[+-]").expect("delta regex"));
static RE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d*)?\b").expect("number regex"));
static RE_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("digit regex"));

pub fn has_digit(line: &str) -> bool {
    RE_DIGIT.is_match(line)
}

fn is_transition(line: &str) -> bool {
    RE_RATIO.is_match(line) || RE_FROM.is_match(line) || RE_TO.is_match(line)
}

/// Ratio, `N .. from .. N`, `N .. to .. N`, percentage, signed delta, or a bare
/// number next to a gameplay stat word.
pub fn is_numerically_significant(line: &str, tables: &KeywordTables) -> bool {
    if is_transition(line) || RE_PERCENT.is_match(line) || RE_DELTA.is_match(line) {
        return true;
    }
    RE_NUMBER.is_match(line) && contains_any(&line.to_lowercase(), &tables.numeric_stats)
}

/// Lines that mention bug fixes, animation or model/texture work.
pub fn is_noise_line(line: &str, tables: &KeywordTables) -> bool {
    let lower = line.to_lowercase();
    contains_any(&lower, &tables.bug_fix.keywords)
        || contains_any(&lower, &tables.animation.keywords)
        || contains_any(&lower, &tables.model_texture.keywords)
}

/// Evidence that a line changes gameplay stats, as opposed to presentation.
pub fn is_stat_change(line: &str, tables: &KeywordTables) -> bool {
    if is_transition(line) {
        return true;
    }
    let lower = line.to_lowercase();
    if contains_any(&lower, &tables.change_verbs) {
        return true;
    }
    if lower.contains("added") && !lower.contains("added to the game") {
        return true;
    }
    has_digit(line) && contains_any(&lower, &tables.signal_stats)
}
