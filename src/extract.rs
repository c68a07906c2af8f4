// src/extract.rs
//! Record extraction: term markers open records, sibling lists feed change lines.
//!
//! Line rules, in order:
//! - empty lines and lines already seen anywhere in the document are skipped;
//!   duplicates are compared after entity decoding and whitespace collapsing,
//!   not byte for byte
//! - inline icon / `New Effect:` markers pass through verbatim
//! - `Stats:` / `General:` stat blocks expand into a header plus one bullet per sentence
//! - other `name: description` lines get a break before trigger phrases
//! - everything else passes through

use metrics::{counter, describe_counter};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classify::keywords::{contains_any, KeywordTables};
use crate::classify::Exclusion;
use crate::date::extract_date;
use crate::patch_dates::PatchDateIndex;
use crate::source::{Fragment, FragmentKind};
use crate::types::{ClassificationLabel, VersionedRecord};

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(?:\s+|$)").expect("sentence regex"));

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("extract_records_total", "Records produced by the extractor.");
        describe_counter!(
            "extract_duplicate_lines_total",
            "Change lines skipped as document-wide duplicates."
        );
    });
}

/// Decode entities and collapse whitespace, as the page text would read.
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    RE_WS.replace_all(decoded.trim(), " ").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub exclude_game_modes: bool,
    pub exclude_art_sustainability: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            exclude_game_modes: true,
            exclude_art_sustainability: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Records in document order.
    pub records: Vec<VersionedRecord>,
    /// Records rejected by label before any line was read.
    pub skipped: Vec<Exclusion>,
    pub duplicate_lines: usize,
    pub malformed: usize,
}

pub struct RecordExtractor {
    tables: Arc<KeywordTables>,
    options: ExtractOptions,
    patch_dates: Option<Arc<PatchDateIndex>>,
}

impl RecordExtractor {
    pub fn new(tables: Arc<KeywordTables>, options: ExtractOptions) -> Self {
        Self {
            tables,
            options,
            patch_dates: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Arc::new(KeywordTables::default()), ExtractOptions::default())
    }

    /// Prefer dates from a patch-schedule index over dates embedded in labels.
    pub fn with_patch_dates(mut self, index: Arc<PatchDateIndex>) -> Self {
        self.patch_dates = Some(index);
        self
    }

    pub fn extract(&self, fragments: &[Fragment]) -> Vec<VersionedRecord> {
        self.extract_detailed(fragments).records
    }

    /// Like [`extract`](Self::extract), plus label-level skips and counts.
    /// Duplicate lines are detected on [`clean_text`] output.
    pub fn extract_detailed(&self, fragments: &[Fragment]) -> Extraction {
        ensure_metrics_described();
        let mut out = Extraction::default();
        let mut seen: HashSet<String> = HashSet::new();

        let mut i = 0;
        while i < fragments.len() {
            if fragments[i].kind != FragmentKind::TermMarker {
                i += 1;
                continue;
            }
            let end = fragments[i + 1..]
                .iter()
                .position(|f| f.kind == FragmentKind::TermMarker)
                .map(|p| i + 1 + p)
                .unwrap_or(fragments.len());
            let marker = &fragments[i];
            let body = &fragments[i + 1..end];
            i = end;

            let label = clean_text(&marker.text);
            if label.is_empty() {
                out.malformed += 1;
                warn!(target: "extract", "term marker without text; skipping its section");
                continue;
            }

            if let Some(reason) = self.label_exclusion(&label) {
                debug!(target: "extract", version = %label, %reason, "skipping by label");
                out.skipped.push(Exclusion {
                    date: self.date_for(&label),
                    version_label: label,
                    change_lines: Vec::new(),
                    label: reason,
                    stage: "extract".to_string(),
                });
                continue;
            }

            let mut lines = Vec::new();
            for list in body.iter().filter(|f| f.kind == FragmentKind::ListContainer) {
                for item in list.list_items() {
                    let text = clean_text(&item.text);
                    if text.is_empty() {
                        continue;
                    }
                    if !seen.insert(text.clone()) {
                        out.duplicate_lines += 1;
                        continue;
                    }
                    self.expand_line(&text, &mut lines);
                }
            }

            if lines.is_empty() {
                debug!(target: "extract", version = %label, "no change lines; not emitted");
                continue;
            }

            out.records.push(VersionedRecord {
                date: self.date_for(&label),
                version_label: label,
                change_lines: lines,
            });
        }

        counter!("extract_records_total").increment(out.records.len() as u64);
        counter!("extract_duplicate_lines_total").increment(out.duplicate_lines as u64);
        debug!(
            target: "extract",
            records = out.records.len(),
            skipped = out.skipped.len(),
            duplicates = out.duplicate_lines,
            "extraction finished"
        );
        out
    }

    fn label_exclusion(&self, label: &str) -> Option<ClassificationLabel> {
        let lower = label.to_lowercase();
        if self.options.exclude_game_modes && contains_any(&lower, &self.tables.game_modes) {
            return Some(ClassificationLabel::GameModeOnly);
        }
        if self.options.exclude_art_sustainability
            && contains_any(&lower, &self.tables.art_sustainability)
        {
            return Some(ClassificationLabel::ArtSustainability);
        }
        None
    }

    fn date_for(&self, label: &str) -> String {
        self.patch_dates
            .as_ref()
            .and_then(|idx| idx.normalized(label))
            .unwrap_or_else(|| extract_date(label))
    }

    fn expand_line(&self, text: &str, out: &mut Vec<String>) {
        if self
            .tables
            .inline_markers
            .iter()
            .any(|m| !m.is_empty() && text.starts_with(m.as_str()))
        {
            out.push(text.to_string());
            return;
        }

        let Some((name, desc)) = text.split_once(':') else {
            out.push(text.to_string());
            return;
        };
        let name = name.trim();

        if self.tables.stat_block_headers.iter().any(|h| h == name) {
            let header = format!("{name}:");
            let bullets: Vec<String> = RE_SENTENCE
                .split(text)
                .map(|clause| clause.replace(&header, ""))
                .filter(|clause| !clause.trim().is_empty())
                .map(|clause| format!("• {}.", clause.trim()))
                .collect();
            // a bare header carries nothing
            if !bullets.is_empty() {
                out.push(header);
                out.extend(bullets);
            }
            return;
        }

        let mut desc = desc.trim().to_string();
        for phrase in &self.tables.trigger_phrases {
            if !phrase.is_empty() && desc.contains(phrase.as_str()) {
                desc = desc.replace(phrase.as_str(), &format!("\n{phrase}"));
            }
        }
        let desc = desc.trim_start_matches('\n');
        out.push(format!("{name}: {desc}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Vec<Fragment> {
        vec![
            Fragment::other("intro"),
            Fragment::term("V14.3"),
            Fragment::list([
                "Stats: Health increased to 600. Attack speed 0.625 to 0.65.",
                "Fox-Fire W: Damage increased. Now triggers on takedowns.",
            ]),
            Fragment::term("ARAM balance"),
            Fragment::list(["Damage dealt reduced to 95%"]),
            Fragment::term("V14.2"),
            Fragment::other("note"),
            Fragment::list(["Fox-Fire W: Damage increased. Now triggers on takedowns.", ""]),
            Fragment::term("V14.1"),
            Fragment::list(["Charm E: cooldown&nbsp;12 seconds"]),
        ]
    }

    #[test]
    fn groups_expands_and_dedups() {
        let ex = RecordExtractor::with_defaults().extract_detailed(&doc());
        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.duplicate_lines, 1);
        assert_eq!(ex.skipped.len(), 1);
        assert_eq!(ex.skipped[0].label, ClassificationLabel::GameModeOnly);

        let r = &ex.records[0];
        assert_eq!(r.version_label, "V14.3");
        assert_eq!(
            r.change_lines,
            vec![
                "Stats:".to_string(),
                "• Health increased to 600.".to_string(),
                "• Attack speed 0.625 to 0.65.".to_string(),
                "Fox-Fire W: Damage increased. \nNow triggers on takedowns.".to_string(),
            ]
        );
        assert_eq!(ex.records[1].change_lines, vec!["Charm E: cooldown 12 seconds"]);
    }

    #[test]
    fn empty_term_marker_is_malformed() {
        let frags = vec![Fragment::term("  "), Fragment::list(["Q: damage 10"])];
        let ex = RecordExtractor::with_defaults().extract_detailed(&frags);
        assert!(ex.records.is_empty());
        assert_eq!(ex.malformed, 1);
    }

    #[test]
    fn bare_stat_header_emits_nothing() {
        let frags = vec![
            Fragment::term("V13.2"),
            Fragment::list(["Stats: ", "Q: damage 10 to 20"]),
        ];
        let recs = RecordExtractor::with_defaults().extract(&frags);
        assert_eq!(recs[0].change_lines, vec!["Q: damage 10 to 20"]);
    }

    #[test]
    fn duplicates_compare_normalized_text() {
        let frags = vec![
            Fragment::term("V13.3"),
            Fragment::list(["Q: damage  10 to 20", "Q:&nbsp;damage 10 to 20", "W: mana 40"]),
        ];
        let ex = RecordExtractor::with_defaults().extract_detailed(&frags);
        assert_eq!(ex.duplicate_lines, 1);
        assert_eq!(ex.records[0].change_lines, vec!["Q: damage 10 to 20", "W: mana 40"]);
    }

    #[test]
    fn inline_markers_pass_through() {
        let frags = vec![
            Fragment::term("V13.1"),
            Fragment::list(["New Effect: Stats: now heals 5%"]),
        ];
        let recs = RecordExtractor::with_defaults().extract(&frags);
        assert_eq!(recs[0].change_lines, vec!["New Effect: Stats: now heals 5%"]);
    }
}
