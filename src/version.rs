// src/version.rs
//! Numeric ordering of version labels (newest first).

use std::cmp::Ordering;
use tracing::warn;

use crate::types::VersionedRecord;

/// Parsed `[major, minor, patch, ...]` key, always at least three components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey(pub Vec<u64>);

impl VersionKey {
    pub const ZERO: [u64; 3] = [0, 0, 0];

    /// `"V14.10 - Art Update"` → `[14, 10, 0]`; anything unparseable → `[0, 0, 0]`.
    pub fn parse(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        let mut body = lower.strip_prefix('v').unwrap_or(&lower);
        if let Some((head, _)) = body.split_once(" - ") {
            body = head;
        }
        let parsed: Result<Vec<u64>, _> = body.trim().split('.').map(str::parse::<u64>).collect();
        match parsed {
            Ok(mut parts) => {
                while parts.len() < 3 {
                    parts.push(0);
                }
                VersionKey(parts)
            }
            Err(_) => {
                warn!(target: "version", %label, "unparseable version label");
                VersionKey(Self::ZERO.to_vec())
            }
        }
    }
}

/// Descending comparison: newer versions come first.
pub fn compare_desc(a: &str, b: &str) -> Ordering {
    VersionKey::parse(b).cmp(&VersionKey::parse(a))
}

/// Stable sort of labels, newest first. Equal keys keep their input order.
pub fn sort_labels_desc<S: AsRef<str>>(labels: &mut [S]) {
    labels.sort_by_cached_key(|l| std::cmp::Reverse(VersionKey::parse(l.as_ref())));
}

/// Stable sort of records by their version label, newest first.
pub fn sort_records_desc(records: &mut [VersionedRecord]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(VersionKey::parse(&r.version_label)));
}
