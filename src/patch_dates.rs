// src/patch_dates.rs
//! Version → release-date lookup built from patch-schedule tables.
//!
//! Table cells are written inconsistently (`V14.3`, `v 14.3`, `Version 14.3`);
//! keys are canonicalized to `v14.3` on insert and on lookup.

use std::collections::HashMap;

use crate::date::normalize_date;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchDateIndex {
    map: HashMap<String, String>,
}

/// `"Version 14.3"` / `"V 14.3"` / `"V14.3"` → `"v14.3"`.
pub fn canonical_version(raw: &str) -> String {
    let trimmed = raw.trim();
    let v = match trimmed.strip_prefix("Version ") {
        Some(rest) => format!("v{}", rest.trim()),
        None => trimmed.to_string(),
    };
    v.replace('V', "v").replace("v ", "v")
}

impl PatchDateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(version cell, date cell)` rows; header rows must already be skipped.
    pub fn from_rows<I, A, B>(rows: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut idx = Self::new();
        for (version, date) in rows {
            idx.insert(version.as_ref(), date.as_ref());
        }
        idx
    }

    pub fn insert(&mut self, version: &str, date: &str) {
        let key = canonical_version(version);
        let date = date.trim();
        if key.is_empty() || date.is_empty() {
            return;
        }
        self.map.insert(key, date.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Raw date cell for a record label. Tries the label before ` - `, then
    /// the same with the leading `v` toggled.
    pub fn lookup(&self, label: &str) -> Option<&str> {
        let head = label.split(" - ").next().unwrap_or(label);
        let clean = canonical_version(head);
        if let Some(d) = self.map.get(&clean) {
            return Some(d.as_str());
        }
        let alt = match clean.strip_prefix('v') {
            Some(rest) => rest.to_string(),
            None => format!("v{clean}"),
        };
        self.map.get(&alt).map(String::as_str)
    }

    /// Normalized date for a record label, if the index knows it.
    pub fn normalized(&self, label: &str) -> Option<String> {
        self.lookup(label).map(normalize_date)
    }
}
