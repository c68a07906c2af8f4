// src/source.rs
//! Document fragments and the collaborator that produces them.
//!
//! Fetching and DOM traversal live outside this crate. A [`DocumentSource`]
//! hands over an already-flattened, ordered sibling sequence of [`Fragment`]s
//! (definition terms, lists, everything else), or an explicit [`SourceError`].
//! Tabular pages (patch schedules, cosmetic lists) come through
//! [`DocumentSource::fetch_table`] as data rows of cell text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Opens a new versioned record (`<dt>` on the wiki pages).
    TermMarker,
    /// Container whose list items become change lines (`<ul>`).
    ListContainer,
    ListItem,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn term(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::TermMarker,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: FragmentKind::ListContainer,
            text: String::new(),
            children: items.into_iter().map(Fragment::item).collect(),
        }
    }

    pub fn item(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::ListItem,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Other,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// All list items below this fragment, depth-first, in document order.
    pub fn list_items(&self) -> Vec<&Fragment> {
        let mut out = Vec::new();
        collect_items(&self.children, &mut out);
        out
    }
}

fn collect_items<'a>(nodes: &'a [Fragment], out: &mut Vec<&'a Fragment>) {
    for n in nodes {
        if n.kind == FragmentKind::ListItem {
            out.push(n);
        }
        collect_items(&n.children, out);
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("document `{id}` unavailable: {reason}")]
    Unavailable { id: String, reason: String },
    #[error("document `{id}` malformed: {reason}")]
    Malformed { id: String, reason: String },
}

/// Data rows of a table, header excluded.
pub type TableRows = Vec<Vec<String>>;

/// The document collaborator.
pub trait DocumentSource: Send + Sync {
    fn fetch_document(&self, id: &str) -> Result<Vec<Fragment>, SourceError>;

    fn fetch_table(&self, id: &str) -> Result<TableRows, SourceError> {
        Err(SourceError::Unavailable {
            id: id.to_string(),
            reason: format!("{} source has no tables", self.name()),
        })
    }

    fn name(&self) -> &'static str;
}

/// Reads `<root>/<id>.json` fragment dumps and `<root>/<id>.table.json` row
/// dumps produced by an external scraper.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, id: &str, ext: &str) -> PathBuf {
        let file = id.replace(['/', '\\'], "_");
        self.root.join(format!("{file}.{ext}"))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, id: &str, ext: &str) -> Result<T, SourceError> {
        let path = self.path_for(id, ext);
        let content = fs::read_to_string(&path).map_err(|e| SourceError::Unavailable {
            id: id.to_string(),
            reason: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&content).map_err(|e| SourceError::Malformed {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl DocumentSource for DirectorySource {
    fn fetch_document(&self, id: &str) -> Result<Vec<Fragment>, SourceError> {
        self.read_json(id, "json")
    }

    fn fetch_table(&self, id: &str) -> Result<TableRows, SourceError> {
        self.read_json(id, "table.json")
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}

/// In-memory source, handy for tests and embedding callers that already hold fragments.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    docs: HashMap<String, Vec<Fragment>>,
    tables: HashMap<String, TableRows>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        self.docs.insert(id.into(), fragments);
        self
    }

    pub fn with_table<R, C>(mut self, id: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        self.tables.insert(id.into(), rows);
        self
    }
}

impl DocumentSource for StaticSource {
    fn fetch_document(&self, id: &str) -> Result<Vec<Fragment>, SourceError> {
        self.docs
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable {
                id: id.to_string(),
                reason: "not registered".into(),
            })
    }

    fn fetch_table(&self, id: &str) -> Result<TableRows, SourceError> {
        self.tables
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable {
                id: id.to_string(),
                reason: "table not registered".into(),
            })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_items_are_collected_depth_first() {
        let mut outer = Fragment::list(["a", "b"]);
        outer.children[0].children.push(Fragment::list(["a.1"]));
        let texts: Vec<_> = outer.list_items().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "a.1", "b"]);
    }

    #[test]
    fn directory_source_reports_missing_and_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let src = DirectorySource::new(tmp.path());
        assert!(matches!(
            src.fetch_document("Ahri"),
            Err(SourceError::Unavailable { .. })
        ));

        fs::write(tmp.path().join("Ahri.json"), "{ not json").unwrap();
        assert!(matches!(
            src.fetch_document("Ahri"),
            Err(SourceError::Malformed { .. })
        ));

        let doc = vec![Fragment::term("V14.3"), Fragment::list(["Q: damage 40 to 50"])];
        fs::write(tmp.path().join("Ahri.json"), serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(src.fetch_document("Ahri").unwrap(), doc);

        fs::write(
            tmp.path().join("Patch_schedule.table.json"),
            r#"[["V14.3", "February 7, 2024"]]"#,
        )
        .unwrap();
        let rows = src.fetch_table("Patch/schedule").unwrap();
        assert_eq!(rows, vec![vec!["V14.3".to_string(), "February 7, 2024".to_string()]]);
    }
}
