// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod date;
pub mod types;
pub mod version;

// Collaborator boundary (fragments, tables)
pub mod patch_dates;
pub mod source;

// Extraction & classification
pub mod classify;
pub mod extract;

// Cosmetic catalog & attribution
pub mod attribution;
pub mod cache;
pub mod catalog;

pub mod config;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::attribution::{AttributionEngine, OverrideStore, MAX_CONFIDENCE};
pub use crate::classify::{classify, ClassificationPipeline, ClassifyOptions};
pub use crate::date::{normalize_date, UNKNOWN_DATE};
pub use crate::extract::{ExtractOptions, RecordExtractor};
pub use crate::service::PatchService;
pub use crate::types::{
    ClassificationLabel, CosmeticItem, CosmeticKind, MatchCandidate, VersionedRecord,
};
