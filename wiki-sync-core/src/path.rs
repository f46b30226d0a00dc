//! Classifying input paths before they reach the orchestrator.

use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
use crate::model::FileEntry;

/// What a single input file turns into on the wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular page, synced as an article.
    Article,
    /// Content for the category the file sits in.
    CategoryPage,
    /// Drafts and internal files; never synced.
    Skipped,
}

/// An input file together with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntry {
    pub path: String,
    pub kind: EntryKind,
    pub entry: FileEntry,
}

/// The directory segments of `path`, i.e. the category chain it belongs to.
///
/// The file name is dropped, as are empty, `.` and `..` segments.
pub fn category_segments(path: &str) -> Vec<String> {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts
        .into_iter()
        .filter(|segment| !(segment.is_empty() || *segment == "." || *segment == ".."))
        .map(str::to_owned)
        .collect()
}

/// `["a", "b"]` → `["/a", "/a/b"]`.
pub fn cumulative_paths(segments: &[String]) -> Vec<String> {
    let mut prefix = String::new();
    segments
        .iter()
        .map(|segment| {
            prefix.push('/');
            prefix.push_str(segment);
            prefix.clone()
        })
        .collect()
}

pub fn classify(path: &str, category_marker: &str) -> EntryKind {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name.contains(category_marker) {
        return EntryKind::CategoryPage;
    }
    if path.split('/').any(|segment| segment.contains('_')) {
        return EntryKind::Skipped;
    }
    EntryKind::Article
}

/// Parse the `{path: {metadata, content}}` mapping and classify every entry,
/// keeping input order.
pub fn ingest(input: &Value, category_marker: &str) -> Result<Vec<ClassifiedEntry>> {
    let files: &Map<String, Value> = input.as_object().ok_or_else(|| {
        SyncError::Inconsistency("sync input must be a JSON object keyed by file path".into())
    })?;

    files
        .iter()
        .map(|(path, raw)| {
            let entry: FileEntry = serde_json::from_value(raw.clone()).map_err(|e| {
                SyncError::Inconsistency(format!("invalid input entry for {path}: {e}"))
            })?;
            Ok(ClassifiedEntry {
                path: path.clone(),
                kind: classify(path, category_marker),
                entry,
            })
        })
        .collect()
}
