use std::collections::{BTreeMap, HashMap};

/// In-memory picture of the remote categories for the duration of one pass.
///
/// Maps category id to its logical path and keeps the inverse index current, so
/// a category created earlier in the pass is found by every later lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySnapshot {
    by_id: BTreeMap<i64, String>,
    by_path: HashMap<String, i64>,
}

impl CategorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` under `path`. A later insert for the same path takes over the lookup.
    pub fn insert(&mut self, id: i64, path: impl Into<String>) {
        let path = path.into();
        if let Some(previous) = self.by_id.insert(id, path.clone()) {
            if self.by_path.get(&previous) == Some(&id) {
                self.by_path.remove(&previous);
            }
        }
        self.by_path.insert(path, id);
    }

    pub fn lookup(&self, path: &str) -> Option<i64> {
        self.by_path.get(path).copied()
    }

    pub fn path_of(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.by_id.iter().map(|(id, path)| (*id, path.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for CategorySnapshot {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (id, path) in iter {
            snapshot.insert(id, path);
        }
        snapshot
    }
}
