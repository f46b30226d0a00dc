//! Mapping slash-delimited paths onto the remote category tree.
//!
//! - [`resolve_or_create`] walks a path top-down, reusing categories that exist
//!   and creating the ones that don't.
//! - [`collect_subtree`] gathers everything below a category in an order that is
//!   safe to delete.
//! - [`locate_category`] resolves an existing path without creating anything.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::categories;
use crate::contract::Gateway;
use crate::error::{Result, SyncError};
use crate::model::Category;
use crate::path::cumulative_paths;
use crate::snapshot::CategorySnapshot;

/// Return the id of the deepest category for `segments`, creating any missing
/// level under its parent.
///
/// Every created category is inserted into `snapshot`, so passing the same
/// snapshot for a whole pass never creates a path twice. With no segments the
/// root id is returned.
pub async fn resolve_or_create<G: Gateway + ?Sized>(
    gateway: &G,
    root_id: i64,
    segments: &[String],
    snapshot: &mut CategorySnapshot,
) -> Result<i64> {
    let mut current = root_id;
    for path in cumulative_paths(segments) {
        current = match snapshot.lookup(&path) {
            Some(existing) => {
                debug!(category_id = existing, path = %path, "Reusing category");
                existing
            }
            None => {
                let de_seo = format!("{path}-de");
                let created =
                    categories::create_category(gateway, &path, &path, &path, &de_seo, current).await?;
                snapshot.insert(created, path);
                created
            }
        };
    }
    Ok(current)
}

/// Categories and articles below a root category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subtree {
    /// Descendants of the root as `(id, English seoUrl)`, deepest discovered first.
    /// The root itself is not included.
    pub categories: Vec<(i64, String)>,
    /// Articles attached to the root or any descendant, each listed once.
    pub articles: Vec<i64>,
}

impl Subtree {
    pub fn snapshot(&self) -> CategorySnapshot {
        self.categories
            .iter()
            .map(|(id, path)| (*id, path.clone()))
            .collect()
    }
}

/// Breadth-first walk from `root_id` over a full category listing.
pub fn collect_subtree(root_id: i64, all: &[Category]) -> Subtree {
    let mut discovered = Vec::new();
    let mut articles = Vec::new();
    let mut visited = HashSet::from([root_id]);
    let mut queue = VecDeque::from([root_id]);

    while let Some(parent) = queue.pop_front() {
        for category in all.iter().filter(|c| c.parent_id == Some(parent)) {
            if !visited.insert(category.id) {
                warn!(category_id = category.id, "Category reached twice while walking tree, skipping");
                continue;
            }
            discovered.push((category.id, category.seo_path()));
            articles.extend_from_slice(&category.entry_ids);
            queue.push_back(category.id);
        }
    }

    discovered.reverse();

    if let Some(root) = all.iter().find(|c| c.id == root_id) {
        articles.extend_from_slice(&root.entry_ids);
    }

    let mut seen = HashSet::new();
    articles.retain(|id| seen.insert(*id));

    Subtree {
        categories: discovered,
        articles,
    }
}

/// Resolve `segments` against `snapshot` without creating anything.
///
/// Returns `(category_id, parent_id)` of the deepest segment. With no segments
/// this is the root itself, whose parent is not known here, so `parent_id` is
/// `None`. An unknown prefix is an [`SyncError::Inconsistency`].
pub fn locate_category(
    root_id: i64,
    segments: &[String],
    snapshot: &CategorySnapshot,
) -> Result<(i64, Option<i64>)> {
    let mut parent = None;
    let mut current = root_id;
    for path in cumulative_paths(segments) {
        parent = Some(current);
        current = snapshot.lookup(&path).ok_or_else(|| {
            SyncError::Inconsistency(format!("no category exists for path {path}"))
        })?;
    }
    Ok((current, parent))
}

/// Find a category by id in a listing.
pub fn find_category(all: &[Category], id: i64) -> Result<&Category> {
    all.iter()
        .find(|c| c.id == id)
        .ok_or_else(|| SyncError::Inconsistency(format!("category {id} is missing from the listing")))
}
