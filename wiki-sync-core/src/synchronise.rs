//! High-level pipeline: reconciles the generated documentation with the wiki.
//!
//! A pass runs through fixed phases, strictly one request at a time:
//!   - [`SyncPhase::Cleanup`]: snapshot the categories below the root, then
//!     disable and delete every article attached anywhere in that subtree
//!   - [`SyncPhase::ArticleSync`]: create one bilingual article per page,
//!     resolving (or creating) its category chain against the snapshot
//!   - [`SyncPhase::CategorySync`]: re-read the categories (including the ones
//!     created above) and write the category-level pages into them
//!   - [`SyncPhase::Done`]
//!
//! # Error Handling
//! The first failing request aborts the pass; nothing is rolled back. Re-running
//! reuses existing categories by path, but articles are always created anew, so
//! a pass that failed after creating articles leaves them behind until the next
//! successful cleanup.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Standalone teardown: [`prune`]

use std::fmt;
use std::path::Path;

use tracing::{error, info, info_span, Instrument};

use crate::articles;
use crate::categories;
use crate::config::SyncConfig;
use crate::contract::Gateway;
use crate::error::Result;
use crate::model::{Category, ContentPatch, FileEntry, LocalizedArticle};
use crate::path::{category_segments, ClassifiedEntry, EntryKind};
use crate::snapshot::CategorySnapshot;
use crate::tree::{self, collect_subtree};

/// Phases of a sync pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Cleanup,
    ArticleSync,
    CategorySync,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Cleanup => "cleanup",
            SyncPhase::ArticleSync => "article_sync",
            SyncPhase::CategorySync => "category_sync",
            SyncPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a pass changed on the wiki.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub deleted_articles: Vec<i64>,
    pub created_categories: usize,
    pub articles: Vec<ArticleReport>,
    pub category_pages: Vec<CategoryPageReport>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleReport {
    pub path: String,
    pub article_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPageReport {
    pub path: String,
    pub category_id: i64,
    /// `None` for a page describing the root, which keeps its own parent.
    pub parent_id: Option<i64>,
}

/// What [`prune`] removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PruneReport {
    pub deleted_articles: Vec<i64>,
    pub deleted_categories: Vec<i64>,
}

fn enter(phase: SyncPhase) {
    info!(%phase, "[SYNC] Entering phase");
}

/// Run a full reconciliation pass for `entries` against the wiki behind `gateway`.
pub async fn synchronise<G>(
    gateway: &G,
    config: &SyncConfig,
    entries: &[ClassifiedEntry],
) -> Result<SyncReport>
where
    G: Gateway + ?Sized,
{
    let span = info_span!("synchronise", root = config.root_category_id, files = entries.len());
    run_pass(gateway, config, entries)
        .instrument(span)
        .await
        .inspect_err(|e| error!(error = %e, "[SYNC][ERROR] Pass aborted"))
}

async fn run_pass<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    entries: &[ClassifiedEntry],
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    enter(SyncPhase::Cleanup);
    let subtree = collect_subtree(
        config.root_category_id,
        &categories::list_categories(gateway).await?,
    );
    let mut snapshot = subtree.snapshot();
    articles::retire_articles(gateway, config, &subtree.articles).await?;
    report.deleted_articles = subtree.articles;

    enter(SyncPhase::ArticleSync);
    let known_before = snapshot.len();
    let total = entries.len();
    for (index, item) in entries.iter().enumerate() {
        match item.kind {
            EntryKind::CategoryPage => continue,
            EntryKind::Skipped => {
                info!(path = %item.path, "[SYNC] Skipping internal file");
                report.skipped.push(item.path.clone());
            }
            EntryKind::Article => {
                info!(path = %item.path, index, total, "[SYNC] Syncing file");
                let (article, category_id) =
                    sync_article(gateway, config, &item.path, &item.entry, &mut snapshot).await?;
                report.articles.push(ArticleReport {
                    path: item.path.clone(),
                    article_id: article.article_id(),
                    category_id,
                });
            }
        }
    }
    report.created_categories = snapshot.len() - known_before;

    enter(SyncPhase::CategorySync);
    let pages: Vec<&ClassifiedEntry> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::CategoryPage)
        .collect();
    if !pages.is_empty() {
        let current = categories::list_categories(gateway).await?;
        let fresh = collect_subtree(config.root_category_id, &current).snapshot();
        for page in pages {
            report
                .category_pages
                .push(sync_category_page(gateway, config, page, &fresh, &current).await?);
        }
    }

    enter(SyncPhase::Done);
    info!(
        deleted = report.deleted_articles.len(),
        articles = report.articles.len(),
        categories_created = report.created_categories,
        category_pages = report.category_pages.len(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}

async fn sync_article<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    path: &str,
    entry: &FileEntry,
    snapshot: &mut CategorySnapshot,
) -> Result<(LocalizedArticle, i64)> {
    let article =
        articles::create_localized_versioned_article(gateway, config, path, &format!("{path}-de"))
            .await?;
    let category_id = tree::resolve_or_create(
        gateway,
        config.root_category_id,
        &category_segments(path),
        snapshot,
    )
    .await?;
    articles::add_article_to_category(gateway, &article.en_gb, category_id).await?;

    let mut links = Vec::with_capacity(entry.metadata.media.len());
    for (placeholder, file) in &entry.metadata.media {
        let link = articles::upload_media(gateway, &article.en_gb, Path::new(file)).await?;
        links.push((placeholder.clone(), link));
    }
    let html = articles::replace_media_placeholders(&entry.content, &links);

    articles::publish_english(gateway, config, &article.en_gb, &entry.metadata.title_en, &html)
        .await?;
    articles::insert_german_stub(gateway, config, &article.de_de, &entry.metadata.title_de).await?;
    Ok((article, category_id))
}

async fn sync_category_page<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    page: &ClassifiedEntry,
    snapshot: &CategorySnapshot,
    current: &[Category],
) -> Result<CategoryPageReport> {
    let (category_id, parent_id) = tree::locate_category(
        config.root_category_id,
        &category_segments(&page.path),
        snapshot,
    )?;
    let old = tree::find_category(current, category_id)?;
    let metadata = &page.entry.metadata;

    let en = ContentPatch::titled(&metadata.title_en)
        .content(page.entry.content.clone())
        .searchable(true);
    let de = ContentPatch::titled(&metadata.title_de)
        .content(config.untranslated_notice.clone())
        .searchable(false);

    info!(path = %page.path, category_id, "[SYNC] Updating category page");
    categories::update_category(
        gateway,
        category_id,
        parent_id,
        old,
        Default::default(),
        en.into_payload(),
        de.into_payload(),
    )
    .await?;

    Ok(CategoryPageReport {
        path: page.path.clone(),
        category_id,
        parent_id,
    })
}

/// Delete everything below `root_id`: all attached articles (disabled first),
/// then every descendant category, deepest first. `root_id` itself stays.
pub async fn prune<G>(gateway: &G, config: &SyncConfig, root_id: i64) -> Result<PruneReport>
where
    G: Gateway + ?Sized,
{
    info!(root_id, "[PRUNE] Collecting category subtree");
    let subtree = collect_subtree(root_id, &categories::list_categories(gateway).await?);

    articles::retire_articles(gateway, config, &subtree.articles).await?;
    for (category_id, path) in &subtree.categories {
        info!(category_id, path = %path, "[PRUNE] Deleting category");
        categories::delete_category(gateway, *category_id).await?;
    }

    Ok(PruneReport {
        deleted_articles: subtree.articles,
        deleted_categories: subtree.categories.into_iter().map(|(id, _)| id).collect(),
    })
}
