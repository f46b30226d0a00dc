//! Article lifecycle: creation of bilingual versioned entries, content updates,
//! media upload, and the disable-then-delete teardown.
//!
//! Every content write goes through [`update_article`], which fetches the
//! version's current state and overlays the change on top of it. Writing a bare
//! payload would drop fields the backend manages itself.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::contract::Gateway;
use crate::error::{Result, SyncError};
use crate::model::{self, merge, ArticleHandle, ContentPatch, LocalizedArticle, Payload};

pub const ENTRIES_PATH: &str = "/wiki/entries";

fn entry_path(article_id: i64) -> String {
    format!("{ENTRIES_PATH}/{article_id}")
}

/// Create an article with one localization and one version per language.
pub async fn create_localized_versioned_article<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    seo_en: &str,
    seo_de: &str,
) -> Result<LocalizedArticle> {
    let response = gateway
        .post(ENTRIES_PATH, json!({"product": config.product}))
        .await?;
    let article_id = model::expect_id(&response, "article creation")?;

    let en_locale = json!({"id": config.english_locale_id, "name": "en_GB"});
    let de_locale = json!({"name": "de_DE"});
    let en_gb = create_article_locale(gateway, config, article_id, en_locale, seo_en).await?;
    let de_de = create_article_locale(gateway, config, article_id, de_locale, seo_de).await?;

    info!(article_id, seo = seo_en, "Created bilingual article");
    Ok(LocalizedArticle { en_gb, de_de })
}

async fn create_article_locale<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    article_id: i64,
    locale: Value,
    seo: &str,
) -> Result<ArticleHandle> {
    let localizations = format!("{}/localizations", entry_path(article_id));
    let response = gateway
        .post(&localizations, json!({"locale": locale, "seoUrl": seo}))
        .await?;
    let locale_id = model::expect_id(&response, "article localization creation")?;

    let versions = format!("{localizations}/{locale_id}/versions");
    let response = gateway
        .post(&versions, json!({"version": config.doc_version}))
        .await?;
    let version_id = model::expect_id(&response, "article version creation")?;

    debug!(article_id, locale_id, version_id, "Created article locale and version");
    Ok(ArticleHandle {
        article_id,
        locale_id,
        version_id,
    })
}

/// Current content of one article version.
pub async fn get_version<G: Gateway + ?Sized>(gateway: &G, handle: &ArticleHandle) -> Result<Payload> {
    let body = gateway.get(&handle.version_path()).await?;
    model::expect_object(body, &format!("article version {}", handle.version_path()))
}

/// Merge `payload` onto the version's current content and write it back.
pub async fn update_article<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    handle: &ArticleHandle,
    payload: Payload,
) -> Result<()> {
    let current = get_version(gateway, handle).await?;
    let body = versioned_update(current, handle, &config.doc_version, payload);
    gateway.put(&handle.version_path(), Value::Object(body)).await?;
    debug!(
        article_id = handle.article_id,
        locale_id = handle.locale_id,
        version_id = handle.version_id,
        "Updated article version"
    );
    Ok(())
}

fn versioned_update(current: Payload, handle: &ArticleHandle, doc_version: &str, payload: Payload) -> Payload {
    let mut required = Payload::new();
    required.insert("id".into(), json!(handle.version_id));
    required.insert("version".into(), json!(doc_version));
    required.insert("selectedVersion".into(), Value::Object(current.clone()));
    merge(merge(current, required), payload)
}

/// Upload a local file to the version's media endpoint and return its public link.
pub async fn upload_media<G: Gateway + ?Sized>(
    gateway: &G,
    handle: &ArticleHandle,
    file_path: &Path,
) -> Result<String> {
    let bytes = tokio::fs::read(file_path).await.map_err(|source| SyncError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let endpoint = format!("{}/media", handle.version_path());
    let part_name = file_path.to_string_lossy();
    let response = gateway.post_multipart(&endpoint, &part_name, bytes).await?;

    let link = response
        .get(0)
        .and_then(|media| media.get("fileLink"))
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::protocol("media upload", "response has no `[0].fileLink`"))?;
    info!(file = %file_path.display(), link, "Uploaded media");
    Ok(link.to_owned())
}

/// Replace every occurrence of each placeholder with its link, in order.
pub fn replace_media_placeholders(html: &str, links: &[(String, String)]) -> String {
    links
        .iter()
        .fold(html.to_owned(), |html, (placeholder, link)| html.replace(placeholder.as_str(), link))
}

/// Push the English page content.
pub async fn publish_english<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    handle: &ArticleHandle,
    title: &str,
    html: &str,
) -> Result<()> {
    let patch = ContentPatch::titled(title)
        .content(html)
        .searchable(true)
        .from_product_version(config.initial_product_version.clone())
        .active(true);
    update_article(gateway, config, handle, patch.into_payload()).await
}

/// Write the fixed untranslated placeholder as the German counterpart.
pub async fn insert_german_stub<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    handle: &ArticleHandle,
    title: &str,
) -> Result<()> {
    let patch = ContentPatch::titled(title)
        .content(config.untranslated_notice.clone())
        .searchable(false)
        .from_product_version(config.initial_product_version.clone())
        .active(true);
    update_article(gateway, config, handle, patch.into_payload()).await
}

pub async fn add_article_to_category<G: Gateway + ?Sized>(
    gateway: &G,
    handle: &ArticleHandle,
    category_id: i64,
) -> Result<()> {
    let path = format!("/wiki/categories/{category_id}/entries");
    gateway
        .post(
            &path,
            json!({
                "id": handle.article_id,
                "orderPriority": "",
                "excludeFromSearch": false,
                "categories": [],
            }),
        )
        .await?;
    debug!(article_id = handle.article_id, category_id, "Attached article to category");
    Ok(())
}

/// Set `active=false` on every version of every localization of an article.
///
/// Articles without localizations, and localizations without versions, are
/// already clean and are skipped. Returns the number of versions disabled.
pub async fn disable_article<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    article_id: i64,
) -> Result<usize> {
    let article = gateway.get(&entry_path(article_id)).await?;
    let context = format!("article {article_id}");

    let localizations = match article.get("localizations") {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SyncError::protocol(context, "`localizations` is not an array")),
    };

    let mut disabled = 0;
    for localization in localizations {
        let locale_id = model::expect_id(localization, &context)?;
        let versions = match localization.get("versions") {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(SyncError::protocol(
                    &context,
                    format!("`versions` of localization {locale_id} is not an array"),
                ));
            }
        };
        for version in versions {
            let handle = ArticleHandle {
                article_id,
                locale_id,
                version_id: model::expect_id(version, &context)?,
            };
            update_article(gateway, config, &handle, ContentPatch::default().active(false).into_payload())
                .await?;
            disabled += 1;
        }
    }

    if disabled == 0 {
        warn!(article_id, "Article had no versions to disable");
    }
    Ok(disabled)
}

/// Delete an article. Call [`disable_article`] first.
pub async fn delete_article<G: Gateway + ?Sized>(gateway: &G, article_id: i64) -> Result<()> {
    gateway.delete(&entry_path(article_id)).await?;
    info!(article_id, "Deleted article");
    Ok(())
}

/// Disable and then delete every article in `article_ids`, in order.
pub async fn retire_articles<G: Gateway + ?Sized>(
    gateway: &G,
    config: &SyncConfig,
    article_ids: &[i64],
) -> Result<()> {
    info!(count = article_ids.len(), "Deleting old articles");
    for &article_id in article_ids {
        disable_article(gateway, config, article_id).await?;
        delete_article(gateway, article_id).await?;
    }
    Ok(())
}
