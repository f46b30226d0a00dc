//! Category endpoints: listing, creation, deletion and the merge-preserving update.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::contract::Gateway;
use crate::error::Result;
use crate::model::{self, merge, parse_categories, Category, Locale, Payload};

pub const CATEGORIES_PATH: &str = "/wiki/categories";

fn category_path(id: i64) -> String {
    format!("{CATEGORIES_PATH}/{id}")
}

/// Fetch every category the backend knows.
pub async fn list_categories<G: Gateway + ?Sized>(gateway: &G) -> Result<Vec<Category>> {
    let body = gateway.get(CATEGORIES_PATH).await?;
    let categories = parse_categories(&body)?;
    info!(count = categories.len(), "Fetched category snapshot");
    Ok(categories)
}

fn new_localization(locale: Locale, title: &str, seo_url: &str) -> Value {
    json!({
        "id": null,
        "locale": {"name": locale.name()},
        "title": title,
        "navigationTitle": title,
        "seoUrl": seo_url,
        "content": "",
        "metaTitle": "",
        "metaDescription": "",
        "media": null,
        "searchableInAllLanguages": false,
    })
}

/// Create an empty bilingual category under `parent_id` and return its id.
pub async fn create_category<G: Gateway + ?Sized>(
    gateway: &G,
    title_en: &str,
    seo_en: &str,
    title_de: &str,
    seo_de: &str,
    parent_id: i64,
) -> Result<i64> {
    let body = json!({
        "id": null,
        "orderPriority": null,
        "active": null,
        "parent": {"id": parent_id},
        "localizations": [
            new_localization(Locale::DeDe, title_de, seo_de),
            new_localization(Locale::EnGb, title_en, seo_en),
        ],
    });
    let response = gateway.post(CATEGORIES_PATH, body).await?;
    let id = model::expect_id(&response, "category creation")?;
    info!(category_id = id, parent_id, seo = seo_en, "Created category");
    Ok(id)
}

pub async fn delete_category<G: Gateway + ?Sized>(gateway: &G, category_id: i64) -> Result<()> {
    gateway.delete(&category_path(category_id)).await?;
    info!(category_id, "Deleted category");
    Ok(())
}

/// Write new localized content into an existing category.
///
/// Each language payload is merged onto the category's current record for that
/// language, the whole category is rebuilt around them with `parent_id` as its
/// parent, and `global` is applied last. With `parent_id` of `None` the
/// category keeps the parent it already has.
pub async fn update_category<G: Gateway + ?Sized>(
    gateway: &G,
    category_id: i64,
    parent_id: Option<i64>,
    old: &Category,
    global: Payload,
    en: Payload,
    de: Payload,
) -> Result<()> {
    let body = build_category_update(category_id, parent_id, old, global, en, de);
    debug!(category_id, body = %body, "Category update payload");
    gateway.put(&category_path(category_id), body).await?;
    info!(category_id, ?parent_id, "Updated category content");
    Ok(())
}

fn build_category_update(
    category_id: i64,
    parent_id: Option<i64>,
    old: &Category,
    global: Payload,
    en: Payload,
    de: Payload,
) -> Value {
    let existing = |locale| {
        old.localization(locale)
            .map(|l| l.raw.clone())
            .unwrap_or_default()
    };
    let de = merge(existing(Locale::DeDe), de);
    let en = merge(existing(Locale::EnGb), en);

    let mut rebuilt = Payload::new();
    rebuilt.insert("id".into(), json!(category_id));
    if let Some(parent_id) = parent_id {
        rebuilt.insert("parent".into(), json!({"id": parent_id}));
    }
    rebuilt.insert(
        "localizations".into(),
        Value::Array(vec![Value::Object(de), Value::Object(en)]),
    );

    Value::Object(merge(merge(old.raw.clone(), rebuilt), global))
}
