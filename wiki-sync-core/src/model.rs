//! Typed views over the wiki's JSON records, plus the merge rule every update uses.
//!
//! The backend owns many fields we never look at. Records therefore keep their
//! full raw object next to the handful of typed fields the sync logic reads, and
//! updates are always built as `merge(what the server sent, what we change)`.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};

/// A JSON object as sent to or received from the backend.
pub type Payload = Map<String, Value>;

/// Overlay `overrides` onto `base`.
///
/// Keys only in `base` survive untouched, keys in `overrides` always win, and
/// keys new to `base` are appended in the order `overrides` lists them.
pub fn merge(mut base: Payload, overrides: Payload) -> Payload {
    for (key, value) in overrides {
        base.insert(key, value);
    }
    base
}

/// Require `value` to be a JSON object.
pub fn expect_object(value: Value, context: &str) -> Result<Payload> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::protocol(
            context,
            format!("expected a JSON object, got {}", kind_of(&other)),
        )),
    }
}

/// Read the integer `id` field of a response object.
pub fn expect_id(value: &Value, context: &str) -> Result<i64> {
    value
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| SyncError::protocol(context, "missing integer field `id`"))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The two languages the wiki carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    EnGb,
    DeDe,
}

impl Locale {
    pub fn name(self) -> &'static str {
        match self {
            Locale::EnGb => "en_GB",
            Locale::DeDe => "de_DE",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One localization record of a category.
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    pub locale: Option<String>,
    pub seo_url: Option<String>,
    pub raw: Payload,
}

impl Localization {
    fn from_value(value: &Value, context: &str) -> Result<Self> {
        let raw = expect_object(value.clone(), context)?;
        let locale = raw
            .get("locale")
            .and_then(|locale| locale.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let seo_url = raw.get("seoUrl").and_then(Value::as_str).map(str::to_owned);
        Ok(Self {
            locale,
            seo_url,
            raw,
        })
    }

    pub fn is(&self, locale: Locale) -> bool {
        self.locale.as_deref() == Some(locale.name())
    }
}

/// A wiki category as listed by `GET /wiki/categories`.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub localizations: Vec<Localization>,
    pub entry_ids: Vec<i64>,
    /// The full record, needed to write it back without losing fields.
    pub raw: Payload,
}

impl Category {
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = expect_id(value, "category")?;
        let context = format!("category {id}");
        let raw = expect_object(value.clone(), &context)?;

        let parent_id = match raw.get("parent") {
            None | Some(Value::Null) => None,
            Some(parent) => Some(expect_id(parent, &format!("parent of {context}"))?),
        };

        let localizations = match raw.get("localizations") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| Localization::from_value(item, &context))
                .collect::<Result<_>>()?,
            Some(_) => {
                return Err(SyncError::protocol(context, "`localizations` is not an array"));
            }
        };

        let entry_ids = match raw.get("entryIds") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_i64().ok_or_else(|| {
                        SyncError::protocol(&context, format!("entry id {item} is not an integer"))
                    })
                })
                .collect::<Result<_>>()?,
            Some(_) => return Err(SyncError::protocol(context, "`entryIds` is not an array")),
        };

        Ok(Self {
            id,
            parent_id,
            localizations,
            entry_ids,
            raw,
        })
    }

    pub fn localization(&self, locale: Locale) -> Option<&Localization> {
        self.localizations.iter().find(|l| l.is(locale))
    }

    /// The English `seoUrl`, which doubles as the category's logical path.
    pub fn seo_path(&self) -> String {
        self.localization(Locale::EnGb)
            .and_then(|l| l.seo_url.clone())
            .unwrap_or_default()
    }
}

/// Parse the body of `GET /wiki/categories`.
pub fn parse_categories(value: &Value) -> Result<Vec<Category>> {
    match value {
        Value::Array(items) => items.iter().map(Category::from_value).collect(),
        other => Err(SyncError::protocol(
            "category list",
            format!("expected an array, got {}", kind_of(other)),
        )),
    }
}

/// Addresses one version of one localization of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleHandle {
    pub article_id: i64,
    pub locale_id: i64,
    pub version_id: i64,
}

impl ArticleHandle {
    pub fn version_path(&self) -> String {
        format!(
            "/wiki/entries/{}/localizations/{}/versions/{}",
            self.article_id, self.locale_id, self.version_id
        )
    }
}

/// Handles for both languages of a freshly created article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedArticle {
    pub en_gb: ArticleHandle,
    pub de_de: ArticleHandle,
}

impl LocalizedArticle {
    pub fn article_id(&self) -> i64 {
        self.en_gb.article_id
    }
}

/// Localized content fields written to an article version or category localization.
///
/// Unset fields are left out of the payload, so merging keeps whatever the
/// server already had for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub navigation_title: Option<String>,
    pub content: Option<String>,
    pub searchable_in_all_languages: Option<bool>,
    pub from_product_version: Option<String>,
    pub active: Option<bool>,
}

impl ContentPatch {
    /// Patch with both `title` and `navigationTitle` set to `title`.
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_owned()),
            navigation_title: Some(title.to_owned()),
            ..Self::default()
        }
    }

    pub fn content(mut self, html: impl Into<String>) -> Self {
        self.content = Some(html.into());
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable_in_all_languages = Some(searchable);
        self
    }

    pub fn from_product_version(mut self, version: impl Into<String>) -> Self {
        self.from_product_version = Some(version.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn into_payload(self) -> Payload {
        let mut payload = Payload::new();
        if let Some(content) = self.content {
            payload.insert("content".into(), Value::String(content));
        }
        if let Some(title) = self.title {
            payload.insert("title".into(), Value::String(title));
        }
        if let Some(title) = self.navigation_title {
            payload.insert("navigationTitle".into(), Value::String(title));
        }
        if let Some(searchable) = self.searchable_in_all_languages {
            payload.insert("searchableInAllLanguages".into(), Value::Bool(searchable));
        }
        if let Some(version) = self.from_product_version {
            payload.insert("fromProductVersion".into(), Value::String(version));
        }
        if let Some(active) = self.active {
            payload.insert("active".into(), Value::Bool(active));
        }
        payload
    }
}

/// One generated page as handed over on the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileEntry {
    pub metadata: FileMetadata,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub title_en: String,
    pub title_de: String,
    /// Placeholder in the HTML → local file to upload, in input order.
    #[serde(default, deserialize_with = "media_pairs")]
    pub media: Vec<(String, String)>,
}

/// Accepts `{placeholder: path, ...}`, and also `[]` which generators emit for
/// an empty mapping.
fn media_pairs<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MediaVisitor;

    impl<'de> Visitor<'de> for MediaVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of placeholder to file path")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut pairs = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                pairs.push((key, value));
            }
            Ok(pairs)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            match seq.next_element::<Value>()? {
                None => Ok(Vec::new()),
                Some(_) => Err(de::Error::custom("media list must be empty or a map")),
            }
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(MediaVisitor)
}
