//! In-memory stand-in for the wiki backend.
//!
//! [`FakeWiki`] answers the same routes the real API does, assigns ids, keeps
//! category/article links consistent and records every request, so sync passes
//! can be asserted on end to end without a server.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::contract::Gateway;
use crate::error::{Result, SyncError};
use crate::model::{parse_categories, Category, Payload};

/// One request as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct FakeVersion {
    id: i64,
    content: Payload,
}

#[derive(Debug, Clone)]
struct FakeLocalization {
    id: i64,
    locale: Value,
    seo_url: Value,
    versions: Vec<FakeVersion>,
}

#[derive(Debug, Clone)]
struct FakeEntry {
    raw: Payload,
    localizations: Vec<FakeLocalization>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    categories: Vec<Payload>,
    entries: BTreeMap<i64, FakeEntry>,
    requests: Vec<RecordedRequest>,
    failure: Option<(&'static str, String)>,
}

impl State {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn category_mut(&mut self, id: i64) -> Option<&mut Payload> {
        self.categories
            .iter_mut()
            .find(|c| c.get("id").and_then(Value::as_i64) == Some(id))
    }

    fn version_mut(&mut self, article: i64, locale: i64, version: i64) -> Option<&mut FakeVersion> {
        self.entries
            .get_mut(&article)?
            .localizations
            .iter_mut()
            .find(|l| l.id == locale)?
            .versions
            .iter_mut()
            .find(|v| v.id == version)
    }
}

/// Simulated wiki REST backend.
pub struct FakeWiki {
    state: Mutex<State>,
}

impl Default for FakeWiki {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(method: &'static str, path: &str) -> SyncError {
    SyncError::Http {
        method,
        path: path.to_owned(),
        status: 404,
        body: "not found".into(),
    }
}

fn to_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

impl FakeWiki {
    /// Empty backend; ids are handed out from 1000 upwards.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    /// Backend holding only the root category `root_id`.
    pub fn with_root(root_id: i64) -> Self {
        let wiki = Self::new();
        wiki.state().categories.push(to_payload(json!({
            "id": root_id,
            "parent": null,
            "localizations": [],
            "entryIds": [],
        })));
        wiki
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a category with an English seoUrl of `seo_en`.
    pub fn seed_category(&self, id: i64, parent: Option<i64>, seo_en: &str) {
        self.state().categories.push(to_payload(json!({
            "id": id,
            "parent": parent.map(|p| json!({"id": p})),
            "localizations": [
                {"id": id * 10, "locale": {"name": "de_DE"}, "seoUrl": format!("{seo_en}-de"), "title": seo_en},
                {"id": id * 10 + 1, "locale": {"name": "en_GB"}, "seoUrl": seo_en, "title": seo_en},
            ],
            "entryIds": [],
        })));
    }

    /// Add an active article with one English version, linked to each of `categories`.
    pub fn seed_article(&self, id: i64, categories: &[i64]) {
        let mut state = self.state();
        let locale_id = state.allocate();
        let version_id = state.allocate();
        state.entries.insert(
            id,
            FakeEntry {
                raw: Payload::new(),
                localizations: vec![FakeLocalization {
                    id: locale_id,
                    locale: json!({"name": "en_GB"}),
                    seo_url: json!(format!("seeded-{id}")),
                    versions: vec![FakeVersion {
                        id: version_id,
                        content: to_payload(json!({"id": version_id, "version": "1.0.0", "active": true})),
                    }],
                }],
            },
        );
        for category in categories {
            if let Some(record) = state.category_mut(*category) {
                link_entry(record, id);
            }
        }
    }

    /// Make the next request matching `method` and `path` fail with HTTP 500.
    pub fn fail_on(&self, method: &'static str, path: impl Into<String>) {
        self.state().failure = Some((method, path.into()));
    }

    pub fn categories(&self) -> Vec<Category> {
        let raw = Value::Array(self.state().categories.iter().cloned().map(Value::Object).collect());
        parse_categories(&raw).unwrap_or_default()
    }

    pub fn category_by_path(&self, seo_en: &str) -> Option<Category> {
        self.categories().into_iter().find(|c| c.seo_path() == seo_en)
    }

    pub fn article_ids(&self) -> Vec<i64> {
        self.state().entries.keys().copied().collect()
    }

    /// Stored content of the first version of the article's `locale` localization.
    pub fn version_content(&self, article_id: i64, locale: &str) -> Option<Payload> {
        let state = self.state();
        let entry = state.entries.get(&article_id)?;
        let localization = entry
            .localizations
            .iter()
            .find(|l| l.locale.get("name").and_then(Value::as_str) == Some(locale))?;
        localization.versions.first().map(|v| v.content.clone())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// Number of recorded requests with `method` whose path equals `path`.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn handle(&self, method: &'static str, path: &str, body: Value) -> Result<Value> {
        let mut state = self.state();
        state.requests.push(RecordedRequest {
            method,
            path: path.to_owned(),
            body: body.clone(),
        });

        if state.failure.as_ref().is_some_and(|(m, p)| *m == method && p == path) {
            state.failure = None;
            return Err(SyncError::Http {
                method,
                path: path.to_owned(),
                status: 500,
                body: "injected failure".into(),
            });
        }

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let ids: Vec<Option<i64>> = segments.iter().map(|s| s.parse().ok()).collect();

        match (method, segments.as_slice()) {
            ("GET", ["wiki", "categories"]) => Ok(Value::Array(
                state.categories.iter().cloned().map(Value::Object).collect(),
            )),
            ("POST", ["wiki", "categories"]) => {
                let id = state.allocate();
                let mut record = to_payload(body);
                record.insert("id".into(), json!(id));
                record.insert("entryIds".into(), json!([]));
                state.categories.push(record.clone());
                Ok(Value::Object(record))
            }
            ("PUT", ["wiki", "categories", _]) => {
                let id = ids[2].ok_or_else(|| not_found(method, path))?;
                let record = state.category_mut(id).ok_or_else(|| not_found(method, path))?;
                let entries = record.get("entryIds").cloned().unwrap_or_else(|| json!([]));
                let mut updated = to_payload(body);
                updated.insert("id".into(), json!(id));
                updated.insert("entryIds".into(), entries);
                *record = updated.clone();
                Ok(Value::Object(updated))
            }
            ("DELETE", ["wiki", "categories", _]) => {
                let id = ids[2].ok_or_else(|| not_found(method, path))?;
                let before = state.categories.len();
                state
                    .categories
                    .retain(|c| c.get("id").and_then(Value::as_i64) != Some(id));
                if state.categories.len() == before {
                    return Err(not_found(method, path));
                }
                Ok(Value::Null)
            }
            ("POST", ["wiki", "categories", _, "entries"]) => {
                let id = ids[2].ok_or_else(|| not_found(method, path))?;
                let article = body
                    .get("id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| not_found(method, path))?;
                if !state.entries.contains_key(&article) {
                    return Err(not_found(method, path));
                }
                let record = state.category_mut(id).ok_or_else(|| not_found(method, path))?;
                link_entry(record, article);
                Ok(json!({"id": article}))
            }
            ("POST", ["wiki", "entries"]) => {
                let id = state.allocate();
                state.entries.insert(
                    id,
                    FakeEntry {
                        raw: to_payload(body),
                        localizations: Vec::new(),
                    },
                );
                Ok(json!({"id": id}))
            }
            ("GET", ["wiki", "entries", _]) => {
                let id = ids[2].ok_or_else(|| not_found(method, path))?;
                let entry = state.entries.get(&id).ok_or_else(|| not_found(method, path))?;
                let mut view = entry.raw.clone();
                view.insert("id".into(), json!(id));
                view.insert(
                    "localizations".into(),
                    Value::Array(
                        entry
                            .localizations
                            .iter()
                            .map(|l| {
                                json!({
                                    "id": l.id,
                                    "locale": l.locale,
                                    "seoUrl": l.seo_url,
                                    "versions": l.versions.iter().map(|v| json!({"id": v.id})).collect::<Vec<_>>(),
                                })
                            })
                            .collect(),
                    ),
                );
                Ok(Value::Object(view))
            }
            ("DELETE", ["wiki", "entries", _]) => {
                let id = ids[2].ok_or_else(|| not_found(method, path))?;
                state.entries.remove(&id).ok_or_else(|| not_found(method, path))?;
                for category in state.categories.iter_mut() {
                    if let Some(Value::Array(entries)) = category.get_mut("entryIds") {
                        entries.retain(|e| e.as_i64() != Some(id));
                    }
                }
                Ok(Value::Null)
            }
            ("POST", ["wiki", "entries", _, "localizations"]) => {
                let article = ids[2].ok_or_else(|| not_found(method, path))?;
                let locale_id = state.allocate();
                let entry = state.entries.get_mut(&article).ok_or_else(|| not_found(method, path))?;
                entry.localizations.push(FakeLocalization {
                    id: locale_id,
                    locale: body.get("locale").cloned().unwrap_or(Value::Null),
                    seo_url: body.get("seoUrl").cloned().unwrap_or(Value::Null),
                    versions: Vec::new(),
                });
                Ok(json!({"id": locale_id}))
            }
            ("POST", ["wiki", "entries", _, "localizations", _, "versions"]) => {
                let (article, locale) = (
                    ids[2].ok_or_else(|| not_found(method, path))?,
                    ids[4].ok_or_else(|| not_found(method, path))?,
                );
                let version_id = state.allocate();
                let localization = state
                    .entries
                    .get_mut(&article)
                    .and_then(|e| e.localizations.iter_mut().find(|l| l.id == locale))
                    .ok_or_else(|| not_found(method, path))?;
                let mut content = to_payload(body);
                content.insert("id".into(), json!(version_id));
                localization.versions.push(FakeVersion {
                    id: version_id,
                    content,
                });
                Ok(json!({"id": version_id}))
            }
            ("GET", ["wiki", "entries", _, "localizations", _, "versions", _]) => {
                let version = state
                    .version_mut(
                        ids[2].unwrap_or_default(),
                        ids[4].unwrap_or_default(),
                        ids[6].unwrap_or_default(),
                    )
                    .ok_or_else(|| not_found(method, path))?;
                Ok(Value::Object(version.content.clone()))
            }
            ("PUT", ["wiki", "entries", _, "localizations", _, "versions", _]) => {
                let version = state
                    .version_mut(
                        ids[2].unwrap_or_default(),
                        ids[4].unwrap_or_default(),
                        ids[6].unwrap_or_default(),
                    )
                    .ok_or_else(|| not_found(method, path))?;
                let mut content = to_payload(body);
                content.remove("selectedVersion");
                version.content = content.clone();
                Ok(Value::Object(content))
            }
            ("POST", ["wiki", "entries", _, "localizations", _, "versions", _, "media"]) => {
                let version = state
                    .version_mut(
                        ids[2].unwrap_or_default(),
                        ids[4].unwrap_or_default(),
                        ids[6].unwrap_or_default(),
                    )
                    .ok_or_else(|| not_found(method, path))?;
                let part = body.get("part").and_then(Value::as_str).unwrap_or_default();
                let file_name = part.rsplit('/').next().unwrap_or(part);
                Ok(json!([{"fileLink": format!("https://media.example/{}/{file_name}", version.id)}]))
            }
            _ => Err(not_found(method, path)),
        }
    }
}

fn link_entry(category: &mut Payload, article: i64) {
    let entries = category.entry("entryIds").or_insert_with(|| json!([]));
    if let Value::Array(items) = entries {
        if !items.iter().any(|e| e.as_i64() == Some(article)) {
            items.push(json!(article));
        }
    }
}

#[async_trait]
impl Gateway for FakeWiki {
    async fn get(&self, path: &str) -> Result<Value> {
        self.handle("GET", path, Value::Null)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.handle("POST", path, body)
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.handle("PUT", path, body)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.handle("DELETE", path, Value::Null).map(|_| ())
    }

    async fn post_multipart(&self, path: &str, part_name: &str, bytes: Vec<u8>) -> Result<Value> {
        self.handle("POST", path, json!({"part": part_name, "size": bytes.len()}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_categories_show_up_in_listing() {
        let wiki = FakeWiki::with_root(50);
        let created = wiki
            .post("/wiki/categories", json!({"parent": {"id": 50}, "localizations": []}))
            .await
            .unwrap();
        let listing = wiki.get("/wiki/categories").await.unwrap();
        assert_eq!(listing.as_array().unwrap().len(), 2);
        assert_eq!(listing[1]["id"], created["id"]);
    }

    #[tokio::test]
    async fn deleting_an_article_unlinks_it() {
        let wiki = FakeWiki::with_root(50);
        wiki.seed_category(60, Some(50), "/a");
        wiki.seed_article(7, &[50, 60]);
        assert_eq!(wiki.categories()[1].entry_ids, vec![7]);

        wiki.delete("/wiki/entries/7").await.unwrap();
        assert!(wiki.article_ids().is_empty());
        assert!(wiki.categories().iter().all(|c| c.entry_ids.is_empty()));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let wiki = FakeWiki::new();
        let err = wiki.get("/wiki/nothing").await.unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let wiki = FakeWiki::with_root(50);
        wiki.fail_on("GET", "/wiki/categories");
        assert!(wiki.get("/wiki/categories").await.is_err());
        assert!(wiki.get("/wiki/categories").await.is_ok());
    }
}
