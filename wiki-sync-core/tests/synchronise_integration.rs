use serde_json::{json, Value};

use wiki_sync_core::config::{SyncConfig, UNTRANSLATED_NOTICE_DE};
use wiki_sync_core::path::{ingest, ClassifiedEntry};
use wiki_sync_core::synchronise::{prune, synchronise};
use wiki_sync_core::test_support::FakeWiki;
use wiki_sync_core::SyncError;

fn entries(input: Value) -> Vec<ClassifiedEntry> {
    ingest(&input, &SyncConfig::default().category_marker).expect("input should classify")
}

fn page(title_en: &str, title_de: &str, content: &str) -> Value {
    json!({"metadata": {"titleEn": title_en, "titleDe": title_de}, "content": content})
}

#[tokio::test]
async fn single_page_creates_category_and_bilingual_article() {
    let wiki = FakeWiki::with_root(50);
    let config = SyncConfig::default();
    let input = entries(json!({"guide/intro": page("Intro", "Einführung", "<p>hi</p>")}));

    let report = synchronise(&wiki, &config, &input).await.expect("sync should succeed");

    let guide = wiki.category_by_path("/guide").expect("category /guide should exist");
    assert_eq!(guide.parent_id, Some(50));
    assert_eq!(wiki.categories().len(), 2, "root plus /guide only");
    assert_eq!(report.created_categories, 1);

    let articles = wiki.article_ids();
    assert_eq!(articles.len(), 1);
    let article = articles[0];
    assert_eq!(guide.entry_ids, vec![article]);
    assert_eq!(report.articles.len(), 1);
    assert_eq!(report.articles[0].article_id, article);
    assert_eq!(report.articles[0].category_id, guide.id);

    let en = wiki.version_content(article, "en_GB").expect("english version");
    assert_eq!(en["content"], "<p>hi</p>");
    assert_eq!(en["title"], "Intro");
    assert_eq!(en["navigationTitle"], "Intro");
    assert_eq!(en["searchableInAllLanguages"], true);
    assert_eq!(en["fromProductVersion"], "6.0.0");
    assert_eq!(en["version"], "1.0.0");
    assert_eq!(en["active"], true);

    let de = wiki.version_content(article, "de_DE").expect("german version");
    assert_eq!(de["content"], UNTRANSLATED_NOTICE_DE);
    assert_eq!(de["title"], "Einführung");
    assert_eq!(de["searchableInAllLanguages"], false);
}

#[tokio::test]
async fn underscore_paths_are_skipped_entirely() {
    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({"drafts/my_page": page("Draft", "Entwurf", "<p>wip</p>")}));

    let report = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap();

    assert_eq!(report.skipped, vec!["drafts/my_page".to_string()]);
    assert!(wiki.article_ids().is_empty());
    assert_eq!(wiki.categories().len(), 1);
    assert_eq!(wiki.count("POST", "/wiki/entries"), 0);
    assert_eq!(wiki.count("POST", "/wiki/categories"), 0);
}

#[tokio::test]
async fn pages_in_the_same_directory_share_one_category() {
    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({
        "guide/a": page("A", "A", "<p>a</p>"),
        "guide/b": page("B", "B", "<p>b</p>"),
        "guide/deep/c": page("C", "C", "<p>c</p>"),
    }));

    let report = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap();

    assert_eq!(wiki.count("POST", "/wiki/categories"), 2);
    assert_eq!(report.created_categories, 2);
    let guide = wiki.category_by_path("/guide").unwrap();
    let deep = wiki.category_by_path("/guide/deep").unwrap();
    assert_eq!(deep.parent_id, Some(guide.id));
    assert_eq!(guide.entry_ids.len(), 2);
    assert_eq!(deep.entry_ids.len(), 1);
}

#[tokio::test]
async fn cleanup_disables_then_deletes_every_old_article() {
    let wiki = FakeWiki::with_root(50);
    wiki.seed_category(60, Some(50), "/guide");
    wiki.seed_category(61, Some(60), "/guide/deep");
    wiki.seed_article(1, &[50]);
    wiki.seed_article(2, &[61, 60]);

    let report = synchronise(&wiki, &SyncConfig::default(), &[]).await.unwrap();

    let mut deleted = report.deleted_articles.clone();
    deleted.sort();
    assert_eq!(deleted, vec![1, 2]);
    assert!(wiki.article_ids().is_empty());
    assert_eq!(wiki.categories().len(), 3, "categories survive a sync pass");

    let requests = wiki.requests();
    for article in [1, 2] {
        let delete_at = requests
            .iter()
            .position(|r| r.method == "DELETE" && r.path == format!("/wiki/entries/{article}"))
            .expect("article should be deleted");
        let disable_at = requests
            .iter()
            .position(|r| {
                r.method == "PUT"
                    && r.path.starts_with(&format!("/wiki/entries/{article}/"))
                    && r.body["active"] == false
            })
            .expect("article should be disabled");
        assert!(disable_at < delete_at, "article {article} must be disabled before deletion");
    }
    assert_eq!(wiki.count("DELETE", "/wiki/entries/2"), 1, "shared article deleted once");
}

#[tokio::test]
async fn existing_categories_are_reused_across_runs() {
    let wiki = FakeWiki::with_root(50);
    let config = SyncConfig::default();
    let input = entries(json!({"guide/intro": page("Intro", "Einführung", "<p>hi</p>")}));

    let first = synchronise(&wiki, &config, &input).await.unwrap();
    let second = synchronise(&wiki, &config, &input).await.unwrap();

    assert_eq!(wiki.count("POST", "/wiki/categories"), 1);
    assert_eq!(second.created_categories, 0);
    assert_eq!(second.deleted_articles, vec![first.articles[0].article_id]);
    assert_ne!(first.articles[0].article_id, second.articles[0].article_id);
    assert_eq!(wiki.article_ids(), vec![second.articles[0].article_id]);
}

#[tokio::test]
async fn category_pages_update_the_matching_category() {
    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({
        "guide/__categoryInfo": page("Guide", "Anleitung", "<p>about the guide</p>"),
        "guide/intro": page("Intro", "Einführung", "<p>hi</p>"),
    }));

    let report = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap();

    let guide = wiki.category_by_path("/guide").unwrap();
    assert_eq!(report.category_pages.len(), 1);
    assert_eq!(report.category_pages[0].category_id, guide.id);
    assert_eq!(report.category_pages[0].parent_id, Some(50));
    assert_eq!(guide.parent_id, Some(50));

    let en = guide.localization(wiki_sync_core::model::Locale::EnGb).unwrap();
    assert_eq!(en.raw["title"], "Guide");
    assert_eq!(en.raw["content"], "<p>about the guide</p>");
    assert_eq!(en.raw["seoUrl"], "/guide", "untouched fields survive the update");
    let de = guide.localization(wiki_sync_core::model::Locale::DeDe).unwrap();
    assert_eq!(de.raw["title"], "Anleitung");
    assert_eq!(de.raw["content"], UNTRANSLATED_NOTICE_DE);
    assert_eq!(de.raw["searchableInAllLanguages"], false);
    assert_eq!(guide.entry_ids.len(), 1, "article link untouched by the update");
}

#[tokio::test]
async fn top_level_category_page_keeps_the_root_a_root() {
    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({
        "__categoryInfo": page("Docs", "Doku", "<p>welcome</p>"),
    }));

    let report = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap();

    assert_eq!(report.category_pages[0].category_id, 50);
    assert_eq!(report.category_pages[0].parent_id, None);
    let root = wiki.categories().into_iter().find(|c| c.id == 50).unwrap();
    assert_eq!(root.parent_id, None, "root must not become its own parent");
    let en = root.localization(wiki_sync_core::model::Locale::EnGb).unwrap();
    assert_eq!(en.raw["title"], "Docs");
}

#[tokio::test]
async fn category_page_without_category_fails_loudly() {
    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({
        "orphan/__categoryInfo": page("Orphan", "Waise", "<p>nothing here</p>"),
    }));

    let err = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap_err();
    assert!(matches!(err, SyncError::Inconsistency(_)), "got {err:?}");
}

#[tokio::test]
async fn media_placeholders_are_replaced_with_uploaded_links() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("diagram.png");
    std::fs::write(&image, b"\x89PNG").unwrap();

    let wiki = FakeWiki::with_root(50);
    let input = entries(json!({
        "guide/media": {
            "metadata": {
                "titleEn": "Media",
                "titleDe": "Medien",
                "media": {"__DIAGRAM__": image.to_string_lossy()}
            },
            "content": "<img src=\"__DIAGRAM__\"><a href=\"__DIAGRAM__\">full size</a>"
        }
    }));

    let report = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap();
    let article = report.articles[0].article_id;
    let en = wiki.version_content(article, "en_GB").unwrap();
    let html = en["content"].as_str().unwrap();

    assert!(!html.contains("__DIAGRAM__"));
    assert_eq!(html.matches("https://media.example/").count(), 2);
    assert!(html.contains("/diagram.png"));
}

#[tokio::test]
async fn http_failure_aborts_the_pass() {
    let wiki = FakeWiki::with_root(50);
    wiki.fail_on("POST", "/wiki/entries");
    let input = entries(json!({
        "guide/__categoryInfo": page("Guide", "Anleitung", "<p>g</p>"),
        "guide/intro": page("Intro", "Einführung", "<p>hi</p>"),
    }));

    let err = synchronise(&wiki, &SyncConfig::default(), &input).await.unwrap_err();

    assert!(matches!(err, SyncError::Http { status: 500, .. }));
    assert_eq!(wiki.count("POST", "/wiki/categories"), 0);
    assert!(wiki.requests().iter().all(|r| !r.path.starts_with("/wiki/categories/")));
}

#[tokio::test]
async fn prune_removes_descendants_deepest_first_and_keeps_root() {
    let wiki = FakeWiki::with_root(50);
    wiki.seed_category(60, Some(50), "/a");
    wiki.seed_category(61, Some(60), "/a/b");
    wiki.seed_category(62, Some(61), "/a/b/c");
    wiki.seed_article(1, &[50]);
    wiki.seed_article(2, &[62]);

    let report = prune(&wiki, &SyncConfig::default(), 50).await.unwrap();

    assert_eq!(report.deleted_categories, vec![62, 61, 60]);
    let mut articles = report.deleted_articles.clone();
    articles.sort();
    assert_eq!(articles, vec![1, 2]);
    let remaining: Vec<_> = wiki.categories().iter().map(|c| c.id).collect();
    assert_eq!(remaining, vec![50]);
    assert!(wiki.article_ids().is_empty());
}
