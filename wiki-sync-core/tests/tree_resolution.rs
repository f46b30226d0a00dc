use wiki_sync_core::path::category_segments;
use wiki_sync_core::snapshot::CategorySnapshot;
use wiki_sync_core::test_support::FakeWiki;
use wiki_sync_core::tree::resolve_or_create;

#[tokio::test]
async fn resolving_twice_creates_nothing_the_second_time() {
    let wiki = FakeWiki::with_root(50);
    let mut snapshot = CategorySnapshot::new();
    let segments = category_segments("a/b/page");

    let first = resolve_or_create(&wiki, 50, &segments, &mut snapshot).await.unwrap();
    let second = resolve_or_create(&wiki, 50, &segments, &mut snapshot).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(wiki.count("POST", "/wiki/categories"), 2);
    assert_eq!(snapshot.lookup("/a/b"), Some(first));
}

#[tokio::test]
async fn one_category_per_missing_segment() {
    let wiki = FakeWiki::with_root(50);
    let mut snapshot = CategorySnapshot::new();

    let deepest = resolve_or_create(&wiki, 50, &category_segments("x/y/z/page"), &mut snapshot)
        .await
        .unwrap();

    assert_eq!(wiki.count("POST", "/wiki/categories"), 3);
    let x = wiki.category_by_path("/x").unwrap();
    let y = wiki.category_by_path("/x/y").unwrap();
    let z = wiki.category_by_path("/x/y/z").unwrap();
    assert_eq!(x.parent_id, Some(50));
    assert_eq!(y.parent_id, Some(x.id));
    assert_eq!(z.parent_id, Some(y.id));
    assert_eq!(z.id, deepest);
}

#[tokio::test]
async fn existing_chain_is_reused_without_requests() {
    let wiki = FakeWiki::with_root(50);
    wiki.seed_category(60, Some(50), "/a");
    wiki.seed_category(61, Some(60), "/a/b");
    let mut snapshot: CategorySnapshot = [(60, "/a"), (61, "/a/b")].into_iter().collect();

    let id = resolve_or_create(&wiki, 50, &category_segments("a/b/page"), &mut snapshot)
        .await
        .unwrap();

    assert_eq!(id, 61);
    assert!(wiki.requests().is_empty());
}

#[tokio::test]
async fn partially_existing_chain_only_creates_the_tail() {
    let wiki = FakeWiki::with_root(50);
    wiki.seed_category(60, Some(50), "/a");
    let mut snapshot: CategorySnapshot = [(60, "/a")].into_iter().collect();

    let id = resolve_or_create(&wiki, 50, &category_segments("a/b/page"), &mut snapshot)
        .await
        .unwrap();

    assert_eq!(wiki.count("POST", "/wiki/categories"), 1);
    let created = wiki.category_by_path("/a/b").unwrap();
    assert_eq!(created.id, id);
    assert_eq!(created.parent_id, Some(60));
}

#[tokio::test]
async fn page_at_the_top_level_lands_in_the_root() {
    let wiki = FakeWiki::with_root(50);
    let mut snapshot = CategorySnapshot::new();
    let id = resolve_or_create(&wiki, 50, &category_segments("index"), &mut snapshot)
        .await
        .unwrap();
    assert_eq!(id, 50);
    assert!(wiki.requests().is_empty());
}
