mod support;

use lectern::application::books::BookError;
use lectern::application::recommendations::{
    RecommendationConfig, RecommendationError, RecommendationService, RefreshOutcome,
    SnapshotSource,
};
use lectern::cache::{CacheKey, CacheStore};
use lectern::domain::books::BookDraft;
use lectern::domain::error::DomainError;
use std::sync::Arc;
use support::{Harness, UnavailableCache};
use time::Duration;

fn draft(title: &str) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: "Ursula K. Le Guin".to_string(),
        genre: "Science Fiction".to_string(),
        description: Some("An anarchist moon and its sibling planet.".to_string()),
        image_url: "https://img.example/dispossessed.jpg".to_string(),
    }
}

#[tokio::test]
async fn rating_sets_user_entry_and_recomputes_mean() {
    let harness = Harness::new();
    let book = harness
        .book_service
        .create_book(draft("The Dispossessed"))
        .await
        .expect("create book");

    harness
        .book_service
        .rate_book(book.id, "alice", 8.0)
        .await
        .expect("first rating");
    let rated = harness
        .book_service
        .rate_book(book.id, "bob", 6.0)
        .await
        .expect("second rating");

    assert_eq!(rated.user_ratings.get("bob"), Some(&6.0));
    assert_eq!(rated.total_ratings, 2);
    assert!((rated.average_rating - 7.0).abs() < f64::EPSILON);

    let rerated = harness
        .book_service
        .rate_book(book.id, "alice", 10.0)
        .await
        .expect("re-rating replaces the earlier value");
    assert_eq!(rerated.total_ratings, 2);
    assert!((rerated.average_rating - 8.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected_and_book_unchanged() {
    let harness = Harness::new();
    let id = harness.books.seed("Kindred", 7.0, 2).await;
    let before = harness.books.snapshot(id).await.expect("seeded book");

    for bad in [10.5, -0.1, f64::NAN, f64::INFINITY] {
        let err = harness
            .book_service
            .rate_book(id, "carol", bad)
            .await
            .expect_err("rating outside 0..=10 must fail");
        assert!(matches!(
            err,
            BookError::Validation(DomainError::Validation { .. })
        ));
    }

    let after = harness.books.snapshot(id).await.expect("book still present");
    assert_eq!(before, after);
}

#[tokio::test]
async fn rating_boundaries_are_accepted() {
    let harness = Harness::new();
    let id = harness.books.seed("Beloved", 0.0, 0).await;

    harness
        .book_service
        .rate_book(id, "dave", 0.0)
        .await
        .expect("zero is a valid rating");
    let book = harness
        .book_service
        .rate_book(id, "erin", 10.0)
        .await
        .expect("ten is a valid rating");

    assert_eq!(book.total_ratings, 2);
    assert!((book.average_rating - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn rating_missing_book_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .book_service
        .rate_book(404, "frank", 5.0)
        .await
        .expect_err("no such book");
    assert!(matches!(err, BookError::NotFound));
}

#[tokio::test]
async fn second_refresh_on_the_same_day_skips_the_store() {
    let harness = Harness::new();
    harness.books.seed("Solaris", 8.0, 4).await;

    let first = harness.recommendations.refresh().await.expect("first run");
    assert!(matches!(first, RefreshOutcome::Completed { .. }));

    harness.clock.advance(Duration::hours(3));
    let second = harness.recommendations.refresh().await.expect("second run");
    assert!(matches!(second, RefreshOutcome::Skipped { .. }));
    assert_eq!(first.task_id(), second.task_id());

    assert_eq!(harness.books.top_rated_calls(), 1);
}

#[tokio::test]
async fn overlapping_refreshes_query_the_store_once() {
    let harness = Harness::new();
    harness.books.seed("Roadside Picnic", 7.5, 2).await;
    let service = &harness.recommendations;

    let (a, b, c) = tokio::join!(service.refresh(), service.refresh(), service.refresh());
    let outcomes = [
        a.expect("first trigger"),
        b.expect("second trigger"),
        c.expect("third trigger"),
    ];

    let completed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, RefreshOutcome::Completed { .. }))
        .count();
    assert_eq!(completed, 1);
    assert!(
        outcomes
            .iter()
            .all(|outcome| outcome.task_id() == outcomes[0].task_id())
    );
    assert_eq!(harness.books.top_rated_calls(), 1);
}

#[tokio::test]
async fn read_after_refresh_serves_top_five_from_cache() {
    let harness = Harness::new();
    let mut expected = Vec::new();
    for (title, average) in [
        ("One", 9.8),
        ("Two", 9.1),
        ("Three", 9.1),
        ("Four", 8.7),
        ("Five", 7.9),
        ("Six", 6.0),
        ("Seven", 3.2),
    ] {
        expected.push(harness.books.seed(title, average, 2).await);
    }
    expected.truncate(5);

    harness.recommendations.refresh().await.expect("refresh");
    assert_eq!(harness.books.top_rated_calls(), 1);

    let weekly = harness.recommendations.weekly().await.expect("weekly read");
    assert_eq!(weekly.source, SnapshotSource::Cache);
    assert_eq!(Harness::ids(&weekly.books), expected);
    assert_eq!(harness.books.top_rated_calls(), 1);
}

#[tokio::test]
async fn unrated_books_never_appear() {
    let harness = Harness::new();
    let a = harness.books.seed("A", 9.0, 3).await;
    let b = harness.books.seed("B", 8.5, 1).await;
    let _c = harness.books.seed("C", 0.0, 0).await;
    let d = harness.books.seed("D", 7.0, 5).await;

    let outcome = harness.recommendations.refresh().await.expect("refresh");
    let RefreshOutcome::Completed { books, .. } = outcome else {
        panic!("first refresh of the day must complete");
    };
    assert_eq!(Harness::ids(&books), vec![a, b, d]);

    let weekly = harness.recommendations.weekly().await.expect("weekly read");
    assert_eq!(Harness::ids(&weekly.books), vec![a, b, d]);
}

#[tokio::test]
async fn cached_payload_matches_stored_shape() {
    let harness = Harness::new();
    harness.books.seed("Piranesi", 9.5, 2).await;
    harness.books.seed("Jonathan Strange", 8.5, 1).await;

    harness.recommendations.refresh().await.expect("refresh");

    let payload = harness
        .cache
        .get(&CacheKey::WeeklyRecommendations.render())
        .await
        .expect("cache read")
        .expect("snapshot present");

    insta::assert_snapshot!(payload, @r#"[{"id":1,"title":"Piranesi","author":"Piranesi Author","rating":9.5,"total_ratings":2},{"id":2,"title":"Jonathan Strange","author":"Jonathan Strange Author","rating":8.5,"total_ratings":1}]"#);
}

#[tokio::test]
async fn snapshot_older_than_seven_days_is_treated_as_absent() {
    let harness = Harness::new();
    harness.books.seed("Neuromancer", 8.0, 2).await;
    harness.recommendations.refresh().await.expect("refresh");

    harness.clock.advance(Duration::days(7) - Duration::seconds(1));
    let still_cached = harness.recommendations.weekly().await.expect("read");
    assert_eq!(still_cached.source, SnapshotSource::Cache);
    assert_eq!(harness.books.top_rated_calls(), 1);

    harness.clock.advance(Duration::seconds(1));
    let expired = harness.recommendations.weekly().await.expect("read");
    assert_eq!(expired.source, SnapshotSource::Recomputed);
    assert_eq!(harness.books.top_rated_calls(), 2);
}

#[tokio::test]
async fn marker_expires_after_a_day() {
    let harness = Harness::new();
    harness.books.seed("Hyperion", 8.0, 2).await;

    let first = harness.recommendations.refresh().await.expect("refresh");
    let marker = CacheKey::RefreshCompleted(first.task_id().to_string()).render();
    assert!(harness.cache.exists(&marker).await.expect("exists"));

    harness.clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert!(harness.cache.exists(&marker).await.expect("exists"));

    harness.clock.advance(Duration::seconds(1));
    assert!(!harness.cache.exists(&marker).await.expect("exists"));

    let next = harness.recommendations.refresh().await.expect("next day");
    assert!(matches!(next, RefreshOutcome::Completed { .. }));
    assert_ne!(first.task_id(), next.task_id());
    assert_eq!(harness.books.top_rated_calls(), 2);
}

#[tokio::test]
async fn failed_refresh_releases_the_marker() {
    let harness = Harness::new();
    harness.books.seed("Ubik", 7.5, 2).await;
    harness.books.fail_top_rated(true);

    let err = harness
        .recommendations
        .refresh()
        .await
        .expect_err("store failure aborts the run");
    assert!(matches!(err, RecommendationError::Store(_)));

    let marker = CacheKey::RefreshCompleted(harness.recommendations.current_task_id()).render();
    assert!(!harness.cache.exists(&marker).await.expect("exists"));
    assert!(
        harness
            .cache
            .get(&CacheKey::WeeklyRecommendations.render())
            .await
            .expect("cache read")
            .is_none()
    );

    harness.books.fail_top_rated(false);
    let retry = harness.recommendations.refresh().await.expect("retry");
    assert!(matches!(retry, RefreshOutcome::Completed { .. }));
}

#[tokio::test]
async fn cold_read_recomputes_without_claiming_the_marker() {
    let harness = Harness::new();
    harness.books.seed("Annihilation", 8.0, 3).await;

    let cold = harness.recommendations.weekly().await.expect("cold read");
    assert_eq!(cold.source, SnapshotSource::Recomputed);

    let warm = harness.recommendations.weekly().await.expect("warm read");
    assert_eq!(warm.source, SnapshotSource::Cache);

    let marker = CacheKey::RefreshCompleted(harness.recommendations.current_task_id()).render();
    assert!(!harness.cache.exists(&marker).await.expect("exists"));

    let refresh = harness.recommendations.refresh().await.expect("refresh");
    assert!(matches!(refresh, RefreshOutcome::Completed { .. }));
}

#[tokio::test]
async fn ratings_do_not_invalidate_the_snapshot() {
    let harness = Harness::new();
    let leader = harness.books.seed("Leader", 9.0, 1).await;
    let runner_up = harness.books.seed("Runner-up", 6.0, 1).await;
    harness.recommendations.refresh().await.expect("refresh");

    harness
        .book_service
        .rate_book(runner_up, "seed-0", 10.0)
        .await
        .expect("rating");

    let weekly = harness.recommendations.weekly().await.expect("read");
    assert_eq!(weekly.source, SnapshotSource::Cache);
    assert_eq!(Harness::ids(&weekly.books), vec![leader, runner_up]);
    assert!((weekly.books[1].rating - 6.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn unavailable_cache_serves_reads_from_the_store_and_fails_refresh() {
    let harness = Harness::new();
    harness.books.seed("Gideon", 8.0, 2).await;
    let service = RecommendationService::new(
        harness.books.clone(),
        Arc::new(UnavailableCache),
        harness.clock.clone(),
        RecommendationConfig::default(),
    );

    let weekly = service.weekly().await.expect("store fallback");
    assert_eq!(weekly.source, SnapshotSource::Recomputed);
    assert_eq!(weekly.books.len(), 1);

    let err = service.refresh().await.expect_err("cannot claim marker");
    assert!(matches!(err, RecommendationError::Cache(_)));
    assert_eq!(harness.books.top_rated_calls(), 1);
}
