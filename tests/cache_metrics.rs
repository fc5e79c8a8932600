mod support;

use std::collections::HashSet;

use metrics_util::debugging::DebuggingRecorder;
use support::Harness;

#[tokio::test]
async fn recommendation_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let harness = Harness::new();
    harness.books.seed("Station Eleven", 8.2, 3).await;

    // miss, then hit
    harness.recommendations.weekly().await.expect("cold read");
    harness.recommendations.weekly().await.expect("warm read");

    // completed, then skipped
    harness.recommendations.refresh().await.expect("refresh");
    harness.recommendations.refresh().await.expect("repeat refresh");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "lectern_recommendations_cache_hit_total",
        "lectern_recommendations_cache_miss_total",
        "lectern_refresh_total",
        "lectern_refresh_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let outcomes: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(composite_key, _, _, _)| composite_key.key().name() == "lectern_refresh_total")
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(outcomes.contains("completed"));
    assert!(outcomes.contains("skipped"));
}
