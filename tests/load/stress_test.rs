//! Load Testing Suite
//!
//! Verifies behaviour under concurrent use:
//! - The historical file is parsed once no matter how many requests race
//!   for it
//! - Many concurrent HTTP clients all get complete forecasts
//! - The in-process pipeline sustains a reasonable request rate

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use demand_forecaster::repo::HistoricalStore;

use crate::common::{predict_body, Fixture, HISTORY_DAYS};

/// Test: Concurrent first load
///
/// Sixteen readers hit a cold store at once; all of them must observe the
/// same fully built dataset.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_load_is_shared() {
    let fixture = Fixture::new();
    let store = Arc::new(HistoricalStore::new(fixture.cfg.data.csv_path.clone()));

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        tasks.spawn_blocking(move || {
            (
                store.record_count(),
                store.daily_usage_for_region("Maharashtra").len(),
            )
        });
    }

    while let Some(result) = tasks.join_next().await {
        let (records, days) = result.unwrap();
        assert_eq!(records, 3 * HISTORY_DAYS as usize);
        assert_eq!(days, HISTORY_DAYS as usize);
    }

    // a second load is a no-op over the cached index
    assert_eq!(store.load_once().records().len(), 3 * HISTORY_DAYS as usize);
}

/// Test: Concurrent API clients
///
/// 50 clients each send 10 prediction requests; every response must be a
/// complete forecast and no request may take more than a second.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_concurrent_prediction_requests() {
    let base = Fixture::new().serve().await;
    let client = reqwest::Client::new();

    let mut api_tasks = JoinSet::new();
    for i in 0..50 {
        let client = client.clone();
        let url = format!("{base}/api/v1/predict");
        let region = if i % 2 == 0 { "Maharashtra" } else { "Delhi" };
        api_tasks.spawn(async move {
            let mut latencies = Vec::new();
            for day in 1..=10 {
                let start = Instant::now();
                let response = client
                    .post(&url)
                    .json(&predict_body(region, day, "Auto"))
                    .send()
                    .await
                    .unwrap();
                assert!(response.status().is_success());
                let body: serde_json::Value = response.json().await.unwrap();
                assert_eq!(body["series"].as_array().unwrap().len(), 90 + day as usize);
                latencies.push(start.elapsed());
            }
            latencies
        });
    }

    let mut measurements = Vec::new();
    while let Some(result) = api_tasks.join_next().await {
        measurements.extend(result.unwrap());
    }

    let max_latency = measurements.iter().max().unwrap();
    let avg_latency: Duration = measurements.iter().sum::<Duration>() / measurements.len() as u32;

    println!(
        "Prediction latency - Max: {:?}, Avg: {:?}",
        max_latency, avg_latency
    );

    assert!(
        max_latency < &Duration::from_secs(1),
        "Prediction latency exceeded 1s: {:?}",
        max_latency
    );
}

/// Test: Throughput benchmark
///
/// Measures how many forecasts per second the server answers sequentially.
#[tokio::test]
#[ignore] // Ignore by default as this is a slow test
async fn test_throughput_benchmark() {
    let base = Fixture::new().serve().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/v1/predict");

    let start = Instant::now();
    let mut request_count = 0u32;
    let test_duration = Duration::from_secs(5);

    while start.elapsed() < test_duration {
        let response = client
            .post(&url)
            .json(&predict_body("Maharashtra", 30, "Prophet"))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        request_count += 1;
    }

    let elapsed = start.elapsed();
    let per_second = request_count as f64 / elapsed.as_secs_f64();

    println!(
        "Throughput: {:.0} forecasts/second ({} requests in {:?})",
        per_second, request_count, elapsed
    );

    assert!(
        per_second > 50.0,
        "Throughput too low: {:.0} forecasts/s",
        per_second
    );
}
