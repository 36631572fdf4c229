//! Load testing: concurrent virtual users alternating GET and POST on
//! `/mediator`, each with the shared Basic credential, against plain HTTP.

use std::time::{Duration, Instant};

use mediator_server::Transport;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

mod common;

#[tokio::test]
async fn test_load_performance() {
    // 1. Start server
    let cert = common::TestCert::generate();
    let (server, shutdown) = common::start_server(common::test_config(&cert)).await;
    let base_url = format!("http://{}", server.local_addr(Transport::Http).unwrap());

    // 2. Run Load Test
    let virtual_users = 20; // Reduced for consistency in debug mode
    let iterations_per_user = 25;
    let total_requests = virtual_users * iterations_per_user * 2;

    let client = common::http_client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..virtual_users {
        let client = client.clone();
        let url = format!("{}/mediator", base_url);
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            let mut failures = 0;
            for _ in 0..iterations_per_user {
                let get = client
                    .get(&url)
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, common::BASIC_AUTH);
                let post = client
                    .post(&url)
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, common::BASIC_AUTH)
                    .header(CONTENT_TYPE, "application/json")
                    .body(r#"{"hello": "world"}"#);

                for request in [get, post] {
                    let req_start = Instant::now();
                    match request.send().await {
                        Ok(res) if res.status() == 200 => latencies.push(req_start.elapsed()),
                        _ => failures += 1,
                    }
                }
            }
            (latencies, failures)
        }));
    }

    let mut all_latencies = Vec::new();
    let mut all_failures = 0;
    for task in tasks {
        let (latencies, failures) = task.await.unwrap();
        all_latencies.extend(latencies);
        all_failures += failures;
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    assert_eq!(all_failures, 0, "every request should return 200");
    assert_eq!(all_latencies.len(), total_requests);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p95 = all_latencies[(all_latencies.len() as f64 * 0.95) as usize];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Virtual Users:  {}", virtual_users);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P95 Latency:    {:?}", p95);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    assert!(p95 < Duration::from_millis(600), "p95 latency {:?} over 600ms", p95);

    shutdown.trigger();
}
