//! Load testing for the balancer.

use std::time::{Duration, Instant};

use bytes::Bytes;

mod common;
use common::{start_proxy, start_unix_backend, Reply};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_spread_evenly() {
    let ok = Bytes::from_static(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    let mut backends: Vec<_> = (0..3)
        .map(|i| start_unix_backend(&format!("load-{}", i), Reply::Close(ok.clone())))
        .collect();
    let proxy = start_proxy(backends.iter().map(|b| b.address()).collect()).await;

    let concurrency = 20;
    let requests_per_task = 15;
    let total_requests = concurrency * requests_per_task;

    // The proxy closes after every reply, so never reuse a pooled connection.
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = proxy.url("/payments");
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                let req_start = Instant::now();
                let res = client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .body(format!("{{\"correlationId\":\"{}-{}\",\"amount\":19.9}}", task, i))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 200);
                assert_eq!(res.text().await.unwrap(), "{}");
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let elapsed = start.elapsed();

    assert_eq!(all_latencies.len(), total_requests);
    all_latencies.sort();
    let p99 = all_latencies[(total_requests * 99) / 100 - 1];
    println!(
        "{} requests in {:?} ({:.0} req/s), p99 {:?}",
        total_requests,
        elapsed,
        total_requests as f64 / elapsed.as_secs_f64(),
        p99
    );

    // Background forwards finish shortly after the acks.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let counts: Vec<usize> = backends.iter_mut().map(|b| b.drain_count()).collect();
    assert_eq!(counts.iter().sum::<usize>(), total_requests);
    for count in counts {
        assert_eq!(count, total_requests / 3);
    }
}
