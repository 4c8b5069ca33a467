//! Resilient Import Example
//!
//! Simulates lazily loaded application bundles and shows the decorators at
//! work, with every retry and failure visible in the log output:
//! - Retrying a flaky bundle with exponential backoff
//! - Bounding each attempt with a timeout
//! - Reporting final failures to a sink
//! - Preloading on hover, conditional loading and batch loading

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loadwell::prelude::*;
use loadwell::{BoxedLoader, PreloadError};

/// A pretend module registry: each bundle fails a number of times, then
/// resolves after `latency`.
fn bundle(
    name: &'static str,
    failures: u32,
    latency: Duration,
) -> impl Load<Output = String, Error = String> {
    let calls = Arc::new(AtomicU32::new(0));
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(latency).await;
            if n < failures {
                Err(format!("failed to fetch dynamically imported module: {}", name))
            } else {
                Ok(format!("{} (attempt {})", name, n + 1))
            }
        }
    }
}

// ==================== Retry ====================

async fn example_retry() {
    println!("\n=== Example 1: Retry With Backoff ===");

    let loader = bundle("chart.js", 2, Duration::from_millis(20))
        .with_retry(RetryPolicy::exponential(Duration::from_millis(100)).with_max_retries(3));

    match loader.load().await {
        Ok(module) => println!("Loaded {}", module),
        Err(e) => println!("Gave up: {}", e),
    }
}

// ==================== Retry + Timeout ====================

async fn example_retry_and_timeout() {
    println!("\n=== Example 2: Retry And Timeout ===");

    let options = RetryTimeoutOptions {
        max_retries: 2,
        timeout: Duration::from_millis(100),
        initial_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
    };
    println!("Worst case: {:?}", options.worst_case_latency());

    // Every attempt takes longer than the deadline.
    let loader = with_retry_and_timeout(bundle("mapbox-gl", 0, Duration::from_secs(1)), options);

    match loader.load().await {
        Ok(module) => println!("Loaded {}", module),
        Err(e) => println!("Gave up: {}", e),
    }
}

// ==================== Error Tracking ====================

async fn example_error_tracking() {
    println!("\n=== Example 3: Error Tracking ===");

    let analytics = |name: &str, error: &RetryExhausted<String>| {
        println!("analytics event: load_error name={} attempts={}", name, error.attempts);
    };

    let loader = bundle("pdf.js", u32::MAX, Duration::from_millis(5))
        .with_retry(RetryPolicy::constant(Duration::from_millis(10)).with_max_retries(1))
        .with_error_tracking("pdf.js", analytics);

    if let Err(e) = loader.load().await {
        println!("Caller still sees the error: {}", e.final_error);
    }

    let traced = bundle("editor.js", u32::MAX, Duration::from_millis(5))
        .with_error_tracking("editor.js", TracingSink);
    let _ = traced.load().await;
}

// ==================== Helpers ====================

async fn example_helpers() {
    println!("\n=== Example 4: Preload, Conditional And Batch ===");

    // Start fetching on hover, use the result on click.
    let dashboard = preload(bundle("dashboard.js", 0, Duration::from_millis(50)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    match dashboard.await {
        Ok(module) => println!("Preloaded {}", module),
        Err(PreloadError::Load(e)) => println!("Preload failed: {}", e),
        Err(PreloadError::Cancelled) => println!("Preload cancelled"),
    }

    let is_admin = false;
    let admin = load_if(is_admin, &bundle("admin.js", 0, Duration::ZERO)).await;
    println!("Admin panel: {:?}", admin);

    let loaders: Vec<BoxedLoader<String, String>> = vec![
        bundle("vendor.js", 0, Duration::from_millis(30)).boxed(),
        bundle("app.js", 0, Duration::from_millis(10)).boxed(),
    ];
    println!("Batch: {:?}", load_all(loaders).await);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    example_retry().await;
    example_retry_and_timeout().await;
    example_error_tracking().await;
    example_helpers().await;
}
