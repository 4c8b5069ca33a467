//! Integration tests for retry functionality.

use super::*;
use crate::loader::{Load, LoadExt};
use crate::testing::FlakyLoader;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing_test::traced_test;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// The paused clock may overshoot a timer by a tick.
fn assert_offsets(actual: Vec<Duration>, expected: Vec<Duration>) {
    assert_eq!(actual.len(), expected.len(), "offsets: {:?}", actual);
    for (a, e) in actual.iter().zip(&expected) {
        assert!(
            *a >= *e && *a < *e + ms(5),
            "expected offsets ~{:?}, got {:?}",
            expected,
            actual
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_third_attempt() {
    let flaky = FlakyLoader::new(2, "transient failure", "success");
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::constant(ms(1)).with_max_retries(5));

    let result = loader.load().await;

    assert_eq!(result, Ok("success"));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhausted_returns_final_error() {
    let flaky = FlakyLoader::<(), _>::always_failing("always fails");
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::constant(ms(1)).with_max_retries(3));

    let exhausted = loader.load().await.unwrap_err();

    assert_eq!(exhausted.attempts, 4); // 1 initial + 3 retries
    assert_eq!(exhausted.final_error, "always fails");
    assert_eq!(flaky.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_follow_exponential_schedule() {
    let flaky = FlakyLoader::<(), _>::always_failing("down");
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::exponential(ms(100)).with_max_retries(3));

    let _ = loader.load().await;

    assert_offsets(flaky.call_offsets(), vec![ms(0), ms(100), ms(300), ms(700)]);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_follow_linear_schedule() {
    let flaky = FlakyLoader::<(), _>::always_failing("down");
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::linear(ms(10)).with_max_retries(3));

    let _ = loader.load().await;

    assert_offsets(flaky.call_offsets(), vec![ms(0), ms(10), ms(30), ms(60)]);
}

#[tokio::test(start_paused = true)]
async fn test_max_delay_caps_waits() {
    let flaky = FlakyLoader::<(), _>::always_failing("down");
    let loader = flaky.clone().with_retry(
        RetryPolicy::exponential(ms(100))
            .with_max_retries(3)
            .with_max_delay(ms(150)),
    );

    let _ = loader.load().await;

    assert_offsets(flaky.call_offsets(), vec![ms(0), ms(100), ms(250), ms(400)]);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_never_overlap() {
    let flaky = FlakyLoader::<(), _>::always_failing("slow failure").with_latency(ms(40));
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::constant(ms(10)).with_max_retries(2));

    let _ = loader.load().await;

    // Each attempt starts only after the previous one settled and the delay passed.
    assert_offsets(flaky.call_offsets(), vec![ms(0), ms(50), ms(100)]);
}

#[tokio::test(start_paused = true)]
async fn test_total_duration_matches_schedule() {
    let policy = RetryPolicy::exponential(ms(20)).with_max_retries(2);
    let expected = policy.total_delay();
    let loader = FlakyLoader::<(), _>::always_failing("down").with_retry(policy);
    let start = Instant::now();

    let exhausted = loader.load().await.unwrap_err();

    assert_offsets(vec![exhausted.total_duration], vec![expected]);
    assert_offsets(vec![start.elapsed()], vec![expected]);
}

#[tokio::test]
async fn test_no_retry_policy_makes_one_attempt() {
    let flaky = FlakyLoader::<(), _>::always_failing("down");
    let loader = flaky.clone().with_retry(RetryPolicy::none());

    let exhausted = loader.load().await.unwrap_err();

    assert_eq!(exhausted.attempts, 1);
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_if_skips_non_retryable_errors() {
    #[derive(Debug, PartialEq, Clone)]
    enum TestError {
        Permanent,
    }

    let flaky = FlakyLoader::<(), _>::always_failing(TestError::Permanent);
    let loader = flaky
        .clone()
        .with_retry(RetryPolicy::constant(ms(1)).with_max_retries(5))
        .retry_if(|err| !matches!(err, TestError::Permanent));

    let exhausted = loader.load().await.unwrap_err();

    assert_eq!(exhausted.attempts, 1);
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_on_retry_sees_scheduled_delays() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let loader = FlakyLoader::<(), _>::always_failing("down")
        .with_retry(RetryPolicy::exponential(ms(10)).with_max_retries(2))
        .on_retry(move |event| {
            sink.lock()
                .unwrap()
                .push((event.attempt, event.next_delay, event.elapsed));
        });

    let _ = loader.load().await;

    let seen = seen.lock().unwrap();
    let attempts: Vec<_> = seen.iter().map(|(a, d, _)| (*a, *d)).collect();
    assert_eq!(
        attempts,
        vec![(1, Some(ms(10))), (2, Some(ms(20))), (3, None)]
    );
    assert_offsets(
        seen.iter().map(|(_, _, elapsed)| *elapsed).collect(),
        vec![ms(0), ms(10), ms(30)],
    );
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_each_retry_logs_a_warning() {
    let loader = FlakyLoader::new(2, "offline", ())
        .with_retry(RetryPolicy::constant(ms(5)).with_max_retries(3));

    assert!(loader.load().await.is_ok());

    assert!(logs_contain("load failed, retrying"));
    assert!(logs_contain("remaining=3"));
    assert!(logs_contain("remaining=2"));
    assert!(!logs_contain("load failed after retries"));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_giving_up_logs_an_error() {
    let loader = FlakyLoader::<(), _>::always_failing("offline")
        .with_retry(RetryPolicy::constant(ms(5)).with_max_retries(1));

    assert!(loader.load().await.is_err());

    assert!(logs_contain("load failed after retries"));
    assert!(logs_contain("attempts=2"));
}

proptest! {
    #[test]
    fn prop_exponential_schedule_is_non_decreasing(
        initial_ms in 1u64..1_000,
        multiplier in 1.0f64..4.0,
        retries in 0u32..12,
    ) {
        let policy = RetryPolicy::exponential(ms(initial_ms))
            .with_backoff_multiplier(multiplier)
            .with_max_retries(retries);

        let delays: Vec<_> = policy.delays().collect();

        prop_assert_eq!(delays.len(), retries as usize);
        prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_exponential_delay_is_initial_times_power(
        initial_ms in 1u64..1_000,
        multiplier in 1.0f64..4.0,
        attempt in 0u32..10,
    ) {
        let policy = RetryPolicy::exponential(ms(initial_ms))
            .with_backoff_multiplier(multiplier)
            .with_max_retries(attempt + 1);

        let delay = policy.delay_for_attempt(attempt).unwrap();
        let expected = initial_ms as f64 / 1_000.0 * multiplier.powi(attempt as i32);

        prop_assert!((delay.as_secs_f64() - expected).abs() <= expected * 1e-9 + 1e-9);
    }

    #[test]
    fn prop_max_delay_bounds_every_delay(
        initial_ms in 1u64..1_000,
        multiplier in 1.0f64..4.0,
        cap_ms in 1u64..2_000,
        retries in 1u32..12,
    ) {
        let policy = RetryPolicy::exponential(ms(initial_ms))
            .with_backoff_multiplier(multiplier)
            .with_max_retries(retries)
            .with_max_delay(ms(cap_ms));

        prop_assert!(policy.delays().all(|d| d <= ms(cap_ms)));
    }

    #[test]
    fn prop_worst_case_latency_formula(
        initial_ms in 0u64..500,
        retries in 0u32..8,
        timeout_ms in 1u64..1_000,
    ) {
        let policy = RetryPolicy::exponential(ms(initial_ms)).with_max_retries(retries);

        let total: Duration = policy.delays().sum();
        prop_assert_eq!(
            policy.worst_case_latency(ms(timeout_ms)),
            ms(timeout_ms) * (retries + 1) + total
        );
    }
}
