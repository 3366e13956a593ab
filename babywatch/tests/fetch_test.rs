mod common;

use babywatch::{RetryFetcher, RetryPolicy, TelemetrySample};
use common::{session, sock, ScriptedSource, Step};
use std::time::Duration;

fn policy() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        delay: Duration::from_secs(10),
        attempt_timeout: Duration::from_secs(15),
    }
}

fn heart_rate_only(hr: u32) -> TelemetrySample {
    TelemetrySample {
        heart_rate: Some(hr),
        ..Default::default()
    }
}

fn movement_only() -> TelemetrySample {
    TelemetrySample {
        movement: Some(3),
        sleep_state: Some(1),
        ..Default::default()
    }
}

async fn fetch(fetcher: RetryFetcher, source: &ScriptedSource) -> babywatch::FetchOutcome {
    fetcher
        .fetch(source, &session(), &sock("Dream Sock", "SS3", "AC000W100"))
        .await
}

#[test]
fn test_first_attempt_informative() {
    tokio_test::block_on(async {
        let source = ScriptedSource::new(vec![Step::Sample(heart_rate_only(120))]);
        let outcome = fetch(RetryFetcher::new(policy()), &source).await;

        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.transport_failed);
        assert_eq!(outcome.sample.heart_rate, Some(120));
        assert_eq!(source.fetch_calls(), 1);
    });
}

#[tokio::test(start_paused = true)]
async fn test_stops_as_soon_as_vitals_appear() {
    let source = ScriptedSource::new(vec![
        Step::Sample(TelemetrySample::default()),
        Step::Sample(heart_rate_only(70)),
        Step::Sample(heart_rate_only(99)),
    ]);

    let start = tokio::time::Instant::now();
    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.sample.heart_rate, Some(70));
    assert_eq!(source.fetch_calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_empty_sample() {
    let source = ScriptedSource::new(vec![]);

    let start = tokio::time::Instant::now();
    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 3);
    assert!(outcome.sample.is_empty());
    assert!(!outcome.transport_failed);
    assert_eq!(source.fetch_calls(), 3);
    // Two waits between three attempts, none after the last.
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_absorbed() {
    let source = ScriptedSource::new(vec![Step::Fail, Step::Sample(heart_rate_only(130))]);

    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 2);
    assert!(outcome.transport_failed);
    assert_eq!(outcome.sample.heart_rate, Some(130));
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_failing_still_returns() {
    let source = ScriptedSource::new(vec![Step::Fail, Step::Fail, Step::Fail]);

    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 3);
    assert!(outcome.transport_failed);
    assert!(outcome.sample.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failures_keep_last_obtained_sample() {
    let source = ScriptedSource::new(vec![
        Step::Sample(movement_only()),
        Step::Fail,
        Step::Fail,
    ]);

    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 3);
    assert!(outcome.transport_failed);
    assert_eq!(outcome.sample, movement_only());
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_times_out() {
    let source = ScriptedSource::new(vec![Step::Hang, Step::Sample(heart_rate_only(110))]);

    let start = tokio::time::Instant::now();
    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 2);
    assert!(outcome.transport_failed);
    assert_eq!(outcome.sample.heart_rate, Some(110));
    assert_eq!(start.elapsed(), Duration::from_secs(25));
}

#[tokio::test(start_paused = true)]
async fn test_non_informative_fields_keep_retrying() {
    let source = ScriptedSource::new(vec![
        Step::Sample(movement_only()),
        Step::Sample(movement_only()),
        Step::Sample(movement_only()),
    ]);

    let outcome = fetch(RetryFetcher::new(policy()), &source).await;

    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.sample, movement_only());
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_still_tries_once() {
    let source = ScriptedSource::new(vec![]);
    let fetcher = RetryFetcher::new(RetryPolicy {
        attempts: 0,
        ..policy()
    });

    let outcome = fetch(fetcher, &source).await;
    assert_eq!(outcome.attempts, 1);
}
