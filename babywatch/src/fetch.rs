use crate::errors::Result;
use crate::metrics::{FETCH_ATTEMPTS_TOTAL, TRANSPORT_FAILURES_TOTAL};
use crate::model::{FetchOutcome, TelemetrySample};
use crate::source::{DeviceDescriptor, Session, TelemetrySource};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY_MS: u64 = 10_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Fixed wait between attempts. Missing data comes from the sock still
    /// settling, so the delay does not grow.
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RetryFetcher {
    policy: RetryPolicy,
}

impl RetryFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Polls the source until heart rate or oxygen shows up, or the attempt
    /// bound runs out. Never fails: transport errors count as empty attempts
    /// and exhaustion returns the last sample obtained, or an empty one if
    /// no attempt returned anything.
    pub async fn fetch(
        &self,
        source: &dyn TelemetrySource,
        session: &Session,
        device: &DeviceDescriptor,
    ) -> FetchOutcome {
        let max_attempts = self.policy.attempts.max(1);
        let mut attempt = 0;
        let mut transport_failed = false;
        let mut last: Option<TelemetrySample> = None;

        loop {
            attempt += 1;
            FETCH_ATTEMPTS_TOTAL.inc();

            match self.fetch_once(source, session, device).await {
                Ok(fetched) => last = Some(fetched),
                Err(e) => {
                    TRANSPORT_FAILURES_TOTAL.inc();
                    transport_failed = true;
                    warn!(
                        "Telemetry fetch failed (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                }
            }

            if last.is_some_and(|sample| sample.is_informative()) {
                if attempt > 1 {
                    info!("Telemetry obtained on attempt {}", attempt);
                }
                break;
            }

            if attempt >= max_attempts {
                warn!(
                    "No vitals after {} attempts, giving up with last sample",
                    attempt
                );
                break;
            }

            debug!(
                "No vitals in attempt {}/{}, retrying in {:?}",
                attempt, max_attempts, self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;
        }

        FetchOutcome {
            sample: last.unwrap_or_default(),
            attempts: attempt,
            transport_failed,
        }
    }

    async fn fetch_once(
        &self,
        source: &dyn TelemetrySource,
        session: &Session,
        device: &DeviceDescriptor,
    ) -> Result<TelemetrySample> {
        timeout(
            self.policy.attempt_timeout,
            source.fetch_properties(session, device),
        )
        .await?
    }
}
