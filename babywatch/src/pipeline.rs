use crate::age::describe_age;
use crate::classify::StatusClassifier;
use crate::config::{InfantProfile, PipelineConfig};
use crate::errors::{Error, Result};
use crate::fetch::RetryFetcher;
use crate::metrics::{
    DEGRADED_RESPONSES_TOTAL, PIPELINE_LATENCY_SECONDS, STATUS_OUTCOMES_TOTAL,
    STATUS_REQUESTS_TOTAL,
};
use crate::model::{FetchOutcome, Status, StatusReport, TelemetrySample, Wear};
use crate::source::{select_device, DeviceDescriptor, TelemetrySource};
use crate::validate::classify_worn;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Everything one pipeline run learned, before it is turned into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub device: DeviceDescriptor,
    pub outcome: FetchOutcome,
    pub wear: Wear,
    pub status: Status,
}

/// Fetch, worn check, classification. Holds no per-request state, so one
/// instance serves concurrent requests behind an `Arc`.
pub struct Pipeline {
    config: PipelineConfig,
    profile: InfantProfile,
    source: Arc<dyn TelemetrySource>,
    fetcher: RetryFetcher,
    classifier: StatusClassifier,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        profile: InfantProfile,
        source: Arc<dyn TelemetrySource>,
    ) -> Self {
        let fetcher = RetryFetcher::new(config.retry);
        let classifier = StatusClassifier::new(config.rules, config.thresholds);

        Self {
            config,
            profile,
            source,
            fetcher,
            classifier,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn profile(&self) -> &InfantProfile {
        &self.profile
    }

    /// Worn check followed by classification. Not-worn samples never reach
    /// the classifier.
    pub fn infer(&self, sample: &TelemetrySample) -> (Wear, Status) {
        match classify_worn(sample) {
            Wear::Worn => {
                let decision = self.classifier.explain(sample);
                debug!(
                    rule = ?decision.rule,
                    overridden_by = ?decision.overridden_by,
                    "Classified as {}",
                    decision.status
                );
                (Wear::Worn, decision.status)
            }
            not_worn => (not_worn, Status::Unavailable),
        }
    }

    /// One full run. Sign-in and discovery failures are returned; fetch
    /// failures are not, they are absorbed by the retry loop.
    pub async fn run(&self) -> Result<Inference> {
        let session = self.source.authenticate().await?;
        let devices = self.source.list_devices(&session).await?;

        let device = select_device(&devices, self.config.device_id.as_deref())
            .ok_or(Error::DeviceNotFound)?
            .clone();
        debug!("Using device {} ({} {})", device.id, device.name, device.model);

        let outcome = self
            .fetcher
            .fetch(self.source.as_ref(), &session, &device)
            .await;
        let (wear, status) = self.infer(&outcome.sample);

        match wear {
            Wear::NotWorn(reason) => info!(
                attempts = outcome.attempts,
                transport_failed = outcome.transport_failed,
                "Monitor not worn: {}",
                reason
            ),
            Wear::Worn => info!(
                attempts = outcome.attempts,
                transport_failed = outcome.transport_failed,
                "Status: {}",
                status
            ),
        }

        Ok(Inference {
            device,
            outcome,
            wear,
            status,
        })
    }

    pub async fn get_status(&self) -> StatusReport {
        self.get_status_on(self.today(Utc::now())).await
    }

    /// Calendar date at `now` in the profile's zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.profile.timezone).date_naive()
    }

    /// Always answers. Anything that stops a live reading degrades the
    /// report to name and age.
    pub async fn get_status_on(&self, today: NaiveDate) -> StatusReport {
        let span = info_span!("status_request", request_id = %Uuid::new_v4());

        async move {
            STATUS_REQUESTS_TOTAL.inc();
            let timer = PIPELINE_LATENCY_SECONDS.start_timer();

            let age = describe_age(self.profile.birthdate.as_deref(), today);
            let report = match self.run().await {
                Ok(inference) => self.report(age, &inference),
                Err(e) => {
                    DEGRADED_RESPONSES_TOTAL.inc();
                    match &e {
                        Error::Auth(_) | Error::DeviceNotFound => warn!("Degraded status: {}", e),
                        _ => warn!("Degraded status after unexpected error: {}", e),
                    }
                    StatusReport::degraded(self.profile.name.clone(), age)
                }
            };

            STATUS_OUTCOMES_TOTAL
                .with_label_values(&[report.status.label()])
                .inc();
            timer.observe_duration();
            report
        }
        .instrument(span)
        .await
    }

    fn report(&self, age: String, inference: &Inference) -> StatusReport {
        if inference.status == Status::Unavailable {
            return StatusReport::degraded(self.profile.name.clone(), age);
        }

        StatusReport {
            name: self.profile.name.clone(),
            age,
            status: inference.status,
            heart_rate: inference.outcome.sample.heart_rate,
            oxygen_saturation: inference.outcome.sample.oxygen_saturation,
        }
    }
}
