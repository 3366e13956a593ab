use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref STATUS_REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "babywatch_status_requests_total",
        "Total status requests served"
    ))
    .unwrap();
    pub static ref FETCH_ATTEMPTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "babywatch_fetch_attempts_total",
        "Total telemetry fetch attempts issued to the vendor cloud"
    ))
    .unwrap();
    pub static ref TRANSPORT_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "babywatch_transport_failures_total",
        "Total fetch attempts that failed at the transport level"
    ))
    .unwrap();
    pub static ref DEGRADED_RESPONSES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "babywatch_degraded_responses_total",
        "Total responses degraded to name and age because sign-in or discovery failed"
    ))
    .unwrap();
    pub static ref STATUS_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("babywatch_status_outcomes_total", "Status results by value"),
        &["status"]
    )
    .unwrap();
    pub static ref PIPELINE_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "babywatch_pipeline_latency_seconds",
            "Time taken to produce a status, including retries"
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0])
    )
    .unwrap();
}

pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(STATUS_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FETCH_ATTEMPTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TRANSPORT_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DEGRADED_RESPONSES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PIPELINE_LATENCY_SECONDS.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
