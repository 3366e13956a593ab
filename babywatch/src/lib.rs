pub mod age;
pub mod ayla;
pub mod classify;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod rest;
pub mod source;
pub mod validate;

pub use classify::{RuleSetVersion, StatusClassifier, Thresholds};
pub use config::{Config, InfantProfile, PipelineConfig, VendorConfig};
pub use errors::{Error, Result};
pub use fetch::{RetryFetcher, RetryPolicy};
pub use model::{FetchOutcome, Status, StatusReport, TelemetrySample, Wear};
pub use pipeline::Pipeline;
pub use source::{DeviceDescriptor, Session, TelemetrySource};
pub use validate::classify_worn;
