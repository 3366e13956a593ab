use crate::ayla::Region;
use crate::classify::{RuleSetVersion, Thresholds};
use crate::errors::{Error, Result};
use crate::fetch::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_DELAY_MS};
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Everything the status pipeline needs to run one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub region: Region,
    pub retry: RetryPolicy,
    pub thresholds: Thresholds,
    pub rules: RuleSetVersion,
    pub device_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            retry: RetryPolicy::default(),
            thresholds: Thresholds::default(),
            rules: RuleSetVersion::default(),
            device_id: None,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct VendorConfig {
    pub email: String,
    pub password: String,
    pub app_id: String,
    pub app_secret: String,
    pub user_url: String,
    pub ads_url: String,
}

impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("email", &self.email)
            .field("password", &"***")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .field("user_url", &self.user_url)
            .field("ads_url", &self.ads_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfantProfile {
    pub name: String,
    /// `MM/DD/YY`
    pub birthdate: Option<String>,
    /// Zone whose calendar date the age is counted in.
    pub timezone: Tz,
}

impl Default for InfantProfile {
    fn default() -> Self {
        Self {
            name: "Baby".to_string(),
            birthdate: None,
            timezone: chrono_tz::America::Los_Angeles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    pub vendor: VendorConfig,
    pub profile: InfantProfile,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_addr = match get("HTTP_ADDR") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", get("PORT").unwrap_or_else(|| "10000".to_string())),
        };

        let region: Region = parse_or(&get, "OWLET_REGION", Region::default())?;

        let vendor = VendorConfig {
            email: get("OWLET_EMAIL").unwrap_or_default(),
            password: get("OWLET_PASSWORD").unwrap_or_default(),
            app_id: get("OWLET_APP_ID").unwrap_or_default(),
            app_secret: get("OWLET_APP_SECRET").unwrap_or_default(),
            user_url: get("OWLET_USER_URL").unwrap_or_else(|| region.user_url().to_string()),
            ads_url: get("OWLET_ADS_URL").unwrap_or_else(|| region.ads_url().to_string()),
        };

        let profile = InfantProfile {
            name: get("BABY_NAME").unwrap_or_else(|| "Baby".to_string()),
            birthdate: get("BABY_BIRTHDATE"),
            timezone: parse_or(&get, "BABY_TIMEZONE", chrono_tz::America::Los_Angeles)?,
        };

        let attempts: u32 = parse_or(&get, "RETRY_ATTEMPTS", DEFAULT_ATTEMPTS)?;
        if attempts == 0 {
            return Err(Error::Config("RETRY_ATTEMPTS must be at least 1".to_string()));
        }

        let retry = RetryPolicy {
            attempts,
            delay: Duration::from_millis(parse_or(&get, "RETRY_DELAY_MS", DEFAULT_DELAY_MS)?),
            attempt_timeout: Duration::from_millis(parse_or(
                &get,
                "FETCH_TIMEOUT_MS",
                DEFAULT_ATTEMPT_TIMEOUT_MS,
            )?),
        };

        let defaults = Thresholds::default();
        let thresholds = Thresholds {
            movement_awake: parse_or(&get, "MOVEMENT_AWAKE_THRESHOLD", defaults.movement_awake)?,
            fallback_sleep_movement_max: parse_or(
                &get,
                "FALLBACK_SLEEP_MOVEMENT_MAX",
                defaults.fallback_sleep_movement_max,
            )?,
            movement_override: parse_or(
                &get,
                "MOVEMENT_OVERRIDE_THRESHOLD",
                defaults.movement_override,
            )?,
            heart_rate_override: parse_or(
                &get,
                "HEART_RATE_OVERRIDE_THRESHOLD",
                defaults.heart_rate_override,
            )?,
        };

        let pipeline = PipelineConfig {
            region,
            retry,
            thresholds,
            rules: parse_or(&get, "CLASSIFIER_RULES", RuleSetVersion::default())?,
            device_id: get("OWLET_DEVICE_DSN"),
        };

        Ok(Self {
            http_addr,
            vendor,
            profile,
            pipeline,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}
