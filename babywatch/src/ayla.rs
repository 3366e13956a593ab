//! Client for the Ayla-hosted cloud the sock reports into.
//!
//! Sign-in goes to the user service, device listing and property reads go
//! to the device service. Each status request signs in afresh; no token is
//! kept between requests.

use crate::config::VendorConfig;
use crate::errors::{Error, Result};
use crate::model::TelemetrySample;
use crate::source::{DeviceDescriptor, Session, TelemetrySource};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const HEART_RATE: &str = "HEART_RATE";
pub const OXYGEN_LEVEL: &str = "OXYGEN_LEVEL";
pub const MOVEMENT: &str = "MOVEMENT";
pub const SLEEP_STATE: &str = "SLEEP_STATE";
pub const SOCK_OFF: &str = "SOCK_OFF";
/// SS3 socks report their vitals as one JSON document in this property.
pub const REAL_TIME_VITALS: &str = "REAL_TIME_VITALS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn user_url(&self) -> &'static str {
        match self {
            Region::Us => "https://user-field.aylanetworks.com",
            Region::Eu => "https://user-field-eu.aylanetworks.com",
        }
    }

    pub fn ads_url(&self) -> &'static str {
        match self {
            Region::Us => "https://ads-field.aylanetworks.com",
            Region::Eu => "https://ads-eu.aylanetworks.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => f.write_str("us"),
            Region::Eu => f.write_str("eu"),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" | "world" => Ok(Region::Us),
            "eu" | "europe" => Ok(Region::Eu),
            other => Err(format!("unknown region '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    user: SignInUser<'a>,
}

#[derive(Debug, Serialize)]
struct SignInUser<'a> {
    email: &'a str,
    password: &'a str,
    application: Application<'a>,
}

#[derive(Debug, Serialize)]
struct Application<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DeviceEnvelope {
    device: AylaDevice,
}

#[derive(Debug, Deserialize)]
struct AylaDevice {
    dsn: String,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyEnvelope {
    property: Property,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

pub struct AylaSource {
    client: reqwest::Client,
    vendor: VendorConfig,
}

impl AylaSource {
    pub fn new(vendor: VendorConfig, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client, vendor })
    }

    fn ads(&self, path: &str) -> String {
        format!("{}/apiv1/{}", self.vendor.ads_url.trim_end_matches('/'), path)
    }

    async fn get_json<T>(&self, session: &Session, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("auth_token {}", session.token))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::Auth(format!("HTTP {}: {}", status, body.trim())))
        }
        _ => Err(Error::Transport(format!("HTTP {}: {}", status, body.trim()))),
    }
}

#[async_trait]
impl TelemetrySource for AylaSource {
    async fn authenticate(&self) -> Result<Session> {
        let url = format!(
            "{}/users/sign_in.json",
            self.vendor.user_url.trim_end_matches('/')
        );
        let request = SignInRequest {
            user: SignInUser {
                email: &self.vendor.email,
                password: &self.vendor.password,
                application: Application {
                    app_id: &self.vendor.app_id,
                    app_secret: &self.vendor.app_secret,
                },
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let signed_in: SignInResponse = check_status(response).await?.json().await?;

        debug!("Signed in to {}", self.vendor.user_url);
        Ok(Session {
            token: signed_in.access_token,
        })
    }

    async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceDescriptor>> {
        let devices: Vec<DeviceEnvelope> = self.get_json(session, &self.ads("devices.json")).await?;

        Ok(devices
            .into_iter()
            .map(|envelope| DeviceDescriptor {
                name: envelope.device.product_name.unwrap_or_default(),
                model: envelope.device.model.unwrap_or_default(),
                id: envelope.device.dsn,
            })
            .collect())
    }

    async fn fetch_properties(
        &self,
        session: &Session,
        device: &DeviceDescriptor,
    ) -> Result<TelemetrySample> {
        let path = format!("dsns/{}/properties.json", device.id);
        let properties: Vec<PropertyEnvelope> = self.get_json(session, &self.ads(&path)).await?;

        let properties: Vec<Property> = properties.into_iter().map(|p| p.property).collect();
        Ok(decode_properties(&properties))
    }
}

/// Maps the vendor property list onto a sample. Unknown properties are
/// ignored and null or malformed values leave the field absent.
///
/// `REAL_TIME_VITALS` (SS3) wins over the per-property names older socks use.
pub fn decode_properties(properties: &[Property]) -> TelemetrySample {
    let mut legacy = TelemetrySample::default();
    let mut vitals = None;

    for property in properties {
        match property.name.as_str() {
            REAL_TIME_VITALS => vitals = decode_vitals(&property.value),
            HEART_RATE => legacy.heart_rate = as_count(&property.value),
            OXYGEN_LEVEL => legacy.oxygen_saturation = as_count(&property.value),
            MOVEMENT => legacy.movement = as_count(&property.value),
            SLEEP_STATE => legacy.sleep_state = as_count(&property.value),
            SOCK_OFF => legacy.off_body = as_flag(&property.value),
            _ => {}
        }
    }

    match vitals {
        Some(vitals) => TelemetrySample {
            heart_rate: vitals.heart_rate.or(legacy.heart_rate),
            oxygen_saturation: vitals.oxygen_saturation.or(legacy.oxygen_saturation),
            movement: vitals.movement.or(legacy.movement),
            sleep_state: vitals.sleep_state.or(legacy.sleep_state),
            off_body: legacy.off_body,
        },
        None => legacy,
    }
}

/// The vitals document arrives as a JSON string inside the property value.
fn decode_vitals(value: &Value) -> Option<TelemetrySample> {
    let document = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(document) => document,
            Err(e) => {
                debug!("Unreadable {}: {}", REAL_TIME_VITALS, e);
                return None;
            }
        },
        Value::Object(_) => value.clone(),
        _ => return None,
    };

    Some(TelemetrySample {
        heart_rate: document.get("hr").and_then(as_count),
        oxygen_saturation: document.get("ox").and_then(as_count),
        movement: document.get("mv").and_then(as_count),
        sleep_state: document.get("ss").and_then(as_count),
        off_body: None,
    })
}

fn as_count(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() || number < 0.0 || number > u32::MAX as f64 {
        return None;
    }
    Some(number.round() as u32)
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(name: &str, value: Value) -> Property {
        Property {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_decode_full_reading() {
        let sample = decode_properties(&[
            property(HEART_RATE, json!(118)),
            property(OXYGEN_LEVEL, json!("97")),
            property(MOVEMENT, json!(1)),
            property(SLEEP_STATE, json!(8)),
            property(SOCK_OFF, json!(0)),
            property("BATT_LEVEL", json!(64)),
        ]);

        assert_eq!(
            sample,
            TelemetrySample {
                heart_rate: Some(118),
                oxygen_saturation: Some(97),
                movement: Some(1),
                sleep_state: Some(8),
                off_body: Some(false),
            }
        );
    }

    #[test]
    fn test_decode_nulls_and_garbage() {
        let sample = decode_properties(&[
            property(HEART_RATE, Value::Null),
            property(OXYGEN_LEVEL, json!("n/a")),
            property(MOVEMENT, json!(-3)),
            property(SOCK_OFF, json!("true")),
        ]);

        assert_eq!(sample.heart_rate, None);
        assert_eq!(sample.oxygen_saturation, None);
        assert_eq!(sample.movement, None);
        assert_eq!(sample.off_body, Some(true));
    }

    #[test]
    fn test_decode_ss3_vitals_document() {
        let sample = decode_properties(&[
            property(
                REAL_TIME_VITALS,
                json!(r#"{"hr":118,"ox":97,"mv":1,"ss":8,"sc":2,"bat":64}"#),
            ),
            property("BATT_LEVEL", json!(64)),
        ]);

        assert_eq!(
            sample,
            TelemetrySample {
                heart_rate: Some(118),
                oxygen_saturation: Some(97),
                movement: Some(1),
                sleep_state: Some(8),
                off_body: None,
            }
        );
    }

    #[test]
    fn test_vitals_document_wins_over_legacy_properties() {
        let sample = decode_properties(&[
            property(HEART_RATE, json!(90)),
            property(SOCK_OFF, json!(0)),
            property(REAL_TIME_VITALS, json!(r#"{"hr":131,"ox":98}"#)),
        ]);

        assert_eq!(sample.heart_rate, Some(131));
        assert_eq!(sample.oxygen_saturation, Some(98));
        assert_eq!(sample.movement, None);
        assert_eq!(sample.off_body, Some(false));
    }

    #[test]
    fn test_unreadable_vitals_fall_back_to_legacy() {
        let sample = decode_properties(&[
            property(REAL_TIME_VITALS, json!("not json")),
            property(HEART_RATE, json!(101)),
            property(OXYGEN_LEVEL, json!(96)),
        ]);

        assert_eq!(sample.heart_rate, Some(101));
        assert_eq!(sample.oxygen_saturation, Some(96));
    }

    #[test]
    fn test_null_vitals_document_is_empty() {
        let sample = decode_properties(&[property(REAL_TIME_VITALS, Value::Null)]);
        assert!(sample.is_empty());
    }

    #[test]
    fn test_decode_empty_list() {
        assert!(decode_properties(&[]).is_empty());
    }

    #[test]
    fn test_property_envelope_parses() {
        let body = r#"[
            {"property": {"name": "HEART_RATE", "value": 131, "data_updated_at": "2025-01-01T00:00:00Z"}},
            {"property": {"name": "SLEEP_STATE"}}
        ]"#;
        let parsed: Vec<PropertyEnvelope> = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].property.value, json!(131));
        assert_eq!(parsed[1].property.value, Value::Null);
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("US".parse::<Region>(), Ok(Region::Us));
        assert_eq!("europe".parse::<Region>(), Ok(Region::Eu));
        assert!("mars".parse::<Region>().is_err());
        assert_eq!(Region::Eu.to_string(), "eu");
    }
}
