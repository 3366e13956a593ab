use serde::{Deserialize, Serialize};
use std::fmt;

/// One reading from the sock, as returned by a single fetch attempt.
///
/// Every field can be missing: the vendor cloud reports nothing at all while
/// the sock is settling or disconnected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub heart_rate: Option<u32>,
    pub oxygen_saturation: Option<u32>,
    /// Raw movement field; read through [`TelemetrySample::movement`].
    pub movement: Option<u32>,
    pub sleep_state: Option<u32>,
    /// Device signal that the sock is off the foot.
    pub off_body: Option<bool>,
}

impl TelemetrySample {
    /// Movement magnitude, defaulting to 0 when the device did not report it.
    pub fn movement(&self) -> u32 {
        self.movement.unwrap_or(0)
    }

    /// True when no field at all was obtained.
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.oxygen_saturation.is_none()
            && self.movement.is_none()
            && self.sleep_state.is_none()
            && self.off_body.is_none()
    }

    /// True when heart rate or oxygen saturation is present.
    pub fn is_informative(&self) -> bool {
        self.heart_rate.is_some() || self.oxygen_saturation.is_some()
    }
}

/// Result of the bounded retry loop for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub sample: TelemetrySample,
    pub attempts: u32,
    pub transport_failed: bool,
}

/// Why a sample was rejected as not worn. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotWornReason {
    NoData,
    MissingVitals,
    ZeroVitals,
    ReportedOffBody,
}

impl fmt::Display for NotWornReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NotWornReason::NoData => "no data",
            NotWornReason::MissingVitals => "missing vitals",
            NotWornReason::ZeroVitals => "zero vitals",
            NotWornReason::ReportedOffBody => "device reports off body",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wear {
    Worn,
    NotWorn(NotWornReason),
}

impl Wear {
    pub fn is_worn(&self) -> bool {
        matches!(self, Wear::Worn)
    }
}

/// Final answer of the pipeline.
///
/// `Sleeping` covers every sleep depth. A light/deep split would slot in
/// here as extra variants sharing the sleeping icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Unavailable,
    Awake,
    Sleeping,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unavailable => "Unavailable",
            Status::Awake => "Awake",
            Status::Sleeping => "Sleeping",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Status::Unavailable => "",
            Status::Awake => "👁️",
            Status::Sleeping => "😴",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What callers of the status endpoint receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub age: String,
    pub status: Status,
    pub heart_rate: Option<u32>,
    pub oxygen_saturation: Option<u32>,
}

impl StatusReport {
    /// Name and age only, used whenever live vitals can't be shown.
    pub fn degraded(name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
            status: Status::Unavailable,
            heart_rate: None,
            oxygen_saturation: None,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "👶 Baby {} is {}", self.name, self.age)?;

        match (self.status, self.heart_rate, self.oxygen_saturation) {
            (Status::Unavailable, _, _) => Ok(()),
            (status, Some(hr), Some(o2)) => write!(
                f,
                " ❤️ Heart: {} BPM 🫁 Oxygen: {}% {} {}",
                hr,
                o2,
                status.icon(),
                status
            ),
            (status, _, _) => write!(f, " {} {}", status.icon(), status),
        }
    }
}
