use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{json, Value};

/// One synthetic sock reading, in vendor property terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SockReading {
    pub heart_rate: Option<u32>,
    pub oxygen_level: Option<u32>,
    pub movement: Option<u32>,
    pub sleep_state: Option<u32>,
    pub sock_off: Option<u32>,
}

impl SockReading {
    /// What the cloud reports while the sock is still settling: every
    /// property present but null.
    pub fn settling() -> Self {
        Self::default()
    }

    /// The property list an SS3 sock publishes: vitals packed into one
    /// JSON-encoded `REAL_TIME_VITALS` value, plus the off-foot flag.
    pub fn properties(&self, dsn: &str, updated_at: DateTime<Utc>) -> Vec<Value> {
        let vitals = if self.has_vitals() {
            Value::String(self.vitals_document().to_string())
        } else {
            Value::Null
        };

        [
            ("REAL_TIME_VITALS", "string", vitals),
            ("SOCK_OFF", "integer", json!(self.sock_off)),
        ]
        .into_iter()
        .map(|(name, base_type, value)| {
            json!({
                "property": {
                    "name": name,
                    "base_type": base_type,
                    "value": value,
                    "device_key": dsn,
                    "data_updated_at": updated_at.to_rfc3339(),
                }
            })
        })
        .collect()
    }

    fn has_vitals(&self) -> bool {
        self.heart_rate.is_some()
            || self.oxygen_level.is_some()
            || self.movement.is_some()
            || self.sleep_state.is_some()
    }

    fn vitals_document(&self) -> Value {
        json!({
            "hr": self.heart_rate,
            "ox": self.oxygen_level,
            "mv": self.movement,
            "ss": self.sleep_state,
        })
    }
}

pub fn generate_reading(rng: &mut impl Rng) -> SockReading {
    if rng.gen_bool(0.05) {
        // 5% sock off the foot: the device reports a double zero
        return SockReading {
            heart_rate: Some(0),
            oxygen_level: Some(0),
            movement: Some(0),
            sleep_state: Some(0),
            sock_off: Some(1),
        };
    }

    if rng.gen_bool(0.03) {
        // 3% vitals dropped
        return SockReading {
            heart_rate: None,
            oxygen_level: None,
            movement: Some(rng.gen_range(0..=3)),
            sleep_state: None,
            sock_off: Some(0),
        };
    }

    let asleep = rng.gen_bool(0.6);

    let movement = if rng.gen_bool(0.03) {
        rng.gen_range(26..=60) // 3% motion bursts
    } else if asleep {
        rng.gen_range(0..=2)
    } else {
        rng.gen_range(0..=12)
    };

    let heart_rate = if rng.gen_bool(0.02) {
        rng.gen_range(151..=185) // 2% tachycardia spikes
    } else if asleep {
        rng.gen_range(95..=130)
    } else {
        rng.gen_range(115..=150)
    };

    let sleep_state = if asleep {
        if rng.gen_bool(0.5) {
            1
        } else {
            8
        }
    } else {
        0
    };

    SockReading {
        heart_rate: Some(heart_rate),
        oxygen_level: Some(rng.gen_range(94..=100)),
        movement: Some(movement),
        sleep_state: Some(sleep_state),
        sock_off: Some(0),
    }
}
