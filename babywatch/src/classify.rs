//! Awake/asleep classification for samples that passed the worn check.
//!
//! The decision table is an ordered rule list rather than nested branches:
//! decision rules run first-match-wins, a movement fallback closes the table
//! so every sample gets an answer, and override rules run last and can only
//! force `Awake`.

use crate::model::{Status, TelemetrySample};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Movement strictly above this is awake (primary rule).
    pub movement_awake: u32,
    /// Movement at or below this is sleeping when no sleep code is reported.
    pub fallback_sleep_movement_max: u32,
    /// Movement strictly above this forces awake.
    pub movement_override: u32,
    /// Heart rate strictly above this forces awake.
    pub heart_rate_override: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            movement_awake: 2,
            fallback_sleep_movement_max: 5,
            movement_override: 25,
            heart_rate_override: 150,
        }
    }
}

/// Successive tunings of the decision table. `MovementPrimary` is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSetVersion {
    #[default]
    MovementPrimary,
    SleepCodePrimary,
    SleepCodeOnly,
    MovementOnly,
}

impl RuleSetVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSetVersion::MovementPrimary => "movement-primary",
            RuleSetVersion::SleepCodePrimary => "sleep-code-primary",
            RuleSetVersion::SleepCodeOnly => "sleep-code-only",
            RuleSetVersion::MovementOnly => "movement-only",
        }
    }
}

impl fmt::Display for RuleSetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSetVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movement-primary" => Ok(RuleSetVersion::MovementPrimary),
            "sleep-code-primary" => Ok(RuleSetVersion::SleepCodePrimary),
            "sleep-code-only" => Ok(RuleSetVersion::SleepCodeOnly),
            "movement-only" => Ok(RuleSetVersion::MovementOnly),
            other => Err(format!("unknown classifier rule set '{}'", other)),
        }
    }
}

/// A decision rule. Returns `None` when it has nothing to say about a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    MovementAwake { above: u32 },
    SleepCode,
}

impl Rule {
    pub fn evaluate(&self, sample: &TelemetrySample) -> Option<Status> {
        match *self {
            Rule::MovementAwake { above } => (sample.movement() > above).then_some(Status::Awake),
            Rule::SleepCode => sample.sleep_state.map(|code| {
                if code == 0 {
                    Status::Awake
                } else {
                    Status::Sleeping
                }
            }),
        }
    }
}

/// Terminal rule; always answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementFallback {
    pub sleeping_at_most: u32,
}

impl MovementFallback {
    pub fn evaluate(&self, sample: &TelemetrySample) -> Status {
        if sample.movement() <= self.sleeping_at_most {
            Status::Sleeping
        } else {
            Status::Awake
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    MovementAbove(u32),
    HeartRateAbove(u32),
}

impl Override {
    pub fn fires(&self, sample: &TelemetrySample) -> bool {
        match *self {
            Override::MovementAbove(limit) => sample.movement() > limit,
            Override::HeartRateAbove(limit) => sample.heart_rate.is_some_and(|hr| hr > limit),
        }
    }
}

/// Which rule produced a status, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub status: Status,
    /// `None` when the fallback decided.
    pub rule: Option<Rule>,
    pub overridden_by: Option<Override>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusClassifier {
    version: RuleSetVersion,
    rules: Vec<Rule>,
    fallback: MovementFallback,
    overrides: Vec<Override>,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new(RuleSetVersion::default(), Thresholds::default())
    }
}

impl StatusClassifier {
    pub fn new(version: RuleSetVersion, thresholds: Thresholds) -> Self {
        let movement = Rule::MovementAwake {
            above: thresholds.movement_awake,
        };

        let rules = match version {
            RuleSetVersion::MovementPrimary => vec![movement, Rule::SleepCode],
            RuleSetVersion::SleepCodePrimary => vec![Rule::SleepCode, movement],
            RuleSetVersion::SleepCodeOnly => vec![Rule::SleepCode],
            RuleSetVersion::MovementOnly => Vec::new(),
        };

        Self {
            version,
            rules,
            fallback: MovementFallback {
                sleeping_at_most: thresholds.fallback_sleep_movement_max,
            },
            overrides: vec![
                Override::MovementAbove(thresholds.movement_override),
                Override::HeartRateAbove(thresholds.heart_rate_override),
            ],
        }
    }

    pub fn version(&self) -> RuleSetVersion {
        self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    pub fn explain(&self, sample: &TelemetrySample) -> Decision {
        let (status, rule) = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(sample).map(|status| (status, Some(*rule))))
            .unwrap_or_else(|| (self.fallback.evaluate(sample), None));

        match self.overrides.iter().find(|o| o.fires(sample)) {
            Some(o) => Decision {
                status: Status::Awake,
                rule,
                overridden_by: Some(*o),
            },
            None => Decision {
                status,
                rule,
                overridden_by: None,
            },
        }
    }

    pub fn classify(&self, sample: &TelemetrySample) -> Status {
        self.explain(sample).status
    }
}
