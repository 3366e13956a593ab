#![allow(dead_code)]

use async_trait::async_trait;
use babywatch::{DeviceDescriptor, Error, Result, Session, TelemetrySample, TelemetrySource};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub enum Step {
    Sample(TelemetrySample),
    Fail,
    /// Never answers within any sane attempt timeout.
    Hang,
}

/// In-memory vendor cloud that replays a script of fetch results.
pub struct ScriptedSource {
    reject_sign_in: bool,
    devices: Vec<DeviceDescriptor>,
    steps: Mutex<VecDeque<Step>>,
    /// Returned once the script runs out.
    steady: TelemetrySample,
    fetch_calls: AtomicU32,
    fetched_ids: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            reject_sign_in: false,
            devices: vec![sock("Dream Sock", "SS3", "AC000W100")],
            steps: Mutex::new(steps.into()),
            steady: TelemetrySample::default(),
            fetch_calls: AtomicU32::new(0),
            fetched_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn steady(sample: TelemetrySample) -> Self {
        Self {
            steady: sample,
            ..Self::new(Vec::new())
        }
    }

    pub fn rejecting_sign_in() -> Self {
        Self {
            reject_sign_in: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetched_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySource for ScriptedSource {
    async fn authenticate(&self) -> Result<Session> {
        if self.reject_sign_in {
            return Err(Error::Auth("HTTP 401 Unauthorized".to_string()));
        }
        Ok(session())
    }

    async fn list_devices(&self, _session: &Session) -> Result<Vec<DeviceDescriptor>> {
        Ok(self.devices.clone())
    }

    async fn fetch_properties(
        &self,
        _session: &Session,
        device: &DeviceDescriptor,
    ) -> Result<TelemetrySample> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().push(device.id.clone());

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Sample(sample)) => Ok(sample),
            Some(Step::Fail) => Err(Error::Transport("connection reset by peer".to_string())),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(self.steady)
            }
            None => Ok(self.steady),
        }
    }
}

pub fn session() -> Session {
    Session {
        token: "test-token".to_string(),
    }
}

pub fn sock(name: &str, model: &str, id: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        name: name.to_string(),
        model: model.to_string(),
        id: id.to_string(),
    }
}

pub fn reading(
    heart_rate: u32,
    oxygen_saturation: u32,
    movement: u32,
    sleep_state: Option<u32>,
) -> TelemetrySample {
    TelemetrySample {
        heart_rate: Some(heart_rate),
        oxygen_saturation: Some(oxygen_saturation),
        movement: Some(movement),
        sleep_state,
        off_body: None,
    }
}
