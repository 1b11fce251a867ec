#![allow(dead_code)]

use juicesync::JuicesyncError;
use juicesync::emit::WriteRecord;
use juicesync::influx::PointSink;
use juicesync::juicenet::{
    ChargingState, DeviceState, HistoryPage, LifetimeState, PowerSample, RawSession,
    SessionSource, Unit,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub fn unit(id: &str) -> Unit {
    Unit {
        unit_id: id.to_string(),
        name: format!("Charger {}", id),
        token: format!("tok-{}", id),
    }
}

pub fn raw(id: &str, start: i64, end: i64, wh: f64) -> RawSession {
    RawSession {
        id: id.to_string(),
        time_start: start,
        time_end: end,
        energy_wh: wh,
    }
}

pub fn page(sessions: Vec<RawSession>, next: Option<&str>) -> HistoryPage {
    HistoryPage {
        sessions,
        continuity_token: next.map(str::to_string),
    }
}

pub fn idle_state() -> DeviceState {
    DeviceState {
        state: "standby".into(),
        charging: ChargingState {
            amps_limit: 32.0,
            amps_current: 0.0,
            voltage: 241.0,
            wh_energy: 0.0,
            watt_power: 0.0,
        },
        lifetime: LifetimeState { wh_energy: 812_345.0 },
        temperature: 20.0,
        frequency: 5998.0,
    }
}

/// Scripted history step: a page, or an upstream failure
pub enum Step {
    Page(HistoryPage),
    Fail,
}

/// In-memory `SessionSource` replaying scripted pages per unit token
#[derive(Default)]
pub struct FakeSource {
    units: Vec<Unit>,
    pages: Mutex<HashMap<String, VecDeque<Step>>>,
    plots: HashMap<String, Vec<PowerSample>>,
    states: HashMap<String, DeviceState>,
    pub history_calls: Mutex<Vec<(String, Option<String>)>>,
    pub plot_calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSource {
    pub fn new(units: Vec<Unit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn with_steps(self, unit: &Unit, steps: Vec<Step>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(unit.token.clone(), steps.into_iter().collect());
        self
    }

    pub fn with_plot(mut self, session_id: &str, samples: Vec<PowerSample>) -> Self {
        self.plots.insert(session_id.to_string(), samples);
        self
    }

    pub fn with_state(mut self, unit: &Unit, state: DeviceState) -> Self {
        self.states.insert(unit.token.clone(), state);
        self
    }

    pub fn history_call_count(&self) -> usize {
        self.history_calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SessionSource for FakeSource {
    async fn units(&self) -> juicesync::Result<Vec<Unit>> {
        Ok(self.units.clone())
    }

    async fn history_page(
        &self,
        unit: &Unit,
        continuity_token: Option<&str>,
    ) -> juicesync::Result<HistoryPage> {
        self.history_calls
            .lock()
            .unwrap()
            .push((unit.token.clone(), continuity_token.map(str::to_string)));
        let next = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&unit.token)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Step::Page(page)) => Ok(page),
            Some(Step::Fail) => Err(JuicesyncError::api("get_history failed with HTTP 500")),
            None => Ok(HistoryPage::default()),
        }
    }

    async fn power_samples(
        &self,
        _unit: &Unit,
        session_id: &str,
        intervals: u32,
    ) -> juicesync::Result<Vec<PowerSample>> {
        self.plot_calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), intervals));
        Ok(self.plots.get(session_id).cloned().unwrap_or_default())
    }

    async fn device_state(&self, unit: &Unit) -> juicesync::Result<DeviceState> {
        self.states
            .get(&unit.token)
            .cloned()
            .ok_or_else(|| JuicesyncError::api("get_state failed with HTTP 404"))
    }
}

/// Sink that keeps every batch it receives
#[derive(Default)]
pub struct MemorySink {
    pub batches: Mutex<Vec<Vec<WriteRecord>>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<WriteRecord> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait::async_trait]
impl PointSink for MemorySink {
    async fn write_points(&self, records: &[WriteRecord]) -> juicesync::Result<()> {
        if self.fail {
            return Err(JuicesyncError::sink("write failed with HTTP 500"));
        }
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}
