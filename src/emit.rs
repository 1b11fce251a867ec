//! Conversion of sessions, samples and device state into time-series records

use crate::clock::{local_epoch_to_utc, to_nanos};
use crate::config::LocationConfig;
use crate::error::Result;
use crate::juicenet::{DeviceState, PowerSample, Unit};
use crate::merge::MergedSession;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SESSION_MEASUREMENT: &str = "evse_sessions";
pub const DEVICE_MEASUREMENT: &str = "evse";
pub const POWER_MEASUREMENT: &str = "power_w";
pub const STATUS_MEASUREMENT: &str = "evse_status";
pub const DEVICE_DESCRIPTION: &str = "Juicebox EVSE";

/// A field value as the sink distinguishes them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One point for the time-series sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteRecord {
    pub measurement: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub tags: BTreeMap<String, String>,
    /// Nanoseconds since the epoch; `None` lets the server stamp it
    pub timestamp_ns: Option<i64>,
}

impl WriteRecord {
    fn new(measurement: &str, tags: &BTreeMap<String, String>, timestamp_ns: Option<i64>) -> Self {
        Self {
            measurement: measurement.to_string(),
            fields: BTreeMap::new(),
            tags: tags.clone(),
            timestamp_ns,
        }
    }

    fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// `HH:MM:SS` from whole seconds; hours keep counting past a day
pub fn format_duration_hms(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Tag set shared by every record of one unit
pub fn unit_tags(location: &LocationConfig, unit: &Unit) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("location_general".to_string(), location.general.clone()),
        ("location_specific".to_string(), location.specific.clone()),
        ("description".to_string(), DEVICE_DESCRIPTION.to_string()),
        ("device_id".to_string(), format!("juicebox-{}", unit.unit_id)),
        ("name".to_string(), unit.name.clone()),
    ])
}

/// Builds records for a single unit
#[derive(Debug, Clone)]
pub struct PointEmitter {
    tags: BTreeMap<String, String>,
    zone: Tz,
}

impl PointEmitter {
    pub fn new(location: &LocationConfig, unit: &Unit, zone: Tz) -> Self {
        Self {
            tags: unit_tags(location, unit),
            zone,
        }
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Start and end events for a merged session
    pub fn session_records(&self, session: &MergedSession) -> Result<[WriteRecord; 2]> {
        let duration_s = session.duration_seconds();

        let start_ns = to_nanos(session.start)?;
        let start = WriteRecord::new(SESSION_MEASUREMENT, &self.tags, Some(start_ns))
            .field("energy_Wh", session.energy_wh)
            .field("event", "start")
            .field("duration_s", duration_s)
            .field("duration_hms", format_duration_hms(duration_s));

        let end_ns = to_nanos(session.end)?;
        let end = WriteRecord::new(SESSION_MEASUREMENT, &self.tags, Some(end_ns))
            .field("energy_Wh", 0.0)
            .field("event", "end")
            .field("duration_s", 0i64)
            .field("duration_hms", "");

        Ok([start, end])
    }

    /// Device-series and generic power-series records for one sample, in watts
    pub fn sample_records(&self, sample: &PowerSample) -> Result<[WriteRecord; 2]> {
        let ts = to_nanos(local_epoch_to_utc(sample.t, self.zone)?)?;
        let watts = sample.v * 1000.0;

        Ok([
            WriteRecord::new(DEVICE_MEASUREMENT, &self.tags, Some(ts)).field("power_w", watts),
            WriteRecord::new(POWER_MEASUREMENT, &self.tags, Some(ts)).field("value", watts),
        ])
    }

    /// Instantaneous status snapshot, stamped by the server on arrival
    pub fn status_record(&self, state: &DeviceState) -> WriteRecord {
        WriteRecord::new(STATUS_MEASUREMENT, &self.tags, None)
            .field("state", state.state.as_str())
            .field("charging_limit_A", state.charging.amps_limit)
            .field("charging_current_A", state.charging.amps_current)
            .field("charging_voltage_V", state.charging.voltage)
            .field("charging_energy_Wh", state.charging.wh_energy)
            .field("charging_power_W", state.charging.watt_power)
            .field("lifetime_energy_Wh", state.lifetime.wh_energy)
            .field("temperature_°F", state.temperature * 1.8 + 32.0)
            .field("frequency_Hz", state.frequency / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::epoch_to_utc;
    use crate::juicenet::{ChargingState, LifetimeState};

    fn emitter() -> PointEmitter {
        let location = LocationConfig {
            general: "home".into(),
            specific: "garage".into(),
        };
        let unit = Unit {
            unit_id: "17".into(),
            name: "Driveway".into(),
            token: "tok".into(),
        };
        PointEmitter::new(&location, &unit, chrono_tz::UTC)
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration_hms(3725), "01:02:05");
        assert_eq!(format_duration_hms(0), "00:00:00");
        assert_eq!(format_duration_hms(26 * 3600 + 59), "26:00:59");
        assert_eq!(format_duration_hms(120 * 3600), "120:00:00");
    }

    #[test]
    fn tags_identify_the_unit() {
        let e = emitter();
        assert_eq!(e.tags()["device_id"], "juicebox-17");
        assert_eq!(e.tags()["name"], "Driveway");
        assert_eq!(e.tags()["description"], "Juicebox EVSE");
        assert_eq!(e.tags()["location_general"], "home");
        assert_eq!(e.tags()["location_specific"], "garage");
    }

    #[test]
    fn session_produces_start_and_end_events() {
        let session = MergedSession {
            start: epoch_to_utc(1_600_000_000).unwrap(),
            end: epoch_to_utc(1_600_003_725).unwrap(),
            energy_wh: 2500.0,
        };
        let [start, end] = emitter().session_records(&session).unwrap();

        assert_eq!(start.measurement, "evse_sessions");
        assert_eq!(start.timestamp_ns, Some(1_600_000_000_000_000_000));
        assert_eq!(start.fields["event"], FieldValue::Text("start".into()));
        assert_eq!(start.fields["energy_Wh"], FieldValue::Float(2500.0));
        assert_eq!(start.fields["duration_s"], FieldValue::Integer(3725));
        assert_eq!(start.fields["duration_hms"], FieldValue::Text("01:02:05".into()));

        assert_eq!(end.timestamp_ns, Some(1_600_003_725_000_000_000));
        assert_eq!(end.fields["event"], FieldValue::Text("end".into()));
        assert_eq!(end.fields["energy_Wh"], FieldValue::Float(0.0));
        assert_eq!(end.fields["duration_s"], FieldValue::Integer(0));
        assert_eq!(end.fields["duration_hms"], FieldValue::Text(String::new()));
    }

    #[test]
    fn samples_are_converted_to_watts() {
        let [device, generic] = emitter()
            .sample_records(&PowerSample::new(1_600_000_000, 7.2))
            .unwrap();
        assert_eq!(device.measurement, "evse");
        assert_eq!(device.fields["power_w"], FieldValue::Float(7200.0));
        assert_eq!(generic.measurement, "power_w");
        assert_eq!(generic.fields["value"], FieldValue::Float(7200.0));
        assert_eq!(device.timestamp_ns, generic.timestamp_ns);
        assert_eq!(device.timestamp_ns, Some(1_600_000_000_000_000_000));
    }

    #[test]
    fn status_converts_units() {
        let state = DeviceState {
            state: "charging".into(),
            charging: ChargingState {
                amps_limit: 40.0,
                amps_current: 31.5,
                voltage: 240.0,
                wh_energy: 1200.0,
                watt_power: 7560.0,
            },
            lifetime: LifetimeState { wh_energy: 1.5e6 },
            temperature: 25.0,
            frequency: 6001.0,
        };
        let record = emitter().status_record(&state);
        assert_eq!(record.measurement, "evse_status");
        assert_eq!(record.timestamp_ns, None);
        assert_eq!(record.fields["temperature_°F"], FieldValue::Float(77.0));
        assert_eq!(record.fields["frequency_Hz"], FieldValue::Float(60.01));
        assert_eq!(record.fields["state"], FieldValue::Text("charging".into()));
        assert_eq!(record.fields.len(), 9);
    }
}
