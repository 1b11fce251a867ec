use crate::error::{JuicesyncError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept identifiers the API sends either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(i) => i.to_string(),
        Id::Float(f) => f.to_string(),
    })
}

/// A charger registered to the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(deserialize_with = "string_or_number")]
    pub unit_id: String,
    pub name: String,
    /// Per-unit token required by every `box_api_secure` command
    pub token: String,
}

/// One charging interval as reported upstream, before merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Device-local epoch seconds
    pub time_start: i64,
    /// Device-local epoch seconds
    pub time_end: i64,
    #[serde(rename = "wh_energy")]
    pub energy_wh: f64,
}

/// One page of session history, newest first
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryPage {
    pub sessions: Vec<RawSession>,
    #[serde(default)]
    pub continuity_token: Option<String>,
}

impl HistoryPage {
    /// Continuation cursor, treating an empty token as absent
    pub fn next_token(&self) -> Option<&str> {
        self.continuity_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// A single power reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Device-local epoch seconds
    pub t: i64,
    /// Power in kW
    pub v: f64,
}

impl PowerSample {
    pub fn new(t: i64, v: f64) -> Self {
        Self { t, v }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ChargingState {
    pub amps_limit: f64,
    pub amps_current: f64,
    pub voltage: f64,
    pub wh_energy: f64,
    pub watt_power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LifetimeState {
    pub wh_energy: f64,
}

/// Instantaneous device snapshot from `get_state`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceState {
    pub state: String,
    pub charging: ChargingState,
    pub lifetime: LifetimeState,
    /// Degrees Celsius
    pub temperature: f64,
    /// Hundredths of a Hertz
    pub frequency: f64,
}

/// Commands understood by the JuiceNet API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    GetAccountUnits,
    GetHistory {
        token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        continuity_token: Option<String>,
    },
    GetPlot {
        token: String,
        attribute: String,
        intervals: u32,
        session_id: String,
    },
    GetState {
        token: String,
    },
}

impl Command {
    /// Power plot for one session
    pub fn power_plot(token: &str, session_id: &str, intervals: u32) -> Self {
        Self::GetPlot {
            token: token.to_string(),
            attribute: "power".to_string(),
            intervals,
            session_id: session_id.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAccountUnits => "get_account_units",
            Self::GetHistory { .. } => "get_history",
            Self::GetPlot { .. } => "get_plot",
            Self::GetState { .. } => "get_state",
        }
    }

    /// Path under the API base URL the command is posted to
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::GetAccountUnits => "box_pin",
            _ => "box_api_secure",
        }
    }

    /// Full request body including the account credentials
    pub fn to_body(&self, device_id: &str, account_token: &str) -> Result<serde_json::Value> {
        let mut body = serde_json::to_value(self)?;
        let map = body
            .as_object_mut()
            .ok_or_else(|| JuicesyncError::serialization("command did not encode as an object"))?;
        map.insert("device_id".into(), device_id.into());
        map.insert("account_token".into(), account_token.into());
        Ok(body)
    }
}

#[derive(Deserialize)]
struct UnitsBody {
    units: Vec<Unit>,
}

#[derive(Deserialize)]
struct PlotBody {
    points: Vec<PowerSample>,
}

/// Decoded response, one variant per command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Units(Vec<Unit>),
    History(HistoryPage),
    Plot(Vec<PowerSample>),
    State(DeviceState),
}

impl Reply {
    /// Decode a response body according to the command that produced it
    pub fn decode(command: &Command, body: &[u8]) -> Result<Self> {
        let reply = match command {
            Command::GetAccountUnits => {
                Self::Units(serde_json::from_slice::<UnitsBody>(body)?.units)
            }
            Command::GetHistory { .. } => Self::History(serde_json::from_slice(body)?),
            Command::GetPlot { .. } => {
                Self::Plot(serde_json::from_slice::<PlotBody>(body)?.points)
            }
            Command::GetState { .. } => Self::State(serde_json::from_slice(body)?),
        };
        Ok(reply)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Units(_) => "units",
            Self::History(_) => "history",
            Self::Plot(_) => "plot",
            Self::State(_) => "state",
        }
    }

    pub fn into_units(self) -> Result<Vec<Unit>> {
        match self {
            Self::Units(units) => Ok(units),
            other => Err(unexpected("units", &other)),
        }
    }

    pub fn into_history(self) -> Result<HistoryPage> {
        match self {
            Self::History(page) => Ok(page),
            other => Err(unexpected("history", &other)),
        }
    }

    pub fn into_plot(self) -> Result<Vec<PowerSample>> {
        match self {
            Self::Plot(points) => Ok(points),
            other => Err(unexpected("plot", &other)),
        }
    }

    pub fn into_state(self) -> Result<DeviceState> {
        match self {
            Self::State(state) => Ok(state),
            other => Err(unexpected("state", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &Reply) -> JuicesyncError {
    JuicesyncError::api(format!("expected {} reply, got {}", wanted, got.kind()))
}
