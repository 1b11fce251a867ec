//! Per-session power series
//!
//! Upstream plots begin and end wherever sampling happened to start, often
//! mid-charge. Rendering or integrating such a series draws a vertical cliff at
//! each edge, so the series is closed with synthetic zero readings one second
//! outside the real data.

use crate::error::Result;
use crate::juicenet::{PowerSample, SessionSource, Unit};
use crate::logging::{StructuredLogger, get_logger};

/// Sample-count hint large enough that the API returns its natural density
pub const FULL_DENSITY_INTERVALS: u32 = 1_000_000;

/// Close a series with zero samples at both ends where it is not already zero
pub fn pad_samples(samples: &[PowerSample]) -> Vec<PowerSample> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };

    let mut padded = Vec::with_capacity(samples.len() + 2);
    if first.v != 0.0 {
        padded.push(PowerSample::new(first.t - 1, 0.0));
    }
    padded.extend_from_slice(samples);
    if last.v != 0.0 {
        padded.push(PowerSample::new(last.t + 1, 0.0));
    }
    padded
}

/// Fetches and pads power samples for sessions of one account
pub struct PointSeriesBuilder<'a> {
    source: &'a dyn SessionSource,
    intervals: u32,
    logger: StructuredLogger,
}

impl<'a> PointSeriesBuilder<'a> {
    pub fn new(source: &'a dyn SessionSource) -> Self {
        Self::with_intervals(source, FULL_DENSITY_INTERVALS)
    }

    pub fn with_intervals(source: &'a dyn SessionSource, intervals: u32) -> Self {
        Self {
            source,
            intervals,
            logger: get_logger("points"),
        }
    }

    /// Padded samples for `session_id`; empty when the API has no data for it
    pub async fn build_points(&self, unit: &Unit, session_id: &str) -> Result<Vec<PowerSample>> {
        let samples = self
            .source
            .power_samples(unit, session_id, self.intervals)
            .await?;

        if samples.is_empty() {
            self.logger
                .for_unit(&unit.unit_id)
                .warn(&format!("no power data for session {}", session_id));
            return Ok(Vec::new());
        }

        let padded = pad_samples(&samples);
        self.logger.for_unit(&unit.unit_id).debug(&format!(
            "session {}: {} samples ({} after padding)",
            session_id,
            samples.len(),
            padded.len()
        ));
        Ok(padded)
    }
}
