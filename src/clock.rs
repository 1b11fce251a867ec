//! Timestamp conversions
//!
//! The charger reports wall-clock time as if it were UTC epoch seconds. Session
//! boundaries and power samples are reinterpreted in the configured source zone
//! before they become real instants; cutoff comparisons and the checkpoint use
//! the raw value unchanged.

use crate::error::{JuicesyncError, Result};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// A canonical UTC instant
pub type Timestamp = DateTime<Utc>;

/// Raw epoch seconds taken at face value as UTC
pub fn epoch_to_utc(secs: i64) -> Result<Timestamp> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        JuicesyncError::validation("timestamp", format!("{} is out of range", secs))
    })
}

/// Raw epoch seconds reinterpreted as wall-clock time in `zone`
pub fn local_epoch_to_utc(secs: i64, zone: Tz) -> Result<Timestamp> {
    let naive = epoch_to_utc(secs)?.naive_utc();
    reinterpret(naive, zone)
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            JuicesyncError::validation(
                "timestamp",
                format!("{} cannot be placed in {}", naive, zone),
            )
        })
}

fn reinterpret(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        // Repeated hour at the end of DST: first occurrence
        LocalResult::Ambiguous(first, _) => Some(first),
        // Skipped hour at the start of DST: keep the offset in force before the jump
        LocalResult::None => {
            let hour = TimeDelta::hours(1);
            zone.from_local_datetime(&(naive - hour))
                .earliest()
                .map(|dt| dt + hour)
        }
    }
}

/// Nanoseconds since the epoch, as the time-series sink expects
pub fn to_nanos(ts: Timestamp) -> Result<i64> {
    ts.timestamp_nanos_opt().ok_or_else(|| {
        JuicesyncError::validation("timestamp", format!("{} does not fit in nanoseconds", ts))
    })
}
