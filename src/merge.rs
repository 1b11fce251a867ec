//! Charging session reconciliation
//!
//! The charger splits one plug-in into several history records whenever the
//! car pauses or the station restarts. This module folds records separated by
//! less than a small gap back into one logical session.

use crate::clock::{Timestamp, local_epoch_to_utc};
use crate::error::Result;
use crate::juicenet::RawSession;
use crate::logging::{StructuredLogger, get_logger};
use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Serialize;

/// Records closer together than this are one session
pub const DEFAULT_MAX_GAP_SECONDS: i64 = 300;

/// A logical charging session after gap-based coalescing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedSession {
    pub start: Timestamp,
    pub end: Timestamp,
    pub energy_wh: f64,
}

impl MergedSession {
    /// Whole seconds between start and end
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Coalesces newest-first raw sessions into merged sessions
#[derive(Debug, Clone)]
pub struct SessionMerger {
    zone: Tz,
    max_gap: TimeDelta,
    logger: StructuredLogger,
}

impl SessionMerger {
    pub fn new(zone: Tz, max_gap_seconds: i64) -> Self {
        Self {
            zone,
            max_gap: TimeDelta::seconds(max_gap_seconds),
            logger: get_logger("merge"),
        }
    }

    /// Merge `raw` (newest first). Output keeps the input's relative order.
    pub fn merge(&self, raw: &[RawSession]) -> Result<Vec<MergedSession>> {
        let mut merged = Vec::new();
        let mut open: Option<MergedSession> = None;

        for session in raw {
            let t_start = local_epoch_to_utc(session.time_start, self.zone)?;
            let t_end = local_epoch_to_utc(session.time_end, self.zone)?;

            match open.as_mut() {
                // Negative gap means the records overlap
                Some(current) if current.start - t_end < self.max_gap => {
                    current.energy_wh += session.energy_wh;
                    // A record nested inside the open session keeps the earlier start
                    current.start = current.start.min(t_start);
                    self.logger.trace(&format!(
                        "session {} joins open session, now {}..{}",
                        session.id, current.start, current.end
                    ));
                }
                _ => {
                    if let Some(done) = open.take() {
                        merged.push(done);
                    }
                    if t_end < t_start {
                        self.logger.warn(&format!(
                            "session {} ends at {} before it starts at {}, using the start",
                            session.id, t_end, t_start
                        ));
                    }
                    open = Some(MergedSession {
                        start: t_start,
                        end: t_end.max(t_start),
                        energy_wh: session.energy_wh,
                    });
                }
            }
        }
        merged.extend(open);

        self.logger.debug(&format!(
            "merged {} raw sessions into {}",
            raw.len(),
            merged.len()
        ));
        Ok(merged)
    }
}

/// Convenience wrapper around [`SessionMerger::merge`]
pub fn merge_sessions(
    raw: &[RawSession],
    max_gap_seconds: i64,
    zone: Tz,
) -> Result<Vec<MergedSession>> {
    SessionMerger::new(zone, max_gap_seconds).merge(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use chrono_tz::US::Eastern;

    fn wall(s: &str) -> i64 {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn at(s: &str) -> Timestamp {
        local_epoch_to_utc(wall(s), Eastern).unwrap()
    }

    fn raw(id: &str, start: &str, end: &str, wh: f64) -> RawSession {
        RawSession {
            id: id.to_string(),
            time_start: wall(start),
            time_end: wall(end),
            energy_wh: wh,
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(merge_sessions(&[], 300, Eastern).unwrap().is_empty());
    }

    #[test]
    fn single_session_passes_through() {
        let out = merge_sessions(
            &[raw("1", "2021-07-01 14:00", "2021-07-01 15:00", 3000.0)],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, at("2021-07-01 14:00"));
        assert_eq!(out[0].end, at("2021-07-01 15:00"));
        assert!((out[0].energy_wh - 3000.0).abs() < 1e-9);
        assert_eq!(out[0].duration_seconds(), 3600);
    }

    #[test]
    fn gap_just_under_threshold_merges() {
        let out = merge_sessions(
            &[
                raw("2", "2021-07-01 15:04", "2021-07-01 16:00", 100.0),
                raw("1", "2021-07-01 14:00", "2021-07-01 15:00", 200.0),
            ],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, at("2021-07-01 14:00"));
        assert!((out[0].energy_wh - 300.0).abs() < 1e-9);
    }

    #[test]
    fn gap_at_threshold_splits() {
        let out = merge_sessions(
            &[
                raw("2", "2021-07-01 15:05", "2021-07-01 16:00", 100.0),
                raw("1", "2021-07-01 14:00", "2021-07-01 15:00", 200.0),
            ],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        // Newest first, like the input
        assert!(out[0].start > out[1].start);
        assert!((out[0].energy_wh - 100.0).abs() < 1e-9);
        assert!((out[1].energy_wh - 200.0).abs() < 1e-9);
    }

    #[test]
    fn chain_of_short_gaps_collapses_into_one() {
        let out = merge_sessions(
            &[
                raw("3", "2021-07-01 16:02", "2021-07-01 17:00", 1.0),
                raw("2", "2021-07-01 15:01", "2021-07-01 16:00", 2.0),
                raw("1", "2021-07-01 14:00", "2021-07-01 15:00", 4.0),
                raw("0", "2021-06-30 09:00", "2021-06-30 10:00", 8.0),
            ],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].energy_wh - 7.0).abs() < 1e-9);
        assert_eq!(out[0].duration_seconds(), 3 * 3600);
        assert!((out[1].energy_wh - 8.0).abs() < 1e-9);
    }

    #[test]
    fn nested_record_keeps_the_earlier_start() {
        // Older record lies entirely inside the open session
        let out = merge_sessions(
            &[
                raw("2", "2021-07-01 14:00", "2021-07-01 16:00", 500.0),
                raw("1", "2021-07-01 14:30", "2021-07-01 15:00", 100.0),
            ],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, at("2021-07-01 14:00"));
        assert_eq!(out[0].end, at("2021-07-01 16:00"));
        assert!((out[0].energy_wh - 600.0).abs() < 1e-9);
    }

    #[test]
    fn end_before_start_is_clamped_to_start() {
        let out = merge_sessions(
            &[raw("1", "2021-07-01 14:00", "2021-07-01 13:50", 10.0)],
            300,
            Eastern,
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, at("2021-07-01 14:00"));
        assert_eq!(out[0].end, out[0].start);
        assert_eq!(out[0].duration_seconds(), 0);
    }
}
