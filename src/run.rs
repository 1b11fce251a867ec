//! Top-level runs
//!
//! A history run exports new charging sessions (and optionally their power
//! curves) since the checkpoint; a status run exports one live snapshot per
//! charger. Each run owns its record buffer and writes it in a single batch.

use crate::checkpoint::CheckpointStore;
use crate::clock::{Timestamp, epoch_to_utc};
use crate::config::Config;
use crate::emit::{PointEmitter, WriteRecord};
use crate::error::Result;
use crate::history::{CutoffWindow, SessionPaginator};
use crate::influx::PointSink;
use crate::juicenet::SessionSource;
use crate::logging::{StructuredLogger, get_logger};
use crate::merge::SessionMerger;
use crate::points::PointSeriesBuilder;
use chrono_tz::Tz;

/// Counters reported at the end of a history run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub units: usize,
    pub raw_sessions: usize,
    pub merged_sessions: usize,
    pub samples: usize,
    pub records: usize,
    /// New checkpoint, when the run advanced it
    pub checkpoint: Option<Timestamp>,
}

/// Exports session history since the stored checkpoint
pub struct HistoryRun<'a> {
    config: &'a Config,
    source: &'a dyn SessionSource,
    sink: &'a dyn PointSink,
    checkpoints: &'a dyn CheckpointStore,
    zone: Tz,
    persist_checkpoint: bool,
    logger: StructuredLogger,
}

impl<'a> HistoryRun<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn SessionSource,
        sink: &'a dyn PointSink,
        checkpoints: &'a dyn CheckpointStore,
    ) -> Result<Self> {
        Ok(Self {
            config,
            source,
            sink,
            checkpoints,
            zone: config.source_zone()?,
            persist_checkpoint: true,
            logger: get_logger("run"),
        })
    }

    /// Read the checkpoint but never write it back
    pub fn without_checkpoint_update(mut self) -> Self {
        self.persist_checkpoint = false;
        self
    }

    /// Run once. `before` turns the run into a backfill of sessions that
    /// started before it; backfills leave the checkpoint alone.
    ///
    /// Any upstream or sink failure aborts the run before the checkpoint is
    /// touched, so the next run retries the same window.
    pub async fn execute(&self, before: Option<Timestamp>) -> Result<HistorySummary> {
        let after = self.checkpoints.load()?;
        let window = match before {
            Some(before) => CutoffWindow::before(after, before),
            None => CutoffWindow::after(after),
        };
        self.logger
            .info(&format!("Looking for charging sessions after {}", after));

        let paginator = SessionPaginator::new(self.source);
        let merger = SessionMerger::new(self.zone, self.config.history.max_gap_seconds);
        let builder =
            PointSeriesBuilder::with_intervals(self.source, self.config.juicenet.plot_intervals);

        let units = self.source.units().await?;
        let mut summary = HistorySummary {
            units: units.len(),
            ..HistorySummary::default()
        };
        let mut records: Vec<WriteRecord> = Vec::new();
        let mut newest_end: Option<Timestamp> = None;

        for unit in &units {
            let logger = self.logger.for_unit(&unit.unit_id);
            let emitter = PointEmitter::new(&self.config.location, unit, self.zone);

            let sessions = paginator.fetch_sessions(unit, &window).await?;
            let merged = merger.merge(&sessions)?;
            logger.info(&format!(
                "{}: {} sessions, {} combined sessions",
                unit.name,
                sessions.len(),
                merged.len()
            ));

            for session in &merged {
                records.extend(emitter.session_records(session)?);
            }

            if self.config.history.fetch_power_samples {
                for raw in &sessions {
                    let samples = builder.build_points(unit, &raw.id).await?;
                    summary.samples += samples.len();
                    for sample in &samples {
                        records.extend(emitter.sample_records(sample)?);
                    }
                }
            }

            // Raw value, matching how the paginator compares against the checkpoint
            if let Some(latest) = sessions.first() {
                let end = epoch_to_utc(latest.time_end)?;
                newest_end = Some(newest_end.map_or(end, |n| n.max(end)));
            }

            summary.raw_sessions += sessions.len();
            summary.merged_sessions += merged.len();
        }

        summary.records = records.len();
        self.logger.info(&format!("Got {} points", records.len()));
        if !records.is_empty() {
            self.sink.write_points(&records).await?;
        }

        let advanced = newest_end.filter(|end| before.is_none() && *end > after);
        if let Some(checkpoint) = advanced
            && self.persist_checkpoint
        {
            self.checkpoints.save(checkpoint)?;
            summary.checkpoint = Some(checkpoint);
        }
        Ok(summary)
    }
}

/// Exports one `evse_status` snapshot per unit
pub struct StatusRun<'a> {
    config: &'a Config,
    source: &'a dyn SessionSource,
    sink: &'a dyn PointSink,
    logger: StructuredLogger,
}

impl<'a> StatusRun<'a> {
    pub fn new(config: &'a Config, source: &'a dyn SessionSource, sink: &'a dyn PointSink) -> Self {
        Self {
            config,
            source,
            sink,
            logger: get_logger("status"),
        }
    }

    /// Returns the number of records written
    pub async fn execute(&self) -> Result<usize> {
        let zone = self.config.source_zone()?;
        let units = self.source.units().await?;

        let mut records = Vec::with_capacity(units.len());
        for unit in &units {
            let state = self.source.device_state(unit).await?;
            self.logger
                .for_unit(&unit.unit_id)
                .debug(&format!("{} is {}", unit.name, state.state));
            let emitter = PointEmitter::new(&self.config.location, unit, zone);
            records.push(emitter.status_record(&state));
        }

        self.logger.info(&format!("Got {} points", records.len()));
        if !records.is_empty() {
            self.sink.write_points(&records).await?;
        }
        Ok(records.len())
    }
}
