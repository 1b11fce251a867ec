//! Session history pagination
//!
//! History arrives newest first, one page at a time. Without an upper bound the
//! first record at or before the checkpoint proves everything after it is old,
//! so the scan stops there instead of walking the account's full history.

use crate::clock::{Timestamp, epoch_to_utc};
use crate::error::Result;
use crate::juicenet::{HistoryPage, RawSession, SessionSource, Unit};
use crate::logging::{StructuredLogger, get_logger};

/// Exclusive time bounds for the sessions a run cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffWindow {
    pub after: Timestamp,
    pub before: Option<Timestamp>,
}

/// What to do with one history record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordVerdict {
    Include,
    Skip,
    /// Out of window and everything older is too: end pagination
    StopPagination,
}

/// Outcome of scanning one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSignal {
    Continue,
    Stop,
}

impl CutoffWindow {
    /// Everything that started after `after`
    pub fn after(after: Timestamp) -> Self {
        Self {
            after,
            before: None,
        }
    }

    /// Backfill window. With `before` set, `after` is not consulted.
    pub fn before(after: Timestamp, before: Timestamp) -> Self {
        Self {
            after,
            before: Some(before),
        }
    }

    /// Classify a record by its raw start time
    pub fn classify(&self, session: &RawSession) -> Result<RecordVerdict> {
        let start = epoch_to_utc(session.time_start)?;
        let verdict = match self.before {
            Some(before) if start < before => RecordVerdict::Include,
            Some(_) => RecordVerdict::Skip,
            None if start > self.after => RecordVerdict::Include,
            None => RecordVerdict::StopPagination,
        };
        Ok(verdict)
    }

    /// Append in-window records of `page` to `out`, in page order
    pub fn scan_page(&self, page: &[RawSession], out: &mut Vec<RawSession>) -> Result<ScanSignal> {
        for session in page {
            match self.classify(session)? {
                RecordVerdict::Include => out.push(session.clone()),
                RecordVerdict::Skip => {}
                RecordVerdict::StopPagination => return Ok(ScanSignal::Stop),
            }
        }
        Ok(ScanSignal::Continue)
    }
}

enum PaginatorState {
    Fetching { token: Option<String> },
    ScanningPage(HistoryPage),
    Done,
}

/// Drives a [`SessionSource`] across history pages for one unit
pub struct SessionPaginator<'a> {
    source: &'a dyn SessionSource,
    logger: StructuredLogger,
}

impl<'a> SessionPaginator<'a> {
    pub fn new(source: &'a dyn SessionSource) -> Self {
        Self {
            source,
            logger: get_logger("history"),
        }
    }

    /// All in-window sessions of `unit`, newest first.
    ///
    /// A failed page request ends pagination and is returned as the error;
    /// sessions collected from earlier pages are discarded with it.
    pub async fn fetch_sessions(
        &self,
        unit: &Unit,
        window: &CutoffWindow,
    ) -> Result<Vec<RawSession>> {
        let logger = self.logger.for_unit(&unit.unit_id);
        let mut sessions = Vec::new();
        let mut pages = 0usize;
        let mut state = PaginatorState::Fetching { token: None };

        loop {
            state = match state {
                PaginatorState::Fetching { token } => {
                    let page = self
                        .source
                        .history_page(unit, token.as_deref())
                        .await
                        .inspect_err(|e| {
                            logger.error(&format!("history page {} failed: {}", pages + 1, e))
                        })?;
                    pages += 1;
                    PaginatorState::ScanningPage(page)
                }
                PaginatorState::ScanningPage(page) => {
                    match window.scan_page(&page.sessions, &mut sessions)? {
                        ScanSignal::Stop => {
                            logger.debug(&format!(
                                "reached sessions at or before {}, stopping",
                                window.after
                            ));
                            PaginatorState::Done
                        }
                        ScanSignal::Continue => match page.next_token() {
                            Some(token) => PaginatorState::Fetching {
                                token: Some(token.to_string()),
                            },
                            None => PaginatorState::Done,
                        },
                    }
                }
                PaginatorState::Done => break,
            };
        }

        logger.info(&format!(
            "fetched {} sessions over {} page(s)",
            sessions.len(),
            pages
        ));
        Ok(sessions)
    }
}
