//! Inbound import bookkeeping

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{LeadSyncError, Result};

/// Per-event result of reconciling a provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// New appointment created from the event
    Imported,
    /// Existing appointment at the same instant got the remote id
    Linked,
    /// An appointment already references this event
    AlreadyLinked,
    /// No 10-11 digit run in title or description
    NoPhone,
    /// No lead phone contains the extracted digits
    NoLead,
    /// Store error while handling this event
    Failed,
}

/// Skip counts by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBreakdown {
    pub already_linked: usize,
    pub no_phone: usize,
    pub no_lead: usize,
    pub failed: usize,
}

/// Counts returned by an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub linked: usize,
    pub skipped: usize,
    pub examined: usize,
    pub breakdown: ImportBreakdown,
}

impl ImportSummary {
    /// Count one examined event.
    pub fn record(&mut self, outcome: ImportOutcome) {
        self.examined += 1;
        match outcome {
            ImportOutcome::Imported => self.imported += 1,
            ImportOutcome::Linked => self.linked += 1,
            ImportOutcome::AlreadyLinked => self.skip(|b| b.already_linked += 1),
            ImportOutcome::NoPhone => self.skip(|b| b.no_phone += 1),
            ImportOutcome::NoLead => self.skip(|b| b.no_lead += 1),
            ImportOutcome::Failed => self.skip(|b| b.failed += 1),
        }
    }

    fn skip(&mut self, bump: impl FnOnce(&mut ImportBreakdown)) {
        self.skipped += 1;
        bump(&mut self.breakdown);
    }

    /// Add another run's counts into this one.
    pub fn merge(&mut self, other: &Self) {
        self.imported += other.imported;
        self.linked += other.linked;
        self.skipped += other.skipped;
        self.examined += other.examined;
        self.breakdown.already_linked += other.breakdown.already_linked;
        self.breakdown.no_phone += other.breakdown.no_phone;
        self.breakdown.no_lead += other.breakdown.no_lead;
        self.breakdown.failed += other.breakdown.failed;
    }
}

/// Time range an import scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ImportWindow {
    /// # Errors
    /// Returns [`LeadSyncError::InvalidInput`] when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(LeadSyncError::InvalidInput(format!(
                "import window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window around `now` reaching `lookback_days` back and
    /// `lookahead_days` forward.
    ///
    /// Spans past the representable range clamp to the earliest or latest
    /// instant.
    #[must_use]
    pub fn around(now: DateTime<Utc>, lookback_days: i64, lookahead_days: i64) -> Self {
        let start = TimeDelta::try_days(lookback_days.max(0))
            .and_then(|back| now.checked_sub_signed(back))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = TimeDelta::try_days(lookahead_days.max(0))
            .and_then(|ahead| now.checked_add_signed(ahead))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }
}
