//! Stale-lead mover

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use leadsync_domain::{Config, LeadStage, LeadSyncError, Result};
use tracing::{debug, info, instrument, warn};

use crate::appointments::ports::LeadRepository;

/// Moves leads that sat too long in one stage to the next one.
pub struct StaleLeadMover {
    leads: Arc<dyn LeadRepository>,
    from: LeadStage,
    to: LeadStage,
    stale_after: Duration,
}

impl StaleLeadMover {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        from: LeadStage,
        to: LeadStage,
        stale_after: Duration,
    ) -> Self {
        Self { leads, from, to, stale_after }
    }

    /// # Errors
    /// [`LeadSyncError::Config`] for unknown stage names or an out-of-range
    /// `stale_after_days`.
    pub fn from_config(leads: Arc<dyn LeadRepository>, config: &Config) -> Result<Self> {
        let (from, to) = config.pipeline.stages()?;
        let days = config.pipeline.stale_after_days;
        let stale_after = Duration::try_days(days).ok_or_else(|| {
            LeadSyncError::Config(format!("pipeline.stale_after_days out of range: {days}"))
        })?;
        Ok(Self::new(leads, from, to, stale_after))
    }

    /// Move every stale lead; returns how many moved.
    ///
    /// Per-lead failures are logged and skipped.
    #[instrument(skip(self), fields(from = %self.from, to = %self.to))]
    pub async fn move_stale_leads(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now.checked_sub_signed(self.stale_after).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let stale = self.leads.find_stale_leads(self.from, cutoff).await?;

        let mut moved = 0;
        for lead in &stale {
            match self.leads.update_stage(lead.id, self.from, self.to, now).await {
                Ok(true) => moved += 1,
                Ok(false) => debug!(lead_id = %lead.id, "lead changed meanwhile; skipped"),
                Err(err) => warn!(lead_id = %lead.id, error = %err, "failed to move lead"),
            }
        }

        info!(examined = stale.len(), moved, %cutoff, "stale leads moved");
        Ok(moved)
    }
}
