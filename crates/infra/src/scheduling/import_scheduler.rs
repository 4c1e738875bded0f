//! Periodic calendar import
//!
//! Runs the same job as `POST /jobs/import-calendar` on a cron schedule:
//! every connected user's events inside the configured window are
//! reconciled with local appointments.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use leadsync_core::{ConnectionManager, ImportReconciler};
//! use leadsync_infra::scheduling::{
//!     CalendarImportScheduler, CalendarImportSchedulerConfig, SchedulerResult,
//! };
//!
//! # async fn example(
//! #     connections: Arc<ConnectionManager>,
//! #     reconciler: Arc<ImportReconciler>,
//! # ) -> SchedulerResult<()> {
//! let mut scheduler = CalendarImportScheduler::new(
//!     CalendarImportSchedulerConfig {
//!         cron_expression: "0 */15 * * * *".into(),
//!         ..Default::default()
//!     },
//!     connections,
//!     reconciler,
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use leadsync_core::{run_calendar_import, ConnectionManager, ImportReconciler};
use leadsync_domain::{Config, ImportWindow};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the calendar import scheduler.
#[derive(Debug, Clone)]
pub struct CalendarImportSchedulerConfig {
    /// Six-field cron expression (seconds first).
    pub cron_expression: String,
    pub lookback_days: i64,
    pub lookahead_days: i64,
    /// Timeout applied to a single import run.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl CalendarImportSchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cron_expression: config.sync.import_cron.clone(),
            lookback_days: config.sync.import_lookback_days,
            lookahead_days: config.sync.import_lookahead_days,
            job_timeout: Duration::from_secs(config.sync.job_timeout_secs),
            ..Self::default()
        }
    }
}

impl Default for CalendarImportSchedulerConfig {
    fn default() -> Self {
        let sync = leadsync_domain::SyncConfig::default();
        Self {
            cron_expression: sync.import_cron,
            lookback_days: sync.import_lookback_days,
            lookahead_days: sync.import_lookahead_days,
            job_timeout: Duration::from_secs(sync.job_timeout_secs),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Calendar import scheduler with explicit lifecycle management.
pub struct CalendarImportScheduler {
    scheduler: Option<JobScheduler>,
    config: CalendarImportSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    connections: Arc<ConnectionManager>,
    reconciler: Arc<ImportReconciler>,
}

impl CalendarImportScheduler {
    pub fn new(
        config: CalendarImportSchedulerConfig,
        connections: Arc<ConnectionManager>,
        reconciler: Arc<ImportReconciler>,
    ) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            connections,
            reconciler,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyRunning`] on a second start; registration
    /// fails for an invalid cron expression.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));

        info!("calendar import scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    ///
    /// # Errors
    /// [`SchedulerError::NotRunning`] if never started.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("calendar import scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        let connections = self.connections.clone();
        let reconciler = self.reconciler.clone();
        let config = self.config.clone();

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let connections = connections.clone();
            let reconciler = reconciler.clone();
            let config = config.clone();

            Box::pin(async move {
                let started = Instant::now();
                let window =
                    ImportWindow::around(Utc::now(), config.lookback_days, config.lookahead_days);

                match tokio::time::timeout(
                    config.job_timeout,
                    run_calendar_import(&connections, &reconciler, window),
                )
                .await
                {
                    Ok(result) if result.success => {
                        debug!(
                            imported = result.imported.unwrap_or_default(),
                            skipped = result.skipped.unwrap_or_default(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "scheduled calendar import finished"
                        );
                    }
                    Ok(result) => {
                        error!(
                            error = result.error.as_deref().unwrap_or("unknown"),
                            "scheduled calendar import failed"
                        );
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = config.job_timeout.as_secs(),
                            "scheduled calendar import timed out"
                        );
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job.guid();
        scheduler
            .add(job)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(job_id = %job_id, "registered calendar import job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("calendar import scheduler monitor cancelled");
    }
}

impl Drop for CalendarImportScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CalendarImportScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
