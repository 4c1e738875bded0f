//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use leadsync_core::{
    AppointmentService, CalendarProvider, ConnectionManager, ConnectionSettings,
    EventSynchronizer, ImportReconciler, StaleLeadMover, SyncSettings,
};
use leadsync_domain::{Config, ImportWindow, LeadSyncError, Result};
use leadsync_infra::{
    CalendarImportScheduler, CalendarImportSchedulerConfig, DbManager, GoogleCalendarProvider,
    SqliteAppointmentRepository, SqliteConnectionTokenRepository, SqliteLeadRepository,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const SCHEDULER_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub appointments: Arc<AppointmentService>,
    pub connections: Arc<ConnectionManager>,
    pub synchronizer: Arc<EventSynchronizer>,
    pub reconciler: Arc<ImportReconciler>,
    pub stale_mover: Arc<StaleLeadMover>,
    scheduler: Mutex<CalendarImportScheduler>,
    /// Cancelled on shutdown; parents every connection wait.
    shutdown: CancellationToken,
}

impl AppContext {
    /// Open the database, apply migrations and wire the Google provider.
    ///
    /// # Errors
    /// Invalid configuration or an unusable database.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let provider: Arc<dyn CalendarProvider> =
            Arc::new(GoogleCalendarProvider::new(config.google.clone())?);

        Self::with_provider(config, db, provider)
    }

    /// Wire services around an existing database and provider.
    ///
    /// # Errors
    /// [`LeadSyncError::Config`] for an unknown timezone or stage.
    pub fn with_provider(
        config: Config,
        db: Arc<DbManager>,
        provider: Arc<dyn CalendarProvider>,
    ) -> Result<Self> {
        let appointment_repo = Arc::new(SqliteAppointmentRepository::new(db.clone()));
        let lead_repo = Arc::new(SqliteLeadRepository::new(db.clone()));
        let token_repo = Arc::new(SqliteConnectionTokenRepository::new(db.clone()));

        let appointments = Arc::new(AppointmentService::new(appointment_repo, lead_repo.clone()));
        let connections = Arc::new(ConnectionManager::new(
            provider.clone(),
            token_repo,
            ConnectionSettings::from_config(&config),
        ));
        let synchronizer = Arc::new(EventSynchronizer::new(
            appointments.clone(),
            lead_repo.clone(),
            connections.clone(),
            provider.clone(),
            SyncSettings::from_config(&config)?,
        ));
        let reconciler = Arc::new(ImportReconciler::new(
            appointments.clone(),
            lead_repo.clone(),
            connections.clone(),
            provider,
        ));
        let stale_mover = Arc::new(StaleLeadMover::from_config(lead_repo, &config)?);

        let scheduler = CalendarImportScheduler::new(
            CalendarImportSchedulerConfig::from_config(&config),
            connections.clone(),
            reconciler.clone(),
        );

        Ok(Self {
            config,
            db,
            appointments,
            connections,
            synchronizer,
            reconciler,
            stale_mover,
            scheduler: Mutex::new(scheduler),
            shutdown: CancellationToken::new(),
        })
    }

    /// Import window around now, per the `[sync]` settings.
    pub fn default_import_window(&self) -> ImportWindow {
        ImportWindow::around(
            Utc::now(),
            self.config.sync.import_lookback_days,
            self.config.sync.import_lookahead_days,
        )
    }

    /// Token cancelled when the context shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the periodic calendar import.
    ///
    /// # Errors
    /// Fails fast when the scheduler does not come up in time.
    pub async fn start_background_jobs(&self) -> Result<()> {
        let mut scheduler = self.scheduler.lock().await;
        tokio::time::timeout(SCHEDULER_START_TIMEOUT, scheduler.start())
            .await
            .map_err(|_| {
                tracing::error!(timeout_secs = 10, "calendar import scheduler start timed out");
                LeadSyncError::Internal(
                    "calendar import scheduler start timed out after 10s".into(),
                )
            })?
            .map_err(|err| {
                tracing::error!(error = %err, "failed to start calendar import scheduler");
                LeadSyncError::from(err)
            })?;
        Ok(())
    }

    pub async fn scheduler_running(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }

    /// Cancel pending connection waits and stop the scheduler. Safe to call
    /// more than once.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down application context");
        self.shutdown.cancel();

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_running() {
            if let Err(err) = scheduler.stop().await {
                warn!(error = %err, "calendar import scheduler did not stop cleanly");
                return Err(err.into());
            }
        }
        Ok(())
    }
}
