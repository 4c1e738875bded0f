//! Builders for leads and a fully wired service harness.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use leadsync_core::{
    AppointmentService, ConnectionManager, ConnectionSettings, EventSynchronizer,
    ImportReconciler, StaleLeadMover, SyncSettings,
};
use leadsync_domain::{ConnectionToken, Lead, LeadStage};
use uuid::Uuid;

use super::provider::MockCalendarProvider;
use super::repositories::{
    MockAppointmentRepository, MockConnectionTokenRepository, MockLeadRepository,
};

pub const USER: &str = "user-1";

pub fn lead(user_id: &str, name: &str, phone: &str) -> Lead {
    lead_with_phones(user_id, name, phone, None)
}

pub fn lead_with_phones(
    user_id: &str,
    name: &str,
    phone: &str,
    secondary_phone: Option<&str>,
) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        secondary_phone: secondary_phone.map(ToString::to_string),
        stage: LeadStage::InContact,
        profession: None,
        income_bracket: None,
        observations: None,
        updated_at: Utc::now(),
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

/// Mocks plus the services built on top of them.
pub struct Harness {
    pub appointment_repo: MockAppointmentRepository,
    pub lead_repo: MockLeadRepository,
    pub token_repo: MockConnectionTokenRepository,
    pub provider: MockCalendarProvider,
    pub appointments: Arc<AppointmentService>,
    pub connections: Arc<ConnectionManager>,
    pub synchronizer: EventSynchronizer,
    pub reconciler: ImportReconciler,
}

impl Harness {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self::with_settings(leads, fast_settings())
    }

    pub fn with_settings(leads: Vec<Lead>, settings: ConnectionSettings) -> Self {
        let lead_repo = leads.into_iter().fold(MockLeadRepository::default(), |repo, lead| {
            repo.with_lead(lead)
        });
        let appointment_repo = MockAppointmentRepository::default();
        let token_repo = MockConnectionTokenRepository::default();
        let provider = MockCalendarProvider::default();

        let appointments = Arc::new(AppointmentService::new(
            Arc::new(appointment_repo.clone()),
            Arc::new(lead_repo.clone()),
        ));
        let connections = Arc::new(ConnectionManager::new(
            Arc::new(provider.clone()),
            Arc::new(token_repo.clone()),
            settings,
        ));
        let synchronizer = EventSynchronizer::new(
            appointments.clone(),
            Arc::new(lead_repo.clone()),
            connections.clone(),
            Arc::new(provider.clone()),
            SyncSettings {
                event_duration: chrono::Duration::minutes(30),
                timezone: chrono_tz::America::Sao_Paulo,
            },
        );
        let reconciler = ImportReconciler::new(
            appointments.clone(),
            Arc::new(lead_repo.clone()),
            connections.clone(),
            Arc::new(provider.clone()),
        );

        Self {
            appointment_repo,
            lead_repo,
            token_repo,
            provider,
            appointments,
            connections,
            synchronizer,
            reconciler,
        }
    }

    /// Store an active token for `user_id` directly.
    pub fn connect(&self, user_id: &str) {
        let now = Utc::now();
        self.token_repo.insert(ConnectionToken {
            user_id: user_id.to_string(),
            access_token: format!("access-{user_id}"),
            refresh_token: Some(format!("refresh-{user_id}")),
            expires_at: Some(now + chrono::Duration::hours(1)),
            sync_enabled: true,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn stale_mover(&self, from: LeadStage, to: LeadStage, days: i64) -> StaleLeadMover {
        StaleLeadMover::new(Arc::new(self.lead_repo.clone()), from, to, chrono::Duration::days(days))
    }
}

/// Short timings with the status cache effectively off.
pub fn fast_settings() -> ConnectionSettings {
    ConnectionSettings {
        poll_interval: Duration::from_millis(20),
        connect_timeout: Duration::from_millis(500),
        status_cache_ttl: Duration::from_millis(1),
        refresh_threshold_secs: 300,
    }
}
