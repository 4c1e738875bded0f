//! Domain types and models

pub mod appointment;
pub mod connection;
pub mod import;
pub mod jobs;
pub mod lead;
pub mod remote;

pub use appointment::{
    normalize_notes, Appointment, AppointmentStatus, MarkSyncedOutcome, NewAppointment,
    ScheduledAt, ScheduledCall, StatusChange, SyncAttempt, SyncedIds,
};
pub use connection::{AuthorizationRequest, ConnectionState, ConnectionToken, ConnectionWait};
pub use import::{ImportBreakdown, ImportOutcome, ImportSummary, ImportWindow};
pub use jobs::JobResult;
pub use lead::{Lead, LeadStage};
pub use remote::{NewRemoteEvent, NewRemoteTask, RemoteEvent, RemoteTask, RemoteTaskStatus};
