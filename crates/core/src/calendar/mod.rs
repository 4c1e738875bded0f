//! Calendar connection, outbound sync and inbound import

pub mod connection;
pub mod import;
pub mod ports;
pub mod sync;

pub use connection::{ConnectionManager, ConnectionSettings};
pub use import::ImportReconciler;
pub use sync::{EventSynchronizer, SyncSettings};
