//! Leads and pipeline stages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStage {
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "em_contato")]
    InContact,
    #[serde(rename = "agendado")]
    Scheduled,
    #[serde(rename = "proposta")]
    Proposal,
    #[serde(rename = "fechado")]
    Won,
    #[serde(rename = "perdido")]
    Lost,
}

crate::impl_domain_status_conversions!(LeadStage {
    New => "novo",
    InContact => "em_contato",
    Scheduled => "agendado",
    Proposal => "proposta",
    Won => "fechado",
    Lost => "perdido",
});

/// A sales lead owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub stage: LeadStage,
    pub profession: Option<String>,
    pub income_bracket: Option<String>,
    pub observations: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Primary phone followed by the secondary one, if any.
    pub fn phones(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.phone.as_str()).chain(self.secondary_phone.as_deref())
    }
}
