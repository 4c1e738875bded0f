//! Scheduled job results

use serde::{Deserialize, Serialize};

/// Body returned by the job endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examined: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    /// Completed import job.
    #[must_use]
    pub fn imported(imported: usize, skipped: usize, examined: usize) -> Self {
        Self {
            success: true,
            imported: Some(imported),
            skipped: Some(skipped),
            examined: Some(examined),
            ..Self::default()
        }
    }

    /// Completed stale-lead job.
    #[must_use]
    pub fn moved(moved_count: usize) -> Self {
        Self { success: true, moved_count: Some(moved_count), ..Self::default() }
    }

    /// Job that could not run to completion.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Self::default() }
    }

    /// HTTP status for this result: 200 on completion, 500 otherwise.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.success {
            200
        } else {
            500
        }
    }
}
