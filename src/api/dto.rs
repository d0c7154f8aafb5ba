/// Data Transfer Objects (DTOs) for REST API endpoints
use serde::Serialize;

use crate::app_state::SessionInfo;

/// Response DTO for one active terminal session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Client-chosen session identifier
    pub id: String,

    /// Shell process id, if the platform reports one
    pub pid: Option<u32>,

    /// Terminal columns
    pub cols: u16,

    /// Terminal rows
    pub rows: u16,

    /// Session creation timestamp
    pub created_at: u64,
}

impl From<SessionInfo> for SessionSummary {
    fn from(info: SessionInfo) -> Self {
        Self {
            id: info.id,
            pid: info.pid,
            cols: info.columns,
            rows: info.rows,
            created_at: info.created_at,
        }
    }
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
