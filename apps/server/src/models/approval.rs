//! Approvals: immutable decision records bound to exact checksums.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::db_set::Env;
use crate::models::run::Decision;

/// A historical approval/denial. Never mutated; invalidated only by deletion
/// when the migration SQL changes.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub id: Uuid,
    pub migration_id: Uuid,
    pub env: Env,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub decided_by: Uuid,
    pub decided_at: DateTime<Utc>,
    pub checksum_up_at_decision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_down_at_decision: Option<String>,
}
