//! Runs and run items: one attempt to apply or roll back a migration against
//! one db-set in one environment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::db_set::Env;

/// Apply the forward SQL or the rollback SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Apply,
    Rollback,
}

impl RunType {
    /// Parse a run type. An empty string normalizes to `apply`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "apply" => Some(RunType::Apply),
            "rollback" => Some(RunType::Rollback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Apply => "apply",
            RunType::Rollback => "rollback",
        }
    }
}

/// Run lifecycle states. `queued` and `canceled` are reserved for a future
/// asynchronous execution queue; v1 moves approved runs to running in-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    AwaitingApproval,
    Approved,
    Denied,
    Queued,
    Running,
    Executed,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_approval" => Some(RunStatus::AwaitingApproval),
            "approved" => Some(RunStatus::Approved),
            "denied" => Some(RunStatus::Denied),
            "queued" => Some(RunStatus::Queued),
            "running" => Some(RunStatus::Running),
            "executed" => Some(RunStatus::Executed),
            "failed" => Some(RunStatus::Failed),
            "canceled" => Some(RunStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::AwaitingApproval => "awaiting_approval",
            RunStatus::Approved => "approved",
            RunStatus::Denied => "denied",
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Executed => "executed",
            RunStatus::Failed => "failed",
            RunStatus::Canceled => "canceled",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Denied | RunStatus::Executed | RunStatus::Failed | RunStatus::Canceled
        )
    }
}

/// Per-target work item states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunItemStatus {
    Queued,
    Running,
    Executed,
    Skipped,
    Failed,
    Canceled,
}

impl RunItemStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(RunItemStatus::Queued),
            "running" => Some(RunItemStatus::Running),
            "executed" => Some(RunItemStatus::Executed),
            "skipped" => Some(RunItemStatus::Skipped),
            "failed" => Some(RunItemStatus::Failed),
            "canceled" => Some(RunItemStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunItemStatus::Queued => "queued",
            RunItemStatus::Running => "running",
            RunItemStatus::Executed => "executed",
            RunItemStatus::Skipped => "skipped",
            RunItemStatus::Failed => "failed",
            RunItemStatus::Canceled => "canceled",
        }
    }
}

/// Approve or deny a pending run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "approved" => Some(Decision::Approved),
            "denied" => Some(Decision::Denied),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Run {
    pub id: Uuid,
    pub run_type: RunType,
    pub migration_id: Uuid,
    pub project_id: Uuid,
    pub env: Env,
    pub db_set_id: Uuid,
    pub status: RunStatus,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub checksum_up_at_request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_down_at_request: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunItem {
    pub id: Uuid,
    pub run_id: Uuid,
    pub db_target_id: Uuid,
    pub status: RunItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunWithItems {
    #[serde(flatten)]
    pub run: Run,
    pub items: Vec<RunItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestRunInput {
    pub migration_id: Uuid,
    pub db_set_id: Uuid,
    pub env: String,
    pub run_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecideRunInput {
    pub decision: Decision,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_type_parsing() {
        assert_eq!(RunType::parse(""), Some(RunType::Apply));
        assert_eq!(RunType::parse("apply"), Some(RunType::Apply));
        assert_eq!(RunType::parse("Rollback"), Some(RunType::Rollback));
        assert_eq!(RunType::parse("undo"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RunStatus::AwaitingApproval,
            RunStatus::Approved,
            RunStatus::Denied,
            RunStatus::Queued,
            RunStatus::Running,
            RunStatus::Executed,
            RunStatus::Failed,
            RunStatus::Canceled,
        ] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunStatus::Denied.is_terminal());
        assert!(RunStatus::Executed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::AwaitingApproval.is_terminal());
        assert!(!RunStatus::Approved.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_item_status_round_trip() {
        for status in [
            RunItemStatus::Queued,
            RunItemStatus::Running,
            RunItemStatus::Executed,
            RunItemStatus::Skipped,
            RunItemStatus::Failed,
            RunItemStatus::Canceled,
        ] {
            assert_eq!(RunItemStatus::parse(status.as_str()), Some(status));
        }
    }
}
