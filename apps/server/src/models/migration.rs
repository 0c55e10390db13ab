//! Migrations: versioned SQL pairs with content-addressed checksums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Transaction wrapping for the SQL body on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    Auto,
    SingleTransaction,
    NoTransaction,
}

impl TransactionMode {
    /// Parse a transaction mode. An empty string normalizes to `auto`;
    /// anything else unknown is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Some(TransactionMode::Auto),
            "single_transaction" => Some(TransactionMode::SingleTransaction),
            "no_transaction" => Some(TransactionMode::NoTransaction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionMode::Auto => "auto",
            TransactionMode::SingleTransaction => "single_transaction",
            TransactionMode::NoTransaction => "no_transaction",
        }
    }
}

/// SHA-256 hex digest of the exact SQL text.
pub fn checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct Migration {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Unique within the project; the identity used in bookkeeping tables.
    pub key: String,
    pub name: String,
    pub jira: Option<String>,
    pub description: Option<String>,
    pub sql_up: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_down: Option<String>,
    pub checksum_up: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_down: Option<String>,
    pub version: i32,
    pub transaction_mode: TransactionMode,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMigrationInput {
    pub key: String,
    pub name: String,
    pub jira: Option<String>,
    pub description: Option<String>,
    pub sql_up: String,
    pub sql_down: Option<String>,
    pub transaction_mode: Option<String>,
}

/// Partial update; `None` fields keep their current value. `sql_down: Some("")`
/// clears the rollback SQL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMigrationInput {
    pub name: Option<String>,
    pub jira: Option<String>,
    pub description: Option<String>,
    pub sql_up: Option<String>,
    pub sql_down: Option<String>,
    pub transaction_mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_vector() {
        assert_eq!(
            checksum("CREATE TABLE t(id int);"),
            "c2547c631a5aa8c92a00d05232f70aef43987b41b745d8ba65bd16496c228761"
        );
    }

    #[test]
    fn test_checksum_is_exact_text() {
        let a = checksum("CREATE TABLE t(id int);");
        let b = checksum("CREATE TABLE t(id int); ");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, checksum("CREATE TABLE t(id int);"));
    }

    #[test]
    fn test_tx_mode_parsing() {
        assert_eq!(TransactionMode::parse(""), Some(TransactionMode::Auto));
        assert_eq!(TransactionMode::parse("auto"), Some(TransactionMode::Auto));
        assert_eq!(
            TransactionMode::parse("Single_Transaction"),
            Some(TransactionMode::SingleTransaction)
        );
        assert_eq!(
            TransactionMode::parse("no_transaction"),
            Some(TransactionMode::NoTransaction)
        );
        assert_eq!(TransactionMode::parse("two_phase"), None);
    }
}
