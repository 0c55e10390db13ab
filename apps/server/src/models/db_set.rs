//! DB sets: named bundles of target databases sharing (project, env).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deployment environment a db-set (and its runs) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Daily,
    Stg,
    Prd,
}

impl Env {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Some(Env::Daily),
            "stg" => Some(Env::Stg),
            "prd" => Some(Env::Prd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Env::Daily => "daily",
            Env::Stg => "stg",
            Env::Prd => "prd",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DbSet {
    pub id: Uuid,
    pub project_id: Uuid,
    pub env: Env,
    pub name: String,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parsing() {
        assert_eq!(Env::parse("daily"), Some(Env::Daily));
        assert_eq!(Env::parse(" STG "), Some(Env::Stg));
        assert_eq!(Env::parse("prd"), Some(Env::Prd));
        assert_eq!(Env::parse("staging"), None);
        assert_eq!(Env::parse("production"), None);
        assert_eq!(Env::parse(""), None);
    }
}
