//! DB targets: single database endpoints inside a db-set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Database engine of a target. A closed set; the engine picks the driver at
/// execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Postgres,
    Mysql,
}

impl Engine {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Some(Engine::Postgres),
            "mysql" => Some(Engine::Mysql),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Mysql => "mysql",
        }
    }
}

/// A target database endpoint. The password never appears here; it is stored
/// sealed and decrypted only inside the executor at the moment of use.
#[derive(Debug, Clone, Serialize)]
pub struct DbTarget {
    pub id: Uuid,
    pub db_set_id: Uuid,
    pub engine: Engine,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub options: JsonValue,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTargetInput {
    pub db_set_id: Uuid,
    pub engine: String,
    pub host: String,
    pub port: i32,
    pub dbname: String,
    pub username: String,
    pub password: String,
    pub options: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTargetInput {
    pub host: Option<String>,
    pub port: Option<i32>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub options: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parsing() {
        assert_eq!(Engine::parse("postgres"), Some(Engine::Postgres));
        assert_eq!(Engine::parse("MySQL"), Some(Engine::Mysql));
        assert_eq!(Engine::parse("sqlite"), None);
        assert_eq!(Engine::parse("mariadb"), None);
    }
}
