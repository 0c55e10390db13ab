//! Process-wide application context.
//!
//! Built once in `main` after configuration is loaded and never mutated
//! afterwards. Business code receives this context instead of re-reading the
//! process environment.

use crate::config::Config;
use crate::db::DbPool;
use crate::secret::SecretBox;

#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub secrets: SecretBox,
    pub config: Config,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config) -> Self {
        let secrets = SecretBox::new(config.secret_key);
        AppContext {
            db,
            secrets,
            config,
        }
    }
}
