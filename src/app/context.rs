use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, StaywatchError};
use crate::config::Config;
use crate::normalizer::Normalizer;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub config: Config,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.store.db_path {
            Some(ref p) => p.clone(),
            None => Self::default_db_path()?,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            store: Arc::new(SqliteStore::new(&db_path)?),
            config,
            normalizer: Normalizer::new(),
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self {
            store: Arc::new(SqliteStore::in_memory()?),
            config,
            normalizer: Normalizer::new(),
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StaywatchError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("staywatch").join("staywatch.db"))
    }
}
