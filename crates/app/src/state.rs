//! Application state

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use wikirc_core::{ConfigRepository, Database, Execution, Result, Settings};

pub struct AppState {
    pub settings: Settings,
    pub db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let db_path = settings.database_path()?;
        Self::open(settings, &db_path)
    }

    pub fn open(settings: Settings, db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(db_path)?;
        tracing::info!(path = %db_path.display(), version = db.schema_version(), "Opened wiki database");

        Ok(Self {
            settings,
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Execution bound to the configured wiki and bot user
    pub fn execution(&self) -> Execution {
        self.settings.execution()
    }

    pub fn lock_db(&self) -> MutexGuard<'_, Database> {
        lock_db(&self.db)
    }

    /// Run `f` against a configuration repository over the locked database
    pub fn with_repository<T>(&self, f: impl FnOnce(&ConfigRepository<&Database>) -> Result<T>) -> Result<T> {
        let db = self.lock_db();
        f(&ConfigRepository::new(&*db))
    }
}

pub fn lock_db(db: &Mutex<Database>) -> MutexGuard<'_, Database> {
    match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Database mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
