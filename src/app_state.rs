use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::session::SessionManager;
use crate::store::Store;

/// Everything a request handler touches: the durable store and the session
/// table, owned together so one writer lock serializes every mutation.
pub struct AppInner {
    pub store: Store,
    pub sessions: SessionManager,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<RwLock<AppInner>>,
}

impl AppState {
    /// Initialize application state. A store that cannot be opened aborts
    /// startup.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.database.file)?;
        Ok(Self::with_store(store))
    }

    pub fn with_store(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppInner {
                store,
                sessions: SessionManager::new(),
            })),
        }
    }

    /// Shared access for queries. Readers may overlap but never observe a
    /// half-applied mutation.
    pub async fn read(&self) -> RwLockReadGuard<'_, AppInner> {
        self.inner.read().await
    }

    /// Exclusive access for mutations; held across apply + flush as one
    /// unit.
    pub async fn write(&self) -> RwLockWriteGuard<'_, AppInner> {
        self.inner.write().await
    }
}
