//! Shared, atomically swappable configuration snapshot.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;

use super::{Config, CONFIG_NAME};

/// Holds the current configuration snapshot.
///
/// Readers take an `Arc` clone and keep using it for the whole call;
/// a reload replaces the `Arc` for subsequent callers only.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<Config>>>,
    path: Option<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        let path = config.source_path.clone();
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
            path,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Config> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new snapshot.
    pub fn replace(&self, config: Config) {
        let config = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Re-read configuration from its source and swap it in.
    ///
    /// A file that fails to load leaves the current snapshot in place.
    pub async fn reload(&self) -> Arc<Config> {
        let config = match &self.path {
            Some(path) => match Config::load_from_path(path).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Keeping current configuration: {}", e);
                    return self.snapshot();
                }
            },
            None => Config::load().await,
        };
        tracing::info!("Configuration reloaded");
        self.replace(config);
        self.snapshot()
    }

    /// Reload whenever the source file changes.
    ///
    /// Watches the file this handle was loaded from, or the discovered
    /// config file when it was built from defaults. Returns `None` when
    /// there is nothing to watch.
    pub async fn watch(&self) -> Option<JoinHandle<()>> {
        let receiver = match &self.path {
            Some(path) => prefer::watch::watch_path(path.clone()).await,
            None => prefer::watch(CONFIG_NAME).await,
        };
        let mut receiver = match receiver {
            Ok(receiver) => receiver,
            Err(e) => {
                tracing::debug!("Hot reload disabled: {}", e);
                return None;
            }
        };

        let handle = self.clone();
        Some(tokio::spawn(async move {
            while receiver.recv().await.is_some() {
                tracing::info!("Config file changed, reloading");
                handle.reload().await;
            }
        }))
    }
}
