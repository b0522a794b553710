//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_core::RootAdmin;

use crate::config::ServerConfig;
use crate::db::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    root_admin: RootAdmin,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let root_admin = RootAdmin::new(config.root_admin_email.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                root_admin,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// The administrator that cannot be demoted, edited or deleted.
    #[must_use]
    pub fn root_admin(&self) -> &RootAdmin {
        &self.inner.root_admin
    }
}
