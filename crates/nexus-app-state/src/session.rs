use std::sync::Arc;

use nexus_api_client::ApiClient;

use crate::settings::{AppSettings, load_settings, save_settings};
use crate::storage::{SettingsStorage, StorageError};

/// Current settings plus the client derived from them.
///
/// The client is rebuilt only when the base URL or token changes, so
/// consumers can compare [`Arc::ptr_eq`] on [`AppSession::client`] to detect
/// a new connection.
#[derive(Debug)]
pub struct AppSession<S> {
    storage: S,
    settings: AppSettings,
    client: Arc<ApiClient>,
}

impl<S: SettingsStorage> AppSession<S> {
    pub fn load(storage: S) -> Self {
        let settings = load_settings(&storage);
        let client = Arc::new(ApiClient::new(settings.client_config()));
        Self {
            storage,
            settings,
            client,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[must_use]
    pub fn client(&self) -> Arc<ApiClient> {
        Arc::clone(&self.client)
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persists `next` and then adopts it in memory. When persisting fails
    /// nothing in memory changes.
    pub fn save_app_settings(&mut self, next: AppSettings) -> Result<(), StorageError> {
        save_settings(&self.storage, &next)?;
        if !self.settings.same_connection(&next) {
            tracing::info!(api_base_url = %next.api_base_url, "api connection settings changed");
            self.client = Arc::new(ApiClient::new(next.client_config()));
        }
        self.settings = next;
        Ok(())
    }
}
