use nexus_api_client::ApiClientConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{SettingsStorage, StorageError};

pub const SETTINGS_KEY: &str = "elara_nexus_settings";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_TOKEN: &str = "local-dev-token";

/// Where and how the client talks to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub api_base_url: String,
    pub api_token: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        default_settings()
    }
}

impl AppSettings {
    #[must_use]
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig::new(self.api_base_url.clone(), self.api_token.clone())
    }

    /// True when both settings point the client at the same backend with the
    /// same credentials.
    #[must_use]
    pub fn same_connection(&self, other: &AppSettings) -> bool {
        self.api_base_url == other.api_base_url && self.api_token == other.api_token
    }
}

#[must_use]
pub fn default_settings() -> AppSettings {
    AppSettings {
        api_base_url: DEFAULT_API_BASE_URL.to_string(),
        api_token: DEFAULT_API_TOKEN.to_string(),
    }
}

/// Reads settings from `storage`, filling each missing field from
/// [`default_settings`]. Unavailable storage, an absent key, or a value that
/// is not JSON all yield the defaults.
pub fn load_settings<S>(storage: &S) -> AppSettings
where
    S: SettingsStorage + ?Sized,
{
    let raw = match storage.get_item(SETTINGS_KEY) {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return default_settings(),
        Err(StorageError::Unavailable) => return default_settings(),
        Err(error) => {
            tracing::warn!(reason = %error, "settings read failed; using defaults");
            return default_settings();
        }
    };

    let parsed = match serde_json::from_str::<Value>(&raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(reason = %error, "stored settings are not valid json; using defaults");
            return default_settings();
        }
    };

    let defaults = default_settings();
    let field = |name: &str| {
        parsed
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    AppSettings {
        api_base_url: field("apiBaseUrl").unwrap_or(defaults.api_base_url),
        api_token: field("apiToken").unwrap_or(defaults.api_token),
    }
}

/// Writes `settings` as JSON under [`SETTINGS_KEY`]. A missing storage medium
/// makes this a no-op; other write failures propagate.
pub fn save_settings<S>(storage: &S, settings: &AppSettings) -> Result<(), StorageError>
where
    S: SettingsStorage + ?Sized,
{
    let encoded = serde_json::to_string(settings).map_err(|error| StorageError::Write {
        message: error.to_string(),
    })?;
    match storage.set_item(SETTINGS_KEY, &encoded) {
        Ok(()) => Ok(()),
        Err(StorageError::Unavailable) => {
            tracing::debug!("no settings storage available; skipping save");
            Ok(())
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::storage::{FileStorage, MemoryStorage, UnavailableStorage};

    fn setting_value() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("\"quoted\" \\ {\"json\": true}".to_string()),
            Just("https://nexus.example/ünïcødé/✓".to_string()),
            any::<String>(),
        ]
    }

    proptest! {
        #![proptest_config(
            ProptestConfig { failure_persistence: None, ..ProptestConfig::default() }
        )]

        #[test]
        fn saved_settings_load_back_unchanged(
            api_base_url in setting_value(),
            api_token in setting_value(),
        ) {
            let storage = MemoryStorage::new();
            let input = AppSettings { api_base_url, api_token };

            save_settings(&storage, &input).expect("save");

            prop_assert_eq!(load_settings(&storage), input);
        }
    }

    #[test]
    fn returns_defaults_when_empty() {
        let storage = MemoryStorage::new();
        assert_eq!(load_settings(&storage), default_settings());
    }

    #[test]
    fn persists_and_loads_settings() {
        let storage = MemoryStorage::new();
        let input = AppSettings {
            api_base_url: "http://localhost:9000".to_string(),
            api_token: "abc123".to_string(),
        };

        save_settings(&storage, &input).expect("save");

        assert_eq!(load_settings(&storage), input);
    }

    #[test]
    fn stores_camel_case_json_under_fixed_key() {
        let storage = MemoryStorage::new();
        save_settings(&storage, &default_settings()).expect("save");
        let raw = storage
            .get_item(SETTINGS_KEY)
            .expect("read")
            .expect("stored value");
        let value: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "apiBaseUrl": "http://localhost:8000",
                "apiToken": "local-dev-token"
            })
        );
    }

    #[test]
    fn falls_back_to_defaults_on_invalid_json() {
        let storage = MemoryStorage::new();
        storage.set_item(SETTINGS_KEY, "{").expect("seed");
        assert_eq!(load_settings(&storage), default_settings());
    }

    #[test]
    fn fills_missing_fields_from_defaults() {
        let storage = MemoryStorage::new();
        storage
            .set_item(SETTINGS_KEY, r#"{"apiBaseUrl":"http://localhost:9100"}"#)
            .expect("seed");
        assert_eq!(
            load_settings(&storage),
            AppSettings {
                api_base_url: "http://localhost:9100".to_string(),
                api_token: default_settings().api_token,
            }
        );

        storage
            .set_item(SETTINGS_KEY, r#"{"apiToken":"only-token"}"#)
            .expect("seed");
        assert_eq!(
            load_settings(&storage),
            AppSettings {
                api_base_url: default_settings().api_base_url,
                api_token: "only-token".to_string(),
            }
        );
    }

    #[test]
    fn non_object_and_wrongly_typed_values_never_leak_through() {
        let storage = MemoryStorage::new();
        storage.set_item(SETTINGS_KEY, "null").expect("seed");
        assert_eq!(load_settings(&storage), default_settings());

        storage
            .set_item(SETTINGS_KEY, r#"{"apiBaseUrl":42,"apiToken":"t"}"#)
            .expect("seed");
        assert_eq!(
            load_settings(&storage),
            AppSettings {
                api_base_url: default_settings().api_base_url,
                api_token: "t".to_string(),
            }
        );
    }

    #[test]
    fn handles_missing_storage_medium() {
        assert_eq!(load_settings(&UnavailableStorage), default_settings());
        save_settings(
            &UnavailableStorage,
            &AppSettings {
                api_base_url: "http://x".to_string(),
                api_token: "y".to_string(),
            },
        )
        .expect("save without storage is a no-op");
    }

    #[test]
    fn file_storage_round_trips_across_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let input = AppSettings {
            api_base_url: "https://nexus.example.com".to_string(),
            api_token: "secret".to_string(),
        };
        save_settings(&FileStorage::new(temp.path()), &input).expect("save");
        assert_eq!(load_settings(&FileStorage::new(temp.path())), input);
    }

    #[test]
    fn same_connection_compares_both_fields() {
        let base = default_settings();
        let mut other = base.clone();
        assert!(base.same_connection(&other));
        other.api_token = "rotated".to_string();
        assert!(!base.same_connection(&other));
    }
}
