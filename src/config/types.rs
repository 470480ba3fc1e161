use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::config::error::{invalid_argument, io_error, no_options, ConfigResult};

/// Name under which the app is registered when none is configured.
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Root path under which page data lives in the realtime database.
pub const DEFAULT_DATA_ROOT: &str = "workArrangementV3";

/// Web app options, as emitted by the Firebase console.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirebaseOptions {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    #[serde(rename = "databaseURL", alias = "databaseUrl")]
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
}

impl FirebaseOptions {
    /// Returns `true` when at least one option is set.
    pub fn is_defined(&self) -> bool {
        self.api_key.is_some()
            || self.project_id.is_some()
            || self.app_id.is_some()
            || self.auth_domain.is_some()
            || self.database_url.is_some()
            || self.storage_bucket.is_some()
            || self.messaging_sender_id.is_some()
            || self.measurement_id.is_some()
    }

    /// The measurement id, ignoring blank values.
    pub fn measurement_id(&self) -> Option<&str> {
        self.measurement_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirebaseAppSettings {
    pub name: Option<String>,
    pub automatic_data_collection_enabled: Option<bool>,
}

impl FirebaseAppSettings {
    pub fn app_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn automatic_data_collection(&self) -> bool {
        self.automatic_data_collection_enabled.unwrap_or(true)
    }
}

/// Static configuration consumed by [`Bootstrap`](crate::bootstrap::Bootstrap).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapConfig {
    options: FirebaseOptions,
    settings: FirebaseAppSettings,
    data_root: String,
}

/// Wrapped on-disk form: `{ "options": {..}, "appName": .., "dataRoot": .. }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigDocument {
    options: FirebaseOptions,
    app_name: Option<String>,
    automatic_data_collection_enabled: Option<bool>,
    data_root: Option<String>,
}

impl BootstrapConfig {
    pub fn new(options: FirebaseOptions) -> Self {
        Self {
            options,
            settings: FirebaseAppSettings::default(),
            data_root: DEFAULT_DATA_ROOT.to_string(),
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    pub fn with_automatic_data_collection(mut self, enabled: bool) -> Self {
        self.settings.automatic_data_collection_enabled = Some(enabled);
        self
    }

    pub fn with_data_root(mut self, data_root: impl Into<String>) -> Self {
        self.data_root = normalize_data_root(&data_root.into());
        self
    }

    pub fn options(&self) -> &FirebaseOptions {
        &self.options
    }

    pub fn settings(&self) -> &FirebaseAppSettings {
        &self.settings
    }

    pub fn app_name(&self) -> &str {
        self.settings.app_name()
    }

    pub fn data_root(&self) -> &str {
        &self.data_root
    }

    /// Checks the invariants every loader enforces.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.options.is_defined() {
            return Err(no_options());
        }
        if self.app_name().trim().is_empty() {
            return Err(invalid_argument("App name must not be blank"));
        }
        if self.data_root.is_empty() {
            return Err(invalid_argument("Data root must not be blank"));
        }
        Ok(())
    }

    /// Parses a JSON document holding either a bare web config object or the wrapped form.
    ///
    /// A `config` key (the shape of `__FIREBASE_DEFAULTS__`) is accepted as the options
    /// object as well.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json_value(value)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| io_error(format!("Failed to read {}: {err}", path.display())))?;
        Self::from_json_str(&contents)
    }

    pub(crate) fn from_json_value(value: Value) -> ConfigResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(invalid_argument("Firebase config must be a JSON object"));
        };

        let config = if map.contains_key("options") {
            let document: ConfigDocument = serde_json::from_value(Value::Object(map))?;
            let mut config = Self::new(document.options);
            config.settings = FirebaseAppSettings {
                name: document.app_name,
                automatic_data_collection_enabled: document.automatic_data_collection_enabled,
            };
            if let Some(root) = document.data_root {
                config = config.with_data_root(root);
            }
            config
        } else if let Some(Value::Object(options)) = map.remove("config") {
            Self::new(serde_json::from_value(Value::Object(options))?)
        } else {
            Self::new(serde_json::from_value(Value::Object(map))?)
        };

        config.validate()?;
        Ok(config)
    }
}

fn normalize_data_root(raw: &str) -> String {
    raw.trim().trim_matches('/').to_string()
}
