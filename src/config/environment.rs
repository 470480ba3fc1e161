//! Loads [`BootstrapConfig`] from the process environment.
//!
//! Sources are tried in order: `__FIREBASE_DEFAULTS__` (JSON with a `config` object),
//! `__FIREBASE_DEFAULTS_PATH` (file holding the same JSON), then `FIREBASE_CONFIG`,
//! `FIREBASE_OPTIONS` and `FIREBASE_WEBAPP_CONFIG`. Each of the last three may hold inline
//! JSON, a path to a JSON file, or a `key=value,key=value` list. `FIREBASE_APP_NAME` and
//! `FIREBASE_DATA_ROOT` override the app name and data root.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::error::{no_options, ConfigResult};
use crate::config::types::BootstrapConfig;

const CONFIG_VARIABLES: [&str; 3] = [
    "FIREBASE_CONFIG",
    "FIREBASE_OPTIONS",
    "FIREBASE_WEBAPP_CONFIG",
];

impl BootstrapConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_env_with<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = firebase_defaults(&lookup)
            .or_else(|| firebase_config(&lookup))
            .ok_or_else(no_options)?;

        let mut config = Self::from_json_value(source)?;
        if let Some(name) = lookup("FIREBASE_APP_NAME") {
            config = config.with_app_name(name);
        }
        if let Some(root) = lookup("FIREBASE_DATA_ROOT") {
            config = config.with_data_root(root);
        }
        config.validate()?;
        Ok(config)
    }
}

fn firebase_defaults<F>(lookup: &F) -> Option<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = lookup("__FIREBASE_DEFAULTS__")
        .and_then(|raw| parse_json_object(&raw))
        .or_else(|| {
            let path = lookup("__FIREBASE_DEFAULTS_PATH")?;
            let contents = fs::read_to_string(path).ok()?;
            parse_json_object(&contents)
        })?;
    defaults.get("config").filter(|config| config.is_object())?;
    Some(defaults)
}

fn firebase_config<F>(lookup: &F) -> Option<Value>
where
    F: Fn(&str) -> Option<String>,
{
    CONFIG_VARIABLES
        .iter()
        .filter_map(|key| lookup(*key))
        .find_map(|raw| parse_config_source(&raw))
}

fn parse_json_object(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
}

fn parse_config_source(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return parse_json_object(trimmed);
    }

    if !trimmed.contains('=') && Path::new(trimmed).exists() {
        let contents = fs::read_to_string(trimmed).ok()?;
        return parse_json_object(&contents);
    }

    parse_key_value_config(trimmed)
}

fn parse_key_value_config(raw: &str) -> Option<Value> {
    let mut map = Map::new();
    for entry in raw.split(',') {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}
