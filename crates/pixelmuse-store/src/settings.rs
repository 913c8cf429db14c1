use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Flat JSON key/value settings file
///
/// Every mutation is written through to disk immediately. Defaults are
/// layered underneath whatever the file contains and are never written
/// unless set explicitly.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    defaults: Map<String, Value>,
    data: Map<String, Value>,
}

impl SettingsStore {
    /// Settings file under the platform configuration directory
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("pixelmuse").join(SETTINGS_FILE_NAME))
            .ok_or(StoreError::NoConfigDir)
    }

    /// Open the store at `path`; a missing or empty file yields an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_defaults(path, Map::new())
    }

    pub fn open_with_defaults(path: impl Into<PathBuf>, defaults: Map<String, Value>) -> Result<Self> {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => parse_settings(&path, &contents)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(StoreError::io(&path, err)),
        };

        tracing::debug!(path = %path.display(), keys = data.len(), "opened settings store");

        Ok(Self { path, defaults, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored value, falling back to the defaults
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Whether the file itself holds `key`
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.data.insert(key.into(), value.into());
        self.save()
    }

    /// Remove a key; returns whether it was present
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        if self.data.remove(key).is_none() {
            return Ok(false);
        }

        self.save()?;
        Ok(true)
    }

    /// Drop every stored key
    pub fn clear(&mut self) -> Result<()> {
        self.data.clear();
        self.save()
    }

    /// Defaults overlaid with stored values
    pub fn all(&self) -> Map<String, Value> {
        let mut merged = self.defaults.clone();
        merged.extend(self.data.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(&self.data).map_err(|e| StoreError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&self.path, contents).map_err(|e| StoreError::io(&self.path, e))
    }
}

fn parse_settings(path: &Path, contents: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Malformed {
            path: path.to_path_buf(),
            message: format!("expected a JSON object, found {}", json_type(&other)),
        }),
        Err(e) => Err(StoreError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
