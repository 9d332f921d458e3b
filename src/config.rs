use crate::error::SettingsError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const KEY_API_KEY: &str = "openai_api_key";
pub const KEY_MODEL: &str = "model";
pub const KEY_MAX_TOKENS: &str = "max_tokens";
pub const KEY_TEMPERATURE: &str = "temperature";
pub const KEY_LANGUAGE: &str = "language";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

const SETTINGS_FILE: &str = "aiwriter.json";

/// Flat key/value settings. Lookups never fail: anything missing or unreadable
/// falls back to the caller's default.
pub trait SettingsStore {
    fn get(&self, key: &str, default: Value) -> Value;
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key, Value::from(default)) {
            Value::String(s) => s,
            Value::Null => default.to_string(),
            other => other.to_string(),
        }
    }
}

/// Settings persisted as a single JSON object on disk. Every access goes to
/// the file; there is no cache and no lock, so the last writer wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `aiwriter.json` next to the executable, or `AIWRITER_CONFIG` when set.
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var("AIWRITER_CONFIG") {
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join(SETTINGS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Map<String, Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "settings file is not a JSON object; using defaults");
                Map::new()
            }
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str, default: Value) -> Value {
        self.read_all().remove(key).unwrap_or(default)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut data = self.read_all();
        data.insert(key.to_string(), value);

        let io_err = |source| SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        serde::Serialize::serialize(&Value::Object(data), &mut ser)?;
        fs::write(&self.path, buf).map_err(io_err)?;
        tracing::debug!(key, path = %self.path.display(), "setting saved");
        Ok(())
    }
}

/// In-memory store for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.into());
        }
        self
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str, default: Value) -> Value {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
            .unwrap_or(default)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// Typed view of the stored settings, coerced the way the request needs them.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub openai_api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            language: String::new(),
        }
    }
}

impl Settings {
    pub fn load(store: &dyn SettingsStore) -> Self {
        let max_tokens = store.get(KEY_MAX_TOKENS, Value::from(DEFAULT_MAX_TOKENS.to_string()));
        let temperature = store.get(KEY_TEMPERATURE, Value::from(DEFAULT_TEMPERATURE.to_string()));
        Self {
            openai_api_key: store.get_string(KEY_API_KEY, ""),
            model: store.get_string(KEY_MODEL, DEFAULT_MODEL),
            max_tokens: coerce_u32(&max_tokens).unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: coerce_f64(&temperature).unwrap_or(DEFAULT_TEMPERATURE),
            language: store.get_string(KEY_LANGUAGE, ""),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.openai_api_key.is_empty()
    }
}

pub(crate) fn coerce_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
