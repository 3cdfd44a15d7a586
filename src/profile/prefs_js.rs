//! `prefs.js` preference file.
//!
//! The browser persists user preferences as one `user_pref("key", value);`
//! call per line. Keys and string values are JSON-compatible string literals,
//! so both are parsed and written with `serde_json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::HostError;
use crate::host::{PrefType, PrefValue, PreferenceStore};

const HEADER: &str = "// Mozilla User Preferences\n\n";
const PREFIX: &str = "user_pref(";
const SUFFIX: &str = ");";

/// User preferences loaded from a profile's `prefs.js`.
#[derive(Debug, Clone)]
pub struct PrefsFile {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
    dirty: bool,
}

impl PrefsFile {
    /// Load `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let values = match std::fs::read_to_string(path) {
            Ok(text) => parse(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preference file at {:?}", path);
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("Loaded {} preferences from {:?}", values.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            values,
            dirty: false,
        })
    }

    /// File this store was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored preferences.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no preferences are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any setter changed the store since it was loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store back if it changed. The file is replaced atomically.
    pub fn save(&mut self) -> Result<(), HostError> {
        if !self.dirty {
            return Ok(());
        }
        let temp = self.path.with_extension("js.part");
        std::fs::write(&temp, render(&self.values))?;
        std::fs::rename(&temp, &self.path)?;
        self.dirty = false;
        log::info!("Saved {} preferences to {:?}", self.values.len(), self.path);
        Ok(())
    }

    fn get(&self, key: &str, expected: PrefType) -> Result<&PrefValue, HostError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| HostError::no_such_key(key))?;
        if value.pref_type() != expected {
            return Err(HostError::TypeMismatch {
                key: key.to_string(),
                expected: expected.name(),
                found: value.pref_type().name(),
            });
        }
        Ok(value)
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<(), HostError> {
        if let Some(existing) = self.values.get(key) {
            if existing.pref_type() != value.pref_type() {
                return Err(HostError::TypeMismatch {
                    key: key.to_string(),
                    expected: existing.pref_type().name(),
                    found: value.pref_type().name(),
                });
            }
            if *existing == value {
                return Ok(());
            }
        }
        self.values.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }
}

impl PreferenceStore for PrefsFile {
    fn pref_type(&self, key: &str) -> PrefType {
        self.values
            .get(key)
            .map(PrefValue::pref_type)
            .unwrap_or(PrefType::Invalid)
    }

    fn get_string(&self, key: &str) -> Result<String, HostError> {
        match self.get(key, PrefType::String)? {
            PrefValue::String(s) => Ok(s.clone()),
            other => Err(mismatch(key, PrefType::String, other)),
        }
    }

    fn get_int(&self, key: &str) -> Result<i32, HostError> {
        match self.get(key, PrefType::Int)? {
            PrefValue::Int(i) => Ok(*i),
            other => Err(mismatch(key, PrefType::Int, other)),
        }
    }

    fn get_bool(&self, key: &str) -> Result<bool, HostError> {
        match self.get(key, PrefType::Bool)? {
            PrefValue::Bool(b) => Ok(*b),
            other => Err(mismatch(key, PrefType::Bool, other)),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        self.set(key, PrefValue::String(value.to_string()))
    }

    fn set_int(&mut self, key: &str, value: i32) -> Result<(), HostError> {
        self.set(key, PrefValue::Int(value))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), HostError> {
        self.set(key, PrefValue::Bool(value))
    }
}

fn mismatch(key: &str, expected: PrefType, found: &PrefValue) -> HostError {
    HostError::TypeMismatch {
        key: key.to_string(),
        expected: expected.name(),
        found: found.pref_type().name(),
    }
}

/// Parse the contents of a `prefs.js` file.
///
/// Blank lines, comments and anything that is not a `user_pref` call are
/// ignored. A `user_pref` call that cannot be parsed is an error.
pub fn parse(text: &str) -> Result<BTreeMap<String, PrefValue>, HostError> {
    let mut values = BTreeMap::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        let Some(call) = line.strip_prefix(PREFIX) else {
            continue;
        };
        let what = format!("prefs.js line {}", index + 1);
        let arguments = call
            .strip_suffix(SUFFIX)
            .ok_or_else(|| HostError::malformed(&what, "missing closing ');'"))?;
        let (key, value) = parse_arguments(arguments).map_err(|e| HostError::malformed(&what, e))?;
        values.insert(key, value);
    }
    Ok(values)
}

fn parse_arguments(arguments: &str) -> Result<(String, PrefValue), String> {
    let mut stream = serde_json::Deserializer::from_str(arguments).into_iter::<String>();
    let key = match stream.next() {
        Some(Ok(key)) => key,
        Some(Err(e)) => return Err(format!("bad key: {e}")),
        None => return Err("missing key".to_string()),
    };
    let rest = arguments[stream.byte_offset()..].trim_start();
    let rest = rest
        .strip_prefix(',')
        .ok_or_else(|| "expected ',' after key".to_string())?;
    let value: Value = serde_json::from_str(rest.trim()).map_err(|e| format!("bad value: {e}"))?;
    let value = match value {
        Value::String(s) => PrefValue::String(s),
        Value::Bool(b) => PrefValue::Bool(b),
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(PrefValue::Int)
            .ok_or_else(|| format!("{n} is not a 32-bit integer"))?,
        other => return Err(format!("unsupported value {other}")),
    };
    Ok((key, value))
}

/// Render preferences in `prefs.js` form, one sorted line per key.
pub fn render(values: &BTreeMap<String, PrefValue>) -> String {
    let mut out = String::from(HEADER);
    for (key, value) in values {
        let key = Value::String(key.clone());
        let value = match value {
            PrefValue::String(s) => Value::String(s.clone()).to_string(),
            PrefValue::Int(i) => i.to_string(),
            PrefValue::Bool(b) => b.to_string(),
        };
        out.push_str(&format!("{PREFIX}{key}, {value}{SUFFIX}\n"));
    }
    out
}
