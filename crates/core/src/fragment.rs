//! Settings fragments: the payload of every configuration layer.
//!
//! A fragment maps setting keys to [`SettingValue`]s. Fragments combine with
//! [`deep_merge`]: scalars and lists from the overlay replace, nested tables
//! merge key-wise, and [`SettingValue::Unset`] deletes the key from the
//! accumulated result.
//!
//! Explicit absence is written as `null` in JSON documents. TOML has no null,
//! so the reserved string [`UNSET_MARKER`] stands in for it there.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Reserved string value meaning "delete this key" in TOML documents.
pub const UNSET_MARKER: &str = "@unset";

/// A single setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
    Table(Fragment),
    /// Explicit absence: removes the key when merged.
    Unset,
}

impl SettingValue {
    /// Short type name, used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Int(_) => "integer",
            SettingValue::Float(_) => "number",
            SettingValue::Str(_) => "string",
            SettingValue::List(_) => "list",
            SettingValue::Table(_) => "table",
            SettingValue::Unset => "unset",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(n) => Some(*n),
            SettingValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Fragment> {
        match self {
            SettingValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Render the value for logs and trace entries.
    pub fn display(&self) -> String {
        match self {
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::Int(n) => n.to_string(),
            SettingValue::Float(f) => f.to_string(),
            SettingValue::Str(s) => s.clone(),
            SettingValue::List(items) => format!("[{}]", items.join(", ")),
            SettingValue::Table(t) => format!("{{{} keys}}", t.len()),
            SettingValue::Unset => UNSET_MARKER.into(),
        }
    }
}

impl TryFrom<serde_json::Value> for SettingValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(SettingValue::Unset),
            Value::Bool(b) => Ok(SettingValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SettingValue::Int(i))
                } else {
                    n.as_f64()
                        .map(SettingValue::Float)
                        .ok_or_else(|| format!("unsupported number: {n}"))
                }
            }
            Value::String(s) if s == UNSET_MARKER => Ok(SettingValue::Unset),
            Value::String(s) => Ok(SettingValue::Str(s)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(format!("lists may only contain strings, found {other}")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::List),
            Value::Object(map) => {
                let mut fragment = Fragment::new();
                for (key, value) in map {
                    let value =
                        SettingValue::try_from(value).map_err(|e| format!("{key}: {e}"))?;
                    fragment.insert(key, value);
                }
                Ok(SettingValue::Table(fragment))
            }
        }
    }
}

impl From<&SettingValue> for serde_json::Value {
    fn from(value: &SettingValue) -> Self {
        use serde_json::Value;
        match value {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Int(n) => Value::from(*n),
            SettingValue::Float(f) => Value::from(*f),
            SettingValue::Str(s) => Value::String(s.clone()),
            SettingValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            SettingValue::Table(t) => Value::Object(
                t.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
            SettingValue::Unset => Value::Null,
        }
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        SettingValue::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

/// A mapping from setting key to value. Keys iterate in sorted order, so
/// anything derived from a fragment is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(BTreeMap<String, SettingValue>);

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// Look up a dotted path such as `memory.include_personal`.
    pub fn get_path(&self, path: &str) -> Option<&SettingValue> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SettingValue) -> Option<SettingValue> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this fragment with every `Unset` entry dropped, recursively.
    pub fn without_unset(&self) -> Fragment {
        let mut out = Fragment::new();
        for (key, value) in &self.0 {
            match value {
                SettingValue::Unset => {}
                SettingValue::Table(t) => {
                    out.insert(key.clone(), SettingValue::Table(t.without_unset()));
                }
                other => {
                    out.insert(key.clone(), other.clone());
                }
            }
        }
        out
    }
}

impl FromIterator<(String, SettingValue)> for Fragment {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Fragment(iter.into_iter().collect())
    }
}

/// Merge `overlay` into `base`, overlay winning per key.
///
/// The accumulated fragment never holds `Unset`: an unset in the overlay
/// deletes the key, and unset entries inside a newly inserted table are
/// stripped.
pub fn deep_merge(base: &mut Fragment, overlay: &Fragment) {
    for (key, value) in overlay.iter() {
        match value {
            SettingValue::Unset => {
                base.remove(key);
            }
            SettingValue::Table(over) => match base.0.get_mut(key) {
                Some(SettingValue::Table(existing)) => deep_merge(existing, over),
                _ => {
                    base.insert(key.clone(), SettingValue::Table(over.without_unset()));
                }
            },
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}
