use std::collections::BTreeMap;
use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A value held by the session store.
///
/// Hosts often keep everything as strings (`"True"`, `"0.5"`); the accessors
/// coerce those so the engine can work with real types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    /// Boolean.
    Flag(bool),
    /// Number.
    Number(f64),
    /// Text, including serialized payloads.
    Text(String),
}

impl StoreValue {
    /// Numeric view; text is parsed, flags are 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    /// Integer view of a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        let n = self.as_f64()?;
        if n.is_finite() && n.fract() == 0.0 {
            Some(n as i64)
        } else {
            None
        }
    }

    /// Boolean view; accepts `true`/`false`, `"True"`/`"False"` and `"yes"`/`"no"`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
        }
    }

    /// Text view, if the value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is empty text.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for StoreValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for StoreValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Host key/value store the engine reads and writes session variables through.
///
/// Writes must be visible to the very next read on the same store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<StoreValue>;

    /// Write a value.
    fn set(&self, key: &str, value: StoreValue);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, StoreValue>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted copy of every key and value.
    pub fn snapshot(&self) -> BTreeMap<String, StoreValue> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoreValue> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: StoreValue) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_coercions() {
        assert_eq!(StoreValue::from("True").as_bool(), Some(true));
        assert_eq!(StoreValue::from("no").as_bool(), Some(false));
        assert_eq!(StoreValue::from("maybe").as_bool(), None);
        assert_eq!(StoreValue::from(" 0.5 ").as_f64(), Some(0.5));
        assert_eq!(StoreValue::from("3").as_i64(), Some(3));
        assert_eq!(StoreValue::from(2.5).as_i64(), None);
    }

    #[test]
    fn read_after_write() {
        let store = MemoryStore::new();
        assert!(store.get("a").is_none());
        store.set("a", StoreValue::from(1_i64));
        assert_eq!(store.get("a"), Some(StoreValue::Number(1.0)));
        store.set("a", StoreValue::from("x"));
        assert_eq!(store.get("a").unwrap().as_text(), Some("x"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted() {
        let store = MemoryStore::new();
        store.set("b", true.into());
        store.set("a", false.into());
        let keys: Vec<String> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
