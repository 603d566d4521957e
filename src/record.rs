//! Record shapes flowing through the pipeline and the two pure transforms
//! between them: [`build_nested()`] and [`separate()`].

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

const PATH_SEPARATOR: char = '.';

/// Flat key/value pairs in header order. Keys are unique; re-inserting a key
/// overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    entries: Vec<(String, String)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FlatRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FlatRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

pub type NestedRecord = BTreeMap<String, NestedValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedValue {
    Leaf(String),
    Branch(NestedRecord),
}

impl NestedValue {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            NestedValue::Leaf(value) => Some(value),
            NestedValue::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&NestedRecord> {
        match self {
            NestedValue::Branch(map) => Some(map),
            NestedValue::Leaf(_) => None,
        }
    }
}

/// A record split into the mandatory typed columns and a catch-all bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistableUser {
    pub name: String,
    pub age: i64,
    pub address: Option<NestedValue>,
    pub additional_info: Option<NestedRecord>,
}

impl PersistableUser {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
            address: None,
            additional_info: None,
        }
    }
}

/// Expands dot-path keys into nested maps, applying keys in record order.
///
/// When two keys disagree on whether a segment is a leaf or a mapping, the
/// later key wins and a warning is logged.
pub fn build_nested(flat: &FlatRecord) -> NestedRecord {
    let mut root = NestedRecord::new();
    for (key, value) in flat.iter() {
        let segments = key.split(PATH_SEPARATOR).collect::<Vec<_>>();
        insert_path(&mut root, &segments, value, key);
    }
    root
}

fn insert_path(level: &mut NestedRecord, segments: &[&str], value: &str, key: &str) {
    match segments {
        [] => {}
        [last] => {
            let previous = level.insert(last.to_string(), NestedValue::Leaf(value.to_string()));
            if let Some(NestedValue::Branch(_)) = previous {
                warn!("Key '{key}' replaces a nested mapping with a leaf value");
            }
        }
        [head, rest @ ..] => {
            let slot = level
                .entry(head.to_string())
                .or_insert_with(|| NestedValue::Branch(NestedRecord::new()));
            if let NestedValue::Leaf(previous) = slot {
                warn!("Key '{key}' replaces leaf value '{previous}' with a nested mapping");
                *slot = NestedValue::Branch(NestedRecord::new());
            }
            if let NestedValue::Branch(child) = slot {
                insert_path(child, rest, value, key);
            }
        }
    }
}

pub fn separate(nested: &NestedRecord) -> PersistableUser {
    let name_part = |field: &str| {
        nested
            .get("name")
            .and_then(NestedValue::as_branch)
            .and_then(|name| name.get(field))
            .and_then(NestedValue::as_leaf)
            .unwrap_or("")
    };
    let name = format!("{} {}", name_part("firstName"), name_part("lastName"))
        .trim()
        .to_string();

    let raw_age = nested.get("age").and_then(NestedValue::as_leaf);
    let age = match raw_age.and_then(parse_age) {
        Some(age) => age,
        None => {
            warn!(
                "Age {:?} for '{name}' is not an integer; defaulting to 0",
                raw_age.unwrap_or_default()
            );
            0
        }
    };

    let additional_info = nested
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "name" | "age" | "address"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<NestedRecord>();

    PersistableUser {
        name,
        age,
        address: nested.get("address").cloned(),
        additional_info: (!additional_info.is_empty()).then_some(additional_info),
    }
}

/// Lenient integer parse: leading whitespace, optional sign, then leading
/// digits. Anything after the digits is ignored. `None` when there are no
/// digits or the value does not fit in an `i64`.
pub fn parse_age(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits_end = trimmed[sign_len..]
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len() - sign_len);
    if digits_end == 0 {
        return None;
    }
    trimmed[..sign_len + digits_end].parse::<i64>().ok()
}
