//! Constructors for the collection types used throughout node and state code.

use rustc_hash::FxHashMap;
use serde_json::{Number, Value};

/// Creates an empty extra map with the crate's standard hasher.
///
/// Prefer this over `FxHashMap::default()` at call sites that build a
/// `NodePartial.extra` map, so the hasher choice stays in one place.
#[must_use]
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

/// Builds an extra map directly from key/value pairs, e.g. the output of
/// `.zip()` or a literal array of tuples.
#[must_use]
pub fn extra_map_from_pairs<I, K>(pairs: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Layers several extra maps left-to-right; later maps win on key conflicts.
#[must_use]
pub fn merge_extra_maps<'a, I>(maps: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = &'a FxHashMap<String, Value>>,
{
    let mut merged = FxHashMap::default();
    for map in maps {
        merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Typed accessors on top of the crate's `extra` map shape, so call sites
/// don't have to match on `serde_json::Value` for the common scalar cases.
pub trait ExtraMapExt {
    fn insert_string(&mut self, key: impl Into<String>, value: impl Into<String>);
    fn insert_number(&mut self, key: impl Into<String>, value: impl Into<Number>);
    fn insert_bool(&mut self, key: impl Into<String>, value: bool);
    fn get_string(&self, key: &str) -> Option<&str>;
    fn get_number(&self, key: &str) -> Option<Number>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl ExtraMapExt for FxHashMap<String, Value> {
    fn insert_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key.into(), Value::String(value.into()));
    }

    fn insert_number(&mut self, key: impl Into<String>, value: impl Into<Number>) {
        self.insert(key.into(), Value::Number(value.into()));
    }

    fn insert_bool(&mut self, key: impl Into<String>, value: bool) {
        self.insert(key.into(), Value::Bool(value));
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn get_number(&self, key: &str) -> Option<Number> {
        match self.get(key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}
