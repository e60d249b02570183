//! Optional per-field merge semantics for the `Extra` channel.
//!
//! By default, the `Extra` channel merges via [`MapMerge`](crate::reducers::MapMerge):
//! last-writer-wins per key. A [`StateSchema`] lets a graph author declare, per
//! key, a different reducer (append-list, merge-map, sum-int, string-set-union)
//! so that parallel branches writing to the same key combine instead of
//! clobbering each other. A `GraphBuilder` with no schema keeps the existing
//! `MapMerge` behavior unchanged.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// Per-key merge strategy for values stored in the `Extra` channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraReducerKind {
    /// Last write wins (the default `MapMerge` behavior for this key).
    Replace,
    /// Treat both sides as JSON arrays and concatenate them.
    AppendList,
    /// Treat both sides as JSON objects and shallow-merge them.
    MergeMap,
    /// Treat both sides as JSON integers and add them.
    SumInt,
    /// Treat both sides as JSON arrays of strings, union them, and dedup
    /// while preserving first-seen order.
    StringSetUnion,
}

/// Declares a single field's default value and merge reducer.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub reducer: ExtraReducerKind,
    pub default: Value,
}

impl FieldSpec {
    #[must_use]
    pub fn new(reducer: ExtraReducerKind, default: Value) -> Self {
        Self { reducer, default }
    }
}

/// Errors raised while declaring or applying a [`StateSchema`].
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SchemaError {
    /// The same field name was declared twice with different reducers.
    #[error("field {name:?} already declared with a different reducer")]
    #[diagnostic(
        code(weavegraph::schema::duplicate_field),
        help("Declare each field exactly once, or reuse the same reducer if re-declaring is intentional.")
    )]
    DuplicateField { name: String },

    /// A reducer could not combine the two sides because they were not the
    /// JSON shape the reducer expects (e.g. `AppendList` applied to a string).
    #[error("field {name:?}: reducer {reducer:?} cannot merge {existing} with {incoming}")]
    #[diagnostic(
        code(weavegraph::schema::merge_shape_mismatch),
        help("Check that every writer of this field produces the JSON shape its reducer expects.")
    )]
    MergeShapeMismatch {
        name: String,
        reducer: ExtraReducerKind,
        existing: Value,
        incoming: Value,
    },
}

/// Declares typed state fields, their default values, and per-field merge
/// reducers, consulted by [`KeyedReducer`](crate::reducers::keyed::KeyedReducer)
/// when merging updates into the `Extra` channel.
///
/// A `GraphBuilder` with no schema keeps the existing all-keys-replace
/// (`MapMerge`) behavior; registering a schema via
/// `GraphBuilder::with_schema` swaps the `Extra` channel reducer for a
/// `KeyedReducer` wrapping this schema.
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    fields: FxHashMap<String, FieldSpec>,
}

impl StateSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Idempotent: re-declaring the same name with the
    /// same reducer is a no-op; re-declaring with a different reducer is an
    /// error.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        spec: FieldSpec,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        match self.fields.get(&name) {
            Some(existing) if existing.reducer != spec.reducer => {
                Err(SchemaError::DuplicateField { name })
            }
            _ => {
                self.fields.insert(name, spec);
                Ok(())
            }
        }
    }

    /// Builder-style variant of [`add_field`](Self::add_field) that panics on
    /// conflicting re-declaration. Intended for compile-time-known schemas
    /// assembled in one place; use `add_field` directly if a schema is built
    /// incrementally from data the caller cannot guarantee is conflict-free.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.add_field(name, spec)
            .expect("StateSchema::with_field: conflicting reducer for this field name");
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn fields(&self) -> &FxHashMap<String, FieldSpec> {
        &self.fields
    }

    /// Produces a fresh `extra` map populated from every declared field's
    /// default value.
    #[must_use]
    pub fn default_state(&self) -> FxHashMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect()
    }

    /// Merges `incoming` into `base` for a single key, using the schema's
    /// reducer for that key if declared, else replace.
    pub fn merge_field(
        &self,
        name: &str,
        base: Option<&Value>,
        incoming: Value,
    ) -> Result<Value, SchemaError> {
        let Some(spec) = self.fields.get(name) else {
            return Ok(incoming);
        };
        let Some(existing) = base else {
            return Ok(incoming);
        };

        let merged = match spec.reducer {
            ExtraReducerKind::Replace => incoming,
            ExtraReducerKind::AppendList => {
                let (Some(existing_arr), Some(incoming_arr)) =
                    (existing.as_array(), incoming.as_array())
                else {
                    return Err(SchemaError::MergeShapeMismatch {
                        name: name.to_string(),
                        reducer: spec.reducer.clone(),
                        existing: existing.clone(),
                        incoming,
                    });
                };
                let mut merged = existing_arr.clone();
                merged.extend(incoming_arr.clone());
                Value::Array(merged)
            }
            ExtraReducerKind::MergeMap => {
                let (Some(existing_obj), Some(incoming_obj)) =
                    (existing.as_object(), incoming.as_object())
                else {
                    return Err(SchemaError::MergeShapeMismatch {
                        name: name.to_string(),
                        reducer: spec.reducer.clone(),
                        existing: existing.clone(),
                        incoming,
                    });
                };
                let mut merged = existing_obj.clone();
                for (k, v) in incoming_obj {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Object(merged)
            }
            ExtraReducerKind::SumInt => {
                let (Some(existing_int), Some(incoming_int)) =
                    (existing.as_i64(), incoming.as_i64())
                else {
                    return Err(SchemaError::MergeShapeMismatch {
                        name: name.to_string(),
                        reducer: spec.reducer.clone(),
                        existing: existing.clone(),
                        incoming,
                    });
                };
                Value::from(existing_int + incoming_int)
            }
            ExtraReducerKind::StringSetUnion => {
                let (Some(existing_arr), Some(incoming_arr)) =
                    (existing.as_array(), incoming.as_array())
                else {
                    return Err(SchemaError::MergeShapeMismatch {
                        name: name.to_string(),
                        reducer: spec.reducer.clone(),
                        existing: existing.clone(),
                        incoming,
                    });
                };
                let mut seen = FxHashMap::default();
                let mut union = Vec::new();
                for v in existing_arr.iter().chain(incoming_arr.iter()) {
                    if let Some(s) = v.as_str()
                        && seen.insert(s.to_string(), ()).is_none()
                    {
                        union.push(Value::String(s.to_string()));
                    }
                }
                Value::Array(union)
            }
        };
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_field_replaces_when_undeclared() {
        let schema = StateSchema::new();
        let merged = schema
            .merge_field("anything", Some(&Value::from(1)), Value::from(2))
            .unwrap();
        assert_eq!(merged, Value::from(2));
    }

    #[test]
    fn append_list_concatenates() {
        let schema = StateSchema::new().with_field(
            "results",
            FieldSpec::new(ExtraReducerKind::AppendList, Value::Array(vec![])),
        );
        let merged = schema
            .merge_field(
                "results",
                Some(&Value::from(vec!["a"])),
                Value::from(vec!["b"]),
            )
            .unwrap();
        assert_eq!(merged, Value::from(vec!["a", "b"]));
    }

    #[test]
    fn sum_int_adds() {
        let schema = StateSchema::new().with_field(
            "counters.total",
            FieldSpec::new(ExtraReducerKind::SumInt, Value::from(0)),
        );
        let merged = schema
            .merge_field("counters.total", Some(&Value::from(3)), Value::from(4))
            .unwrap();
        assert_eq!(merged, Value::from(7));
    }

    #[test]
    fn string_set_union_dedups_preserving_order() {
        let schema = StateSchema::new().with_field(
            "tags",
            FieldSpec::new(ExtraReducerKind::StringSetUnion, Value::Array(vec![])),
        );
        let merged = schema
            .merge_field(
                "tags",
                Some(&Value::from(vec!["x", "y"])),
                Value::from(vec!["y", "z"]),
            )
            .unwrap();
        assert_eq!(merged, Value::from(vec!["x", "y", "z"]));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let schema = StateSchema::new().with_field(
            "results",
            FieldSpec::new(ExtraReducerKind::AppendList, Value::Array(vec![])),
        );
        let err = schema
            .merge_field("results", Some(&Value::from("not-an-array")), Value::from(1))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MergeShapeMismatch { .. }));
    }

    #[test]
    fn duplicate_field_same_reducer_is_idempotent() {
        let mut schema = StateSchema::new();
        schema
            .add_field(
                "results",
                FieldSpec::new(ExtraReducerKind::AppendList, Value::Array(vec![])),
            )
            .unwrap();
        schema
            .add_field(
                "results",
                FieldSpec::new(ExtraReducerKind::AppendList, Value::Array(vec![])),
            )
            .unwrap();
    }

    #[test]
    fn duplicate_field_conflicting_reducer_errors() {
        let mut schema = StateSchema::new();
        schema
            .add_field(
                "results",
                FieldSpec::new(ExtraReducerKind::AppendList, Value::Array(vec![])),
            )
            .unwrap();
        let err = schema
            .add_field(
                "results",
                FieldSpec::new(ExtraReducerKind::Replace, Value::Null),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }
}
