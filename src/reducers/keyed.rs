use std::sync::Arc;

use super::{Reducer, ReducerError};
use crate::{
    channels::Channel, node::NodePartial, schema::StateSchema, state::VersionedState,
    types::ChannelType,
};

/// `Extra`-channel reducer that consults a [`StateSchema`] to merge each key
/// independently, instead of `MapMerge`'s blanket last-writer-wins.
///
/// Keys not declared in the schema still replace (matching `MapMerge`), so a
/// schema only needs to cover the fields that need non-default merge
/// semantics. A merge-shape mismatch (e.g. a declared `AppendList` field
/// receiving a non-array value) fails the whole update for this channel: no
/// key from `update` is applied, and the base state is left untouched, so
/// the producing branch's failure never corrupts a sibling branch's merge
/// (§4.1 — a reducer that raises is treated as a node failure for the
/// producing branch).
#[derive(Clone)]
pub struct KeyedReducer {
    schema: Arc<StateSchema>,
}

impl KeyedReducer {
    #[must_use]
    pub fn new(schema: Arc<StateSchema>) -> Self {
        Self { schema }
    }
}

impl Reducer for KeyedReducer {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> Result<(), ReducerError> {
        let Some(extras_update) = &update.extra else {
            return Ok(());
        };
        if extras_update.is_empty() {
            return Ok(());
        }

        let existing = state.extra.snapshot();
        let mut merged = rustc_hash::FxHashMap::default();
        for (k, incoming) in extras_update.iter() {
            let base = existing.get(k);
            match self.schema.merge_field(k, base, incoming.clone()) {
                Ok(value) => {
                    merged.insert(k.clone(), value);
                }
                Err(err) => {
                    return Err(ReducerError::Apply {
                        channel: ChannelType::Extra,
                        message: format!("key {k:?}: {err}"),
                    });
                }
            }
        }

        let state_map = state.extra.get_mut();
        for (k, v) in merged {
            state_map.insert(k, v);
        }
        Ok(())
    }
}
