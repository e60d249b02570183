use rustc_hash::FxHashSet;

use super::{Reducer, ReducerError};
use crate::{channels::Channel, node::NodePartial, state::VersionedState};

/// Conversation-append: extends the message log with an update's messages,
/// skipping any whose id duplicates one already present (or an earlier one
/// in the same update), and otherwise preserving arrival order. Messages
/// with an empty id (built by struct literal rather than a constructor)
/// are never treated as duplicates of anything, so untagged call sites keep
/// their old append-only behavior.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddMessages;
impl Reducer for AddMessages {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> Result<(), ReducerError> {
        let Some(messages_update) = &update.messages else {
            return Ok(());
        };
        if messages_update.is_empty() {
            return Ok(());
        }

        let existing_ids: FxHashSet<&str> = state
            .messages
            .get_mut()
            .iter()
            .map(|m| m.id.as_str())
            .filter(|id| !id.is_empty())
            .collect();

        let mut seen_in_batch: FxHashSet<String> = FxHashSet::default();
        let to_append: Vec<_> = messages_update
            .iter()
            .cloned()
            .filter(|m| {
                if m.id.is_empty() {
                    return true;
                }
                if existing_ids.contains(m.id.as_str()) {
                    return false;
                }
                seen_in_batch.insert(m.id.clone())
            })
            .collect();

        if !to_append.is_empty() {
            state.messages.get_mut().extend(to_append);
        }
        Ok(())
    }
}
