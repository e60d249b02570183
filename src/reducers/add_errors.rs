use super::{Reducer, ReducerError};
use crate::{channels::Channel, node::NodePartial, state::VersionedState};

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddErrors;
impl Reducer for AddErrors {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) -> Result<(), ReducerError> {
        if let Some(errors_update) = &update.errors
            && !errors_update.is_empty()
        {
            state.errors.get_mut().extend(errors_update.clone());
        }
        Ok(())
    }
}
