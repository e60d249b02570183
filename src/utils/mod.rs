//! Small, focused helpers shared across the crate.
//!
//! Grouped by concern rather than by caller: JSON manipulation, collection
//! constructors, ID generation, a deterministic clock/RNG pair for
//! reproducible tests, and a handful of reusable node test doubles.

pub mod clock;
pub mod collections;
pub mod deterministic_rng;
pub mod id_generator;
pub mod json_ext;
pub mod merge_inspector;
pub mod message_id_helpers;
pub mod testing;
pub mod type_guards;
