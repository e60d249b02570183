//! Channel-based state storage and versioning.
//!
//! A workflow's [`VersionedState`](crate::state::VersionedState) is split into
//! independent channels — messages, free-form extras, and errors — each
//! tracked with its own monotonic version counter. Reducers mutate a
//! channel's contents through [`Channel::get_mut`]; the barrier phase in
//! [`App::apply_barrier`](crate::app::App::apply_barrier) is the only place
//! that bumps versions, after comparing before/after snapshots.
//!
//! # Examples
//!
//! ```
//! use weavegraph::channels::{Channel, MessagesChannel};
//! use weavegraph::message::Message;
//!
//! let mut ch = MessagesChannel::new(vec![Message::user("hi")], 1);
//! assert_eq!(ch.version(), 1);
//! ch.get_mut().push(Message::assistant("hello"));
//! assert_eq!(ch.len(), 2);
//! ```

pub mod errors;
mod extras;
mod messages;

pub use errors::ErrorsChannel;
pub use extras::ExtrasChannel;
pub use messages::MessagesChannel;

use crate::types::ChannelType;

/// Common behavior shared by every versioned state channel.
///
/// A channel owns exactly one piece of workflow state (e.g. `Vec<Message>`)
/// plus a `u32` version counter. Channels never bump their own version —
/// that is the barrier's responsibility, so concurrent node outputs can be
/// merged first and the version reflects one coherent step, not partial
/// writes.
pub trait Channel {
    /// The value this channel stores (e.g. `Vec<Message>`).
    type Item;

    /// Identifies which `ChannelType` this channel implements, for reducer
    /// dispatch and diagnostics.
    fn get_channel_type(&self) -> ChannelType;

    /// Whether this channel's contents should survive a checkpoint restore.
    /// All channels defined in this crate are persistent today.
    fn persistent(&self) -> bool;

    /// Current version counter.
    fn version(&self) -> u32;

    /// Overwrite the version counter (used by the barrier after detecting a
    /// real content change).
    fn set_version(&mut self, version: u32);

    /// Number of items/entries currently stored.
    fn len(&self) -> usize;

    /// True if `len() == 0`.
    fn is_empty(&self) -> bool;

    /// Mutable access to the underlying item, for reducers to update in place.
    fn get_mut(&mut self) -> &mut Self::Item;

    /// A cloned, immutable snapshot of the current contents.
    fn snapshot(&self) -> Self::Item;
}
