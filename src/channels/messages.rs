use serde::{Deserialize, Serialize};

use super::Channel;
use crate::message::Message;
use crate::types::ChannelType;

/// Versioned store for the ordered message log of a workflow run.
///
/// # Examples
/// ```
/// use weavegraph::channels::{Channel, MessagesChannel};
/// use weavegraph::message::Message;
///
/// let mut ch = MessagesChannel::default();
/// ch.get_mut().push(Message::user("hi"));
/// assert_eq!(ch.snapshot(), vec![Message::user("hi")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesChannel {
    items: Vec<Message>,
    version: u32,
}

impl MessagesChannel {
    #[must_use]
    pub fn new(items: Vec<Message>, version: u32) -> Self {
        Self { items, version }
    }
}

impl Default for MessagesChannel {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            version: 1,
        }
    }
}

impl Channel for MessagesChannel {
    type Item = Vec<Message>;

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Message
    }

    fn persistent(&self) -> bool {
        true
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get_mut(&mut self) -> &mut Self::Item {
        &mut self.items
    }

    fn snapshot(&self) -> Self::Item {
        self.items.clone()
    }
}
