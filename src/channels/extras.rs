use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Channel;
use crate::types::ChannelType;

/// Versioned key-value store for node-produced metadata and intermediate
/// results ("extras"). Merged via shallow JSON-map union — see
/// [`crate::reducers::MapMerge`].
///
/// # Examples
/// ```
/// use weavegraph::channels::{Channel, ExtrasChannel};
/// use serde_json::json;
///
/// let mut ch = ExtrasChannel::default();
/// ch.get_mut().insert("k".to_string(), json!("v"));
/// assert_eq!(ch.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrasChannel {
    map: FxHashMap<String, Value>,
    version: u32,
}

impl ExtrasChannel {
    #[must_use]
    pub fn new(map: FxHashMap<String, Value>, version: u32) -> Self {
        Self { map, version }
    }
}

impl Default for ExtrasChannel {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
            version: 1,
        }
    }
}

impl Channel for ExtrasChannel {
    type Item = FxHashMap<String, Value>;

    fn get_channel_type(&self) -> ChannelType {
        ChannelType::Extra
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
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn get_mut(&mut self) -> &mut Self::Item {
        &mut self.map
    }

    fn snapshot(&self) -> Self::Item {
        self.map.clone()
    }
}
