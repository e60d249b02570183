//! Small JSON (de)serialization helpers shared by `checkpointer_sqlite`'s row
//! encode/decode paths, factored out so every column follows the same
//! "wrap the underlying error with the field name" convention instead of
//! repeating `.map_err(...)` at each call site.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::runtimes::checkpointer::CheckpointerError;

/// Serializes `value` to a JSON string, labeling failures with `field` for
/// easier diagnosis.
pub(super) fn serialize_json<T: Serialize>(
    value: &T,
    field: &str,
) -> Result<String, CheckpointerError> {
    serde_json::to_string(value).map_err(|e| CheckpointerError::Other {
        message: format!("serialize {field}: {e}"),
    })
}

/// Parses a JSON string column into a [`Value`], labeling failures with `field`.
pub(super) fn deserialize_json(raw: &str, field: &str) -> Result<Value, CheckpointerError> {
    serde_json::from_str(raw).map_err(|e| CheckpointerError::Other {
        message: format!("deserialize {field}: {e}"),
    })
}

/// Converts an already-parsed [`Value`] into `T`, labeling failures with `field`.
pub(super) fn deserialize_json_value<T: DeserializeOwned>(
    value: Value,
    field: &str,
) -> Result<T, CheckpointerError> {
    serde_json::from_value(value).map_err(|e| CheckpointerError::Other {
        message: format!("deserialize {field}: {e}"),
    })
}

/// Unwraps an `Option<String>` column that is only `None` when the row
/// genuinely has no checkpoint payload yet for that field.
pub(super) fn require_json_field(
    raw: Option<String>,
    column: &str,
) -> Result<String, CheckpointerError> {
    raw.ok_or_else(|| CheckpointerError::Other {
        message: format!("missing {column}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_serialize_and_deserialize() {
        let value = json!({"a": 1, "b": "two"});
        let encoded = serialize_json(&value, "test").unwrap();
        let decoded = deserialize_json(&encoded, "test").unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn deserialize_json_value_reports_field_on_failure() {
        let err = deserialize_json_value::<u64>(json!("not a number"), "count").unwrap_err();
        match err {
            CheckpointerError::Other { message } => assert!(message.contains("count")),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn require_json_field_errors_on_none() {
        let err = require_json_field(None, "state_json").unwrap_err();
        match err {
            CheckpointerError::Other { message } => assert!(message.contains("state_json")),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn require_json_field_passes_through_some() {
        let value = require_json_field(Some("{}".to_string()), "state_json").unwrap();
        assert_eq!(value, "{}");
    }
}
