//! JSON (de)serialization helpers shared by `checkpointer_postgres`'s row
//! encode/decode paths. Mirrors `checkpointer_sqlite_helpers` but drops the
//! `str -> Value` step: Postgres JSONB columns already decode straight into
//! `serde_json::Value` via `sqlx::Row::get`, so only the `Value -> T` and
//! `T -> String` directions are needed here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::runtimes::checkpointer::CheckpointerError;

/// Serializes `value` to a JSON string (bound with a `::jsonb` cast at the
/// call site), labeling failures with `field` for easier diagnosis.
pub(super) fn serialize_json<T: Serialize>(
    value: &T,
    field: &str,
) -> Result<String, CheckpointerError> {
    serde_json::to_string(value).map_err(|e| CheckpointerError::Other {
        message: format!("serialize {field}: {e}"),
    })
}

/// Converts an already-decoded JSONB [`Value`] into `T`, labeling failures
/// with `field`.
pub(super) fn deserialize_json_value<T: DeserializeOwned>(
    value: Value,
    field: &str,
) -> Result<T, CheckpointerError> {
    serde_json::from_value(value).map_err(|e| CheckpointerError::Other {
        message: format!("deserialize {field}: {e}"),
    })
}

/// Unwraps an `Option<Value>` column that is only `None` when the row
/// genuinely has no checkpoint payload yet for that field.
pub(super) fn require_json_field(
    raw: Option<Value>,
    column: &str,
) -> Result<Value, CheckpointerError> {
    raw.ok_or_else(|| CheckpointerError::Other {
        message: format!("missing {column}"),
    })
}
