use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Deserialize with JSON-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::invalid(path, err.into_inner().to_string())
    })
}

/// Parse raw JSON text; syntax errors carry their line/column.
pub fn parse_json(src: &str) -> Result<Value> {
    serde_json::from_str::<Value>(src).map_err(|err| {
        SchemaError::invalid(format!("line {}, column {}", err.line(), err.column()), err.to_string())
    })
}
