//! Read-modify-write helpers for JSON lists kept under one storage key.

use qcore::{Error, Result, Storage};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Load the list stored under `key`. A missing key is an empty list.
pub(crate) async fn load<S: Storage, T: DeserializeOwned>(
    storage: &S,
    key: &str,
    operation: &'static str,
) -> Result<Vec<T>> {
    let mut items = storage
        .get(&[key])
        .await
        .map_err(|e| Error::storage(operation, e))?;
    match items.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| Error::storage(operation, e)),
    }
}

/// Replace the list stored under `key`.
pub(crate) async fn save<S: Storage, T: Serialize>(
    storage: &S,
    key: &str,
    items: &[T],
    operation: &'static str,
) -> Result<()> {
    let value = serde_json::to_value(items).map_err(|e| Error::storage(operation, e))?;
    let mut entry = Map::new();
    entry.insert(key.to_owned(), value);
    storage
        .set(entry)
        .await
        .map_err(|e| Error::storage(operation, e))
}

/// Delete everything stored under `key`.
pub(crate) async fn remove<S: Storage>(storage: &S, key: &str, operation: &'static str) -> Result<()> {
    storage
        .remove(&[key])
        .await
        .map_err(|e| Error::storage(operation, e))
}
