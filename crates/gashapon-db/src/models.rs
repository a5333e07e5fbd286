//! Storage models for the record table.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// One durable record row.
///
/// The payload is an opaque bincode blob; the typed surface lives in
/// [`Store`](crate::Store). `version` counts committed writes to this key
/// and backs the compare-and-swap discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredRecord {
    /// Primary key, e.g. `"wallet"` or `"vitality:mochi"`.
    #[primary_key]
    pub key: String,
    /// Number of committed writes to this key.
    pub version: u64,
    /// Serialized record payload.
    pub data: Vec<u8>,
}
