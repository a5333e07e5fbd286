//! Entity store wrapper.

use crate::error::{Error, Result};
use crate::models::StoredRecord;
use gashapon_core::Persist;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredRecord>().unwrap();
    models
});

/// A record together with the version it was loaded at.
#[derive(Debug, Clone)]
pub struct Versioned<R> {
    pub record: R,
    pub version: u64,
}

/// A serialized write waiting for an atomic commit.
///
/// Serialization happens up front so a batch either fully validates or
/// touches nothing.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    key: String,
    data: Vec<u8>,
    expected: u64,
}

impl PendingWrite {
    /// Serialize a record for a compare-and-swap commit at `expected`.
    pub fn new<R: Persist>(key: impl Into<String>, record: &R, expected: u64) -> Result<Self> {
        let data = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self { key: key.into(), data, expected })
    }

    /// The key this write targets.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Durable store for player-state records.
///
/// Keys map to bincode-serialized records with a version counter. Writes
/// are optimistic: the caller states the version it read, and a mismatch
/// rejects the whole commit with nothing written.
pub struct Store {
    db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Load a record, materializing the default at version 0 when absent.
    ///
    /// Stored bytes that no longer decode surface as [`Error::Corrupt`];
    /// decoded values are normalized so out-of-range fields never escape
    /// the storage boundary.
    pub fn load<R: Persist>(&self, key: &str) -> Result<Versioned<R>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredRecord> = r.get().primary(key.to_string())?;
        match stored {
            None => Ok(Versioned { record: R::default(), version: 0 }),
            Some(stored) => {
                let mut record: R = bincode::deserialize(&stored.data)
                    .map_err(|_| Error::Corrupt { key: key.to_string() })?;
                record.normalize();
                Ok(Versioned { record, version: stored.version })
            }
        }
    }

    /// Compare-and-swap write of a single record.
    ///
    /// Returns the new version on success.
    pub fn save<R: Persist>(&self, key: &str, record: &R, expected: u64) -> Result<u64> {
        self.save_batch(vec![PendingWrite::new(key, record, expected)?])?;
        Ok(expected + 1)
    }

    /// Commit several writes in one transaction, all or nothing.
    ///
    /// Every write's expected version is checked against the live row
    /// before anything is upserted; the first stale expectation aborts the
    /// whole batch.
    pub fn save_batch(&self, writes: Vec<PendingWrite>) -> Result<()> {
        // A batch may touch each key at most once; a second write would
        // silently clobber the first inside the same transaction
        for (i, write) in writes.iter().enumerate() {
            if writes[..i].iter().any(|w| w.key == write.key) {
                return Err(Error::Database(format!("batch touches '{}' twice", write.key)));
            }
        }

        let rw = self.db.rw_transaction()?;

        for write in &writes {
            let current: Option<StoredRecord> = rw.get().primary(write.key.clone())?;
            let found = current.map(|s| s.version).unwrap_or(0);
            if found != write.expected {
                return Err(Error::VersionConflict {
                    key: write.key.clone(),
                    expected: write.expected,
                    found,
                });
            }
        }

        for write in writes {
            rw.upsert(StoredRecord {
                key: write.key,
                version: write.expected + 1,
                data: write.data,
            })?;
        }

        rw.commit()?;
        Ok(())
    }

    /// Current version of a key, 0 when absent.
    pub fn version(&self, key: &str) -> Result<u64> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredRecord> = r.get().primary(key.to_string())?;
        Ok(stored.map(|s| s.version).unwrap_or(0))
    }

    /// Clear all data.
    pub fn clear(&self) -> Result<()> {
        let keys: Vec<String> = {
            let r = self.db.r_transaction()?;
            let scan = r.scan().primary::<StoredRecord>()?;
            let iter = scan.all()?;
            let records: std::result::Result<Vec<StoredRecord>, _> = iter.collect();
            let records = records.map_err(|e| Error::Database(e.to_string()))?;
            records.into_iter().map(|s| s.key).collect()
        };

        let rw = self.db.rw_transaction()?;
        for key in keys {
            if let Some(record) = rw.get().primary::<StoredRecord>(key)? {
                rw.remove(record)?;
            }
        }
        rw.commit()?;
        Ok(())
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}
