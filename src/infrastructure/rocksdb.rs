use crate::domain::ports::SessionStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the cached session entries.
pub const CF_SESSION: &str = "session";

/// A persistent session cache backed by RocksDB.
///
/// Lets a participant close the CLI mid-payment and pick the same registration
/// back up on the next run. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBSessionStore {
    db: Arc<DB>,
}

impl RocksDBSessionStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring the
    /// session column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_session = ColumnFamilyDescriptor::new(CF_SESSION, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_session])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn session_cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| PaymentError::Storage("Session column family not found".to_string()))
    }
}

#[async_trait]
impl SessionStore for RocksDBSessionStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        let cf = self.session_cf()?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.session_cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| PaymentError::Storage(format!("Corrupt session entry '{key}': {e}"))),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.session_cf()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}
