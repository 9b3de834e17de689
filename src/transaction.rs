//! Transaction scope for multi-statement mutations.

use crate::db::Database;
use crate::error::{FsError, Result};
use tracing::{error, warn};

/// Begin on construction, commit on [`TransactionScope::commit`], roll back on drop.
///
/// A scope that is dropped without being committed (early return, `?`, panic)
/// discards every statement issued since it began.
pub struct TransactionScope<'a> {
    db: &'a Database,
    done: bool,
}

impl<'a> TransactionScope<'a> {
    pub fn begin(db: &'a Database) -> Result<Self> {
        db.begin().map_err(|e| {
            error!(error = %e, "failed to begin transaction");
            FsError::Transaction
        })?;
        Ok(Self { db, done: false })
    }

    pub fn db(&self) -> &'a Database {
        self.db
    }

    /// Mark the operation successful and make its statements durable.
    pub fn commit(mut self) -> Result<()> {
        self.done = true;
        if let Err(e) = self.db.commit() {
            error!(error = %e, "failed to commit transaction");
            if let Err(e) = self.db.rollback() {
                warn!(error = %e, "rollback after failed commit also failed");
            }
            return Err(FsError::Transaction);
        }
        Ok(())
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if !self.done {
            if let Err(e) = self.db.rollback() {
                error!(error = %e, "failed to roll back transaction");
            }
        }
    }
}
