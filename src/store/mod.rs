//! Store facade
//!
//! [`SqlFs`] owns one connection to a store file. Every operation, from here or from
//! any node handle, takes the store-wide lock shared by all handles on the same
//! path, then the connection; writes additionally run inside a transaction.

pub mod schema;

pub use schema::{InfoField, STORE_VERSION};

use crate::concurrency::{canonical_store_path, Locker};
use crate::config::StoreConfig;
use crate::db::{Database, DbError};
use crate::error::{FsError, Result};
use crate::payload::{Payload, PAYLOAD_TABLE};
use crate::transaction::TransactionScope;
use crate::tree::node::NODE_TABLE;
use crate::tree::path::{self, Target};
use crate::tree::{Directory, File, Node};
use crate::types::{FsId, NodeKind};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// State shared by a store handle and every node handle derived from it
pub(crate) struct StoreShared {
    path: PathBuf,
    locker: Locker,
    conn: Mutex<Option<Database>>,
}

impl StoreShared {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with the store locked.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let _guard = self.locker.lock();
        let conn = self.conn.lock();
        let db = conn.as_ref().ok_or(FsError::StoreClosed)?;
        f(db)
    }

    /// Run `f` with the store locked, inside a transaction committed only if `f`
    /// succeeds.
    pub(crate) fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Database) -> Result<T>,
    ) -> Result<T> {
        let result = self.read(|db| {
            let scope = TransactionScope::begin(db)?;
            let value = f(db)?;
            scope.commit()?;
            Ok(value)
        });
        match &result {
            Ok(_) => debug!(op, "committed"),
            Err(e) => warn!(op, error = %e, "operation rejected"),
        }
        result
    }

    fn close(&self) -> Result<()> {
        let db = {
            let _guard = self.locker.lock();
            self.conn.lock().take()
        };
        self.locker.release();
        match db {
            Some(db) => db.close().map_err(|e| close_failed(&self.path, e)),
            None => Ok(()),
        }
    }
}

fn close_failed(path: &Path, e: DbError) -> FsError {
    error!(path = %path.display(), error = %e, "failed to close store");
    FsError::CannotCloseStore(format!("{}: {}", path.display(), e))
}

/// Handle to one store file
pub struct SqlFs {
    shared: Arc<StoreShared>,
    fresh_tables: bool,
}

impl SqlFs {
    /// Open the store at `path`, creating (or re-creating) its tables when needed.
    ///
    /// The path is normalized first, so every spelling of one file shares a lock.
    pub fn create<P: Payload>(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config::<P>(path, &StoreConfig::default())
    }

    pub fn create_with_config<P: Payload>(
        path: impl AsRef<Path>,
        config: &StoreConfig,
    ) -> Result<Self> {
        let path = canonical_store_path(path.as_ref());
        let locker = Locker::acquire_for(&path);
        let (db, fresh_tables) = {
            let _guard = locker.lock();
            schema::prepare::<P>(&path, config.busy_timeout(), &config.label)?
        };
        info!(path = %path.display(), fresh_tables, "store opened");
        Ok(Self {
            shared: Arc::new(StoreShared {
                path,
                locker,
                conn: Mutex::new(Some(db)),
            }),
            fresh_tables,
        })
    }

    /// True if this handle created the tables (new or replaced store file).
    pub fn fresh_tables_created(&self) -> bool {
        self.fresh_tables
    }

    pub fn path(&self) -> &Path {
        self.shared.path()
    }

    pub fn is_open(&self) -> bool {
        self.shared.conn.lock().is_some()
    }

    pub fn info(&self, name: &str) -> Result<Option<String>> {
        self.shared.read(|db| schema::read_info(db, name))
    }

    pub fn info_field(&self, field: InfoField) -> Result<Option<String>> {
        self.info(field.as_str())
    }

    pub fn write_info(&self, name: &str, value: &str) -> Result<()> {
        self.shared
            .write("write_info", |db| schema::write_info(db, name, value))
    }

    pub fn label(&self) -> Result<String> {
        Ok(self.info_field(InfoField::Label)?.unwrap_or_default())
    }

    pub fn set_label(&self, label: &str) -> Result<()> {
        self.write_info(InfoField::Label.as_str(), label)
    }

    pub fn root(&self) -> Result<Directory> {
        self.shared.read(path::check_root)?;
        Ok(Directory::from_parts(Arc::clone(&self.shared), FsId::ROOT))
    }

    fn resolve(&self, path: &str, target: Target) -> Result<(FsId, NodeKind)> {
        self.shared
            .read(|db| path::resolve_absolute(db, path, target))
    }

    pub fn node(&self, path: &str) -> Result<Node> {
        let (id, kind) = self.resolve(path, Target::Any)?;
        Ok(Node::from_parts(Arc::clone(&self.shared), id, kind))
    }

    pub fn directory(&self, path: &str) -> Result<Directory> {
        let (id, _) = self.resolve(path, Target::Directory)?;
        Ok(Directory::from_parts(Arc::clone(&self.shared), id))
    }

    pub fn file(&self, path: &str) -> Result<File> {
        let (id, _) = self.resolve(path, Target::File)?;
        Ok(File::from_parts(Arc::clone(&self.shared), id))
    }

    /// True if `path` names a node. Malformed paths are still errors.
    pub fn exists(&self, path: &str) -> Result<bool> {
        match self.resolve(path, Target::Any) {
            Ok(_) => Ok(true),
            Err(FsError::ChildNotFound(_)) | Err(FsError::NotDirInPath(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of node rows, the root included.
    pub fn node_count(&self) -> Result<usize> {
        self.count(NODE_TABLE)
    }

    pub fn payload_count(&self) -> Result<usize> {
        self.count(PAYLOAD_TABLE)
    }

    fn count(&self, table: &'static str) -> Result<usize> {
        self.shared.read(|db| {
            db.count(table, None).map_err(|e| {
                error!(table, error = %e, "failed to count rows");
                FsError::GetField
            })
        })
    }

    /// Give back the lock reference and close the connection. Every later call on
    /// this store, through any handle derived from it, fails with
    /// [`FsError::StoreClosed`].
    pub fn close(&self) -> Result<()> {
        self.shared.close()?;
        info!(path = %self.path().display(), "store closed");
        Ok(())
    }
}

impl std::fmt::Debug for SqlFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlFs")
            .field("path", &self.shared.path)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::reference_count;
    use crate::payload::SimplePayload;
    use crate::tree::FsNode;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_store_has_root_and_info() {
        let temp = TempDir::new().unwrap();
        let fs = SqlFs::create::<SimplePayload>(temp.path().join("a.db")).unwrap();
        assert!(fs.fresh_tables_created());
        assert_eq!(fs.root().unwrap().id(), FsId::ROOT);
        assert_eq!(fs.label().unwrap(), "SQLFS");
        assert_eq!(fs.info_field(InfoField::Version).unwrap().as_deref(), Some(STORE_VERSION));
        assert!(fs.info_field(InfoField::CreateTimeUtc).unwrap().is_some());
        assert_eq!(fs.node_count().unwrap(), 1);
    }

    #[test]
    fn test_config_label_applies_to_new_stores() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            label: "photos".into(),
            ..StoreConfig::default()
        };
        let fs = SqlFs::create_with_config::<SimplePayload>(temp.path().join("p.db"), &config)
            .unwrap();
        assert_eq!(fs.label().unwrap(), "photos");
        fs.set_label("videos").unwrap();
        assert_eq!(fs.label().unwrap(), "videos");
    }

    #[test]
    fn test_absolute_lookups() {
        let temp = TempDir::new().unwrap();
        let fs = SqlFs::create::<SimplePayload>(temp.path().join("l.db")).unwrap();
        let a = fs.root().unwrap().add_directory("a").unwrap();
        a.add_file("f").unwrap();

        assert_eq!(fs.directory("/").unwrap().id(), FsId::ROOT);
        assert_eq!(fs.directory("/a/").unwrap().id(), a.id());
        assert!(fs.node("/a/f").unwrap().is_file());
        assert!(fs.file("/a/f/").is_ok());
        assert_eq!(fs.file("/a").unwrap_err(), FsError::ChildNotFound("a".into()));
        assert_eq!(fs.file("/").unwrap_err(), FsError::EmptyPath);
        assert_eq!(fs.node("a").unwrap_err(), FsError::MustBeAbsolute("a".into()));
        assert!(fs.exists("/a/f").unwrap());
        assert!(!fs.exists("/a/g").unwrap());
        assert!(!fs.exists("/a/f/g").unwrap());
        assert_eq!(fs.exists("").unwrap_err(), FsError::EmptyPath);
    }

    #[test]
    fn test_path_spellings_share_one_lock() {
        let temp = TempDir::new().unwrap();
        let plain = temp.path().join("s.db");
        let dotted = temp.path().join(".").join("s.db");
        let a = SqlFs::create::<SimplePayload>(&plain).unwrap();
        let b = SqlFs::create::<SimplePayload>(&dotted).unwrap();

        assert_eq!(a.path(), b.path());
        assert_eq!(reference_count(&plain), 2);
        assert_eq!(reference_count(&dotted), 2);

        a.root().unwrap().add_directory("x").unwrap();
        assert!(b.exists("/x").unwrap());
        drop(a);
        assert_eq!(reference_count(&plain), 1);
    }

    #[test]
    fn test_close_failure_has_its_own_status() {
        let err = close_failed(
            Path::new("/data/s.db"),
            DbError::Decode("statement still active".into()),
        );
        assert_eq!(
            err,
            FsError::CannotCloseStore("/data/s.db: Cannot decode row: statement still active".into())
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_close_fails_fast_everywhere() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("c.db");
        let fs = SqlFs::create::<SimplePayload>(&path).unwrap();
        let root = fs.root().unwrap();
        assert_eq!(reference_count(&path), 1);

        fs.close().unwrap();
        assert!(!fs.is_open());
        assert_eq!(reference_count(&path), 0);
        assert_eq!(fs.root().unwrap_err(), FsError::StoreClosed);
        assert_eq!(root.add_file("x").unwrap_err(), FsError::StoreClosed);
        assert_eq!(root.name().unwrap_err(), FsError::StoreClosed);
        // closing twice is harmless
        fs.close().unwrap();
    }
}
