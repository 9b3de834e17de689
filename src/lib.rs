//! SQLFS: a hierarchical file system stored in SQLite
//!
//! Directories and files are rows of a node table; file content lives in a
//! separate payload table whose schema is chosen by a [`payload::Payload`] type.
//! All handles on one store file share a single lock, and every mutation runs in
//! its own transaction, so the tree stays consistent under concurrent use.
//!
//! ```no_run
//! use sqlfs::{FsNode, SimplePayload, SqlFs};
//!
//! let fs = SqlFs::create::<SimplePayload>("files.db")?;
//! let docs = fs.root()?.add_directory("docs")?;
//! docs.add_file("readme")?.save_payload(&SimplePayload::text("hello"))?;
//! let readme = fs.file("/docs/readme")?;
//! assert_eq!(readme.read_payload::<SimplePayload>()?.as_text(), Some("hello"));
//! # Ok::<(), sqlfs::FsError>(())
//! ```

pub mod concurrency;
pub mod config;
pub mod db;
pub mod error;
pub mod filetime;
pub mod logging;
pub mod payload;
pub mod store;
pub mod tooling;
pub mod transaction;
pub mod tree;
pub mod types;

pub use error::{ErrorCategory, FsError, Result};
pub use payload::{Payload, SimplePayload};
pub use store::{InfoField, SqlFs};
pub use tree::{Directory, File, FsNode, Node, NodeRecord};
pub use types::{FsId, NodeKind};
