//! Store schema: table check, fresh creation, backup of incompatible files and the
//! info table.

use crate::db::{Column, Condition, Database, DbError};
use crate::error::{FsError, Result};
use crate::filetime::readable_utc;
use crate::payload::{Payload, PAYLOAD_TABLE};
use crate::transaction::TransactionScope;
use crate::tree::name::ROOT_NAME;
use crate::tree::node::{insert_node, node_columns, NODE_TABLE};
use crate::types::{FsId, NodeKind, ID_SIZE};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Version written to new stores.
pub const STORE_VERSION: &str = "0.10.0";

pub const INFO_TABLE: &str = "FsInfo";
const INFO_NAME: &str = "infoName";
const INFO_VALUE: &str = "infoVal";

/// Tables a usable store file must contain.
pub const REQUIRED_TABLES: [&str; 3] = [NODE_TABLE, INFO_TABLE, PAYLOAD_TABLE];

/// Well-known info table entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    Version,
    CreateTimeUtc,
    Label,
    IdSize,
}

impl InfoField {
    pub const ALL: [InfoField; 4] = [
        InfoField::Version,
        InfoField::CreateTimeUtc,
        InfoField::Label,
        InfoField::IdSize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InfoField::Version => "version",
            InfoField::CreateTimeUtc => "createTimeUtc",
            InfoField::Label => "fsLabel",
            InfoField::IdSize => "IDSize",
        }
    }
}

fn info_columns() -> Vec<Column> {
    vec![
        Column::new(INFO_NAME, "varchar(128) primary key"),
        Column::new(INFO_VALUE, "text"),
    ]
}

/// How many of [`REQUIRED_TABLES`] exist (names compared case-insensitively).
pub fn present_tables(db: &Database) -> std::result::Result<usize, DbError> {
    let names = db.table_names()?;
    Ok(REQUIRED_TABLES
        .iter()
        .filter(|t| names.iter().any(|n| n.eq_ignore_ascii_case(t)))
        .count())
}

/// `<dir>/<stem>-<YYYYmmddHHMMSS>.db`
pub fn backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    let name = format!("{}-{}.db", stem, at.format("%Y%m%d%H%M%S"));
    path.with_file_name(name)
}

fn cannot_open(path: &Path, e: impl std::fmt::Display) -> FsError {
    error!(path = %path.display(), error = %e, "cannot open store");
    FsError::CannotOpenStore(format!("{}: {}", path.display(), e))
}

/// Open `path` and make sure it holds a complete store. Returns the connection and
/// whether fresh tables were created.
pub fn prepare<P: Payload>(path: &Path, busy_timeout: Duration, label: &str) -> Result<(Database, bool)> {
    let open = || Database::open(path, busy_timeout).map_err(|e| cannot_open(path, e));
    let db = open()?;
    let present = present_tables(&db).map_err(|e| cannot_open(path, e))?;
    if present == REQUIRED_TABLES.len() {
        return Ok((db, false));
    }

    let db = if present > 0 {
        db.close().map_err(|e| cannot_open(path, e))?;
        let backup = backup_path(path, Utc::now());
        warn!(
            path = %path.display(),
            backup = %backup.display(),
            present,
            "store is missing tables, moving it aside"
        );
        std::fs::rename(path, &backup).map_err(|e| cannot_open(path, e))?;
        open()?
    } else {
        db
    };

    create_fresh::<P>(&db, label).map_err(|e| cannot_open(path, e))?;
    info!(path = %path.display(), "created fresh store");
    Ok((db, true))
}

fn create_fresh<P: Payload>(db: &Database, label: &str) -> Result<()> {
    let scope = TransactionScope::begin(db)?;
    let create = |table: &str, columns: &[Column]| {
        db.create_table(table, columns).map_err(|e| {
            error!(table, error = %e, "failed to create table");
            FsError::CannotOpenStore(e.to_string())
        })
    };
    create(NODE_TABLE, &node_columns())?;
    create(INFO_TABLE, &info_columns())?;
    create(PAYLOAD_TABLE, &P::schema())?;

    let root = insert_node(db, NodeKind::Directory, ROOT_NAME, FsId::ROOT_PARENT)?;
    if root != FsId::ROOT {
        error!(id = %root, "root row did not get the root id");
        return Err(FsError::CannotAccessRoot);
    }

    write_info(db, InfoField::Version.as_str(), STORE_VERSION)?;
    write_info(db, InfoField::CreateTimeUtc.as_str(), &readable_utc(Utc::now()))?;
    write_info(db, InfoField::Label.as_str(), label)?;
    write_info(db, InfoField::IdSize.as_str(), &ID_SIZE.to_string())?;
    scope.commit()
}

pub fn read_info(db: &Database, name: &str) -> Result<Option<String>> {
    let rows = db
        .query(INFO_TABLE, &[INFO_VALUE], Some(&Condition::eq(INFO_NAME, name)), None)
        .map_err(|e| {
            error!(name, error = %e, "failed to read info");
            FsError::GetInfo
        })?;
    Ok(rows
        .first()
        .and_then(|row| row.get_str(0))
        .map(str::to_string))
}

/// Update the entry, inserting it if absent.
pub fn write_info(db: &Database, name: &str, value: &str) -> Result<()> {
    let failed = |e: DbError| {
        error!(name, error = %e, "failed to write info");
        FsError::WriteInfo
    };
    let updated = db
        .update(
            INFO_TABLE,
            &[(INFO_VALUE, value.into())],
            &Condition::eq(INFO_NAME, name),
        )
        .map_err(failed)?;
    if updated == 0 {
        db.insert(INFO_TABLE, &[(INFO_NAME, name.into()), (INFO_VALUE, value.into())])
            .map_err(failed)?;
    }
    Ok(())
}
